//! File logging example
//!
//! Demonstrates the default file sinks, JSON sinks, rotation with
//! compressed archives, and a custom file handler.
//!
//! Run with: cargo run --example file_logging

use rust_log_loader::prelude::*;
use rust_log_loader::sinks::list_archives;
use serde_json::json;

fn main() -> Result<()> {
    println!("=== rust_log_loader - File Logging Example ===\n");

    let logs_dir = std::env::temp_dir().join("rust_log_loader_demo");
    println!("Writing logs under {}", logs_dir.display());

    let loader = LoggerLoader::builder()
        .load_config_file(false)
        .config(json!({
            "app_name": "files",
            "stream": {"std_handler": {"enabled": false}},
            "file": {
                "logs_dir": logs_dir,
                "rotate_size": 2_000,
                "backup_count": 3,
                "compress": true,
                "log_handlers": {"enabled": true},
                "json_handlers": {"enabled": true}
            }
        }))
        .build()?;
    let logger = loader.load()?;
    println!("Registered sinks: {:?}", loader.handlers_map());

    loader.add_handler(
        "FILE.AUDIT",
        SinkOptions::new()
            .path("audit/{app_name}.audit.log")
            .level(LogLevel::Success)
            .format("{time:YYYY-MM-DD HH:mm:ss} {level} {message} {extra}"),
    )?;

    for i in 0..50 {
        logger.bind("iteration", i).info(format!("Processing batch {}", i));
    }
    logger.bind("actor", "admin").success("Settings changed");
    logger.error("Disk almost full");
    logger.flush()?;

    let active = logs_dir.join("files.std.all.log");
    for (stamp, path) in list_archives(&active)? {
        println!("Archive {} -> {}", stamp, path.display());
    }

    let metrics = loader.registry().metrics();
    println!(
        "\nEmitted: {}, delivered: {}, rotations: {}",
        metrics.emitted(),
        metrics.delivered(),
        metrics.rotations()
    );

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
