//! Basic loader usage example
//!
//! Demonstrates the default console sink, levels, bound fields and the
//! logging macros.
//!
//! Run with: cargo run --example basic_usage

use rust_log_loader::prelude::*;
use rust_log_loader::{info, warning};
use serde_json::json;

#[derive(Debug)]
struct Timeout;

impl std::fmt::Display for Timeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream did not answer within 3s")
    }
}

impl std::error::Error for Timeout {}

fn main() -> Result<()> {
    println!("=== rust_log_loader - Basic Usage Example ===\n");

    let loader = LoggerLoader::builder()
        .load_config_file(false)
        .config(json!({"app_name": "basic", "level": "TRACE"}))
        .build()?;
    let logger = loader.load()?;

    println!("1. Logging at every level:");
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.success("This is a success message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");
    logger.critical("This is a critical message");

    println!("\n2. Macros capture the call site:");
    let port = 8080;
    info!(logger, "Listening on port {}", port);
    warning!(logger, "{} connections pending", 3);

    println!("\n3. Bound fields travel with every record:");
    let request = logger.bind("request_id", "c0ffee").bind("user_id", 42);
    request.info("Handling request");

    println!("\n4. Errors with their source chain:");
    logger.exception("Upstream call failed", &Timeout);

    println!("\n5. Raising the level hides chatter:");
    loader.update_config(&json!({"level": "WARNING"}))?;
    let logger = loader.load()?;
    logger.info("Info message (hidden)");
    logger.warning("Warning message (visible)");

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
