//! HTTP access logging example
//!
//! Demonstrates what a web framework middleware would do per request:
//! build an `HttpInfo` and hand it to `log_access`.
//!
//! Run with: cargo run --example http_access

use rust_log_loader::http;
use rust_log_loader::prelude::*;
use serde_json::json;
use std::time::Instant;

fn main() -> Result<()> {
    println!("=== rust_log_loader - HTTP Access Example ===\n");

    let logs_dir = std::env::temp_dir().join("rust_log_loader_http_demo");
    let loader = LoggerLoader::builder()
        .load_config_file(false)
        .config(json!({"app_name": "web", "level": "DEBUG", "file": {"logs_dir": logs_dir}}))
        .build()?;
    let logger = loader.load()?;
    http::add_http_file_handlers(&loader, None, None)?;
    http::add_http_json_handlers(&loader, None, None)?;

    let requests = [
        ("GET", "/health", 200, 2),
        ("POST", "/api/orders", 201, 118),
        ("GET", "/old-path", 301, 0),
        ("GET", "/api/orders/999", 404, 45),
        ("POST", "/api/payments", 502, 0),
    ];

    for (i, (method, path, status, length)) in requests.into_iter().enumerate() {
        let started = Instant::now();
        let info = HttpInfo::new(method, path, status)
            .with_request_id(format!("req-{:03}", i))
            .with_client_host("203.0.113.10")
            .with_user_agent("demo-client/1.0")
            .with_content_length(length)
            .with_response_time((started.elapsed().as_secs_f64() * 10_000.0).round() / 10.0);
        http::log_access(&logger, &info);
    }
    logger.flush()?;

    println!(
        "\nAccess log: {}",
        logs_dir.join("http/web.http.access.log").display()
    );
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
