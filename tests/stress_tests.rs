//! Stress tests for concurrent dispatch and rotation
//!
//! These tests verify:
//! - No record is lost or duplicated across rotations under concurrent load
//! - Sinks can be added and removed while other threads are logging
//! - Dropping the loader drains the queued file sinks

use rust_log_loader::core::LogLevel;
use rust_log_loader::env::EnvOverrides;
use rust_log_loader::loader::{LoggerLoader, SinkOptions};
use rust_log_loader::sinks::{list_archives, IoWriter, SharedBuffer};
use rust_log_loader::{RetentionPolicy, RotationPolicy};
use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

fn loader(logs_dir: &Path) -> LoggerLoader {
    LoggerLoader::builder()
        .load_config_file(false)
        .env(EnvOverrides::default())
        .config(json!({
            "app_name": "stress",
            "level": "TRACE",
            "file": {"logs_dir": logs_dir},
            "stream": {"std_handler": {"enabled": false}}
        }))
        .build()
        .expect("Failed to build loader")
}

fn read_all_lines(active: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (_, archive) in list_archives(active).expect("Failed to list archives") {
        let content = fs::read_to_string(&archive).expect("Failed to read archive");
        lines.extend(content.lines().map(str::to_string));
    }
    let content = fs::read_to_string(active).expect("Failed to read active file");
    lines.extend(content.lines().map(str::to_string));
    lines
}

/// Every record lands exactly once across the active file and its archives
#[test]
fn test_concurrent_logging_across_rotations() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let loader = loader(temp_dir.path());
    let logger = loader.load().unwrap();

    loader
        .add_handler(
            "FILE.STRESS",
            SinkOptions::new()
                .path("stress.log")
                .format("{message}")
                .rotation(RotationPolicy::size(20_000))
                .retention(RetentionPolicy::new(10_000)),
        )
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("thread-{}-record-{:04}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Logging thread panicked");
    }
    logger.flush().unwrap();

    let active = temp_dir.path().join("stress.log");
    let lines = read_all_lines(&active);
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    let unique: HashSet<&String> = lines.iter().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD, "Duplicated records found");

    // Per-thread order survives the queue and the rotations
    for t in 0..THREADS {
        let prefix = format!("thread-{}-", t);
        let own: Vec<&String> = lines.iter().filter(|l| l.starts_with(&prefix)).collect();
        let mut sorted = own.clone();
        sorted.sort();
        assert_eq!(own, sorted);
    }

    assert!(loader.registry().metrics().rotations() > 0);
}

/// Registration churn never disturbs concurrent dispatch
#[test]
fn test_add_remove_while_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let loader = Arc::new(loader(temp_dir.path()));
    let logger = loader.load().unwrap();
    let stable = SharedBuffer::new();

    loader
        .add_handler(
            "STABLE",
            SinkOptions::new()
                .writer(Box::new(IoWriter::new(stable.clone())))
                .format("{message}"),
        )
        .unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let churn = {
        let loader = Arc::clone(&loader);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut rounds = 0;
            while running.load(Ordering::Relaxed) {
                let id = loader
                    .add_handler(
                        "CHURN",
                        SinkOptions::new()
                            .writer(Box::new(IoWriter::new(Vec::new())))
                            .level(LogLevel::Warning),
                    )
                    .expect("Failed to add churn sink");
                assert!(loader.remove(id));
                rounds += 1;
            }
            rounds
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..1_000 {
                    logger.warning(format!("{}:{}", t, i));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("Logging thread panicked");
    }
    running.store(false, Ordering::Relaxed);
    let rounds = churn.join().expect("Churn thread panicked");

    assert!(rounds > 0);
    assert_eq!(stable.lines().len(), 4_000);
    assert!(!loader.handlers_map().contains_key("CHURN"));
}

/// Dropping the loader joins the file workers after they drain
#[test]
fn test_drop_drains_queued_sinks() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    {
        let loader = loader(temp_dir.path());
        loader
            .update_config(&json!({"file": {"log_handlers": {"enabled": true, "format_str": "{message}"}}}))
            .unwrap();
        let logger = loader.load().unwrap();
        for i in 0..2_000 {
            logger.debug(format!("queued {}", i));
        }
        loader.remove_handler(None, "NAME").unwrap();
    }

    let content = fs::read_to_string(temp_dir.path().join("stress.std.all.log")).unwrap();
    assert_eq!(content.lines().count(), 2_000);
    assert_eq!(content.lines().last(), Some("queued 1999"));
}
