//! Criterion benchmarks for rust_log_loader

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_log_loader::core::{Location, SinkDescriptor};
use rust_log_loader::prelude::*;
use rust_log_loader::sinks::{IoWriter, RotatingFileWriter};
use std::io::sink;
use std::sync::Arc;

const FILE_FORMAT: &str =
    "[{time:YYYY-MM-DD HH:mm:ss.SSSSSS Z} | {level:<8} | {name}:{line}]: {message}";

fn registry_with(formatter: Formatter) -> Arc<SinkRegistry> {
    let registry = Arc::new(SinkRegistry::new());
    registry
        .add(SinkDescriptor::new(
            "BENCH",
            Box::new(IoWriter::new(sink())),
            formatter,
        ))
        .expect("Failed to register sink");
    registry
}

fn sample_record() -> LogRecord {
    LogRecord::new(LogLevel::Info, "request handled")
        .with_location(Location::new("src/server.rs", 128, "app::server"))
        .with_field("user_id", 42)
        .with_field("path", "/api/v1/items")
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));
    let record = sample_record();

    let template = Formatter::Template(TemplateFormatter::new(FILE_FORMAT).unwrap());
    group.bench_function("template", |b| {
        b.iter(|| black_box(template.format(black_box(&record)).unwrap()));
    });

    let colored = Formatter::Template(
        TemplateFormatter::new("<g>{time}</g> | <level>{level:<8}</level> | {message}")
            .unwrap()
            .with_colorize(true),
    );
    group.bench_function("template_colorized", |b| {
        b.iter(|| black_box(colored.format(black_box(&record)).unwrap()));
    });

    group.bench_function("json", |b| {
        b.iter(|| black_box(Formatter::Json.format(black_box(&record)).unwrap()));
    });

    let serialized = Formatter::Serialized(TemplateFormatter::new(FILE_FORMAT).unwrap());
    group.bench_function("serialized", |b| {
        b.iter(|| black_box(serialized.format(black_box(&record)).unwrap()));
    });

    group.finish();
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::new(registry_with(Formatter::Template(
        TemplateFormatter::new(FILE_FORMAT).unwrap(),
    )));
    group.bench_function("single_sink", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    let registry = registry_with(Formatter::Json);
    for i in 0..4 {
        registry
            .add(
                SinkDescriptor::new(
                    format!("LEVELLED_{}", i),
                    Box::new(IoWriter::new(sink())),
                    Formatter::Json,
                )
                .with_level(LogLevel::Error),
            )
            .unwrap();
    }
    let logger = Logger::new(registry);
    group.bench_function("five_sinks_mostly_filtered", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    let bound = logger.bind("request_id", "abc123").bind("user_id", 7);
    group.bench_function("bound_extra", |b| {
        b.iter(|| bound.info(black_box("Info message")));
    });

    group.finish();
}

// ============================================================================
// Rotation Benchmarks
// ============================================================================

fn bench_rotating_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotating_file");
    group.throughput(Throughput::Elements(1));

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let writer = RotatingFileWriter::new(
        dir.path().join("bench.log"),
        RotationPolicy::size(1_000_000),
        RetentionPolicy::new(5),
    )
    .expect("Failed to open file");
    let registry = Arc::new(SinkRegistry::new());
    registry
        .add(SinkDescriptor::new(
            "FILE",
            Box::new(writer),
            Formatter::Template(TemplateFormatter::new(FILE_FORMAT).unwrap()),
        ))
        .unwrap();
    let logger = Logger::new(registry);

    group.bench_function("write_with_rotation", |b| {
        b.iter(|| logger.info(black_box("A moderately sized log line for rotation")));
    });

    group.finish();
}

// ============================================================================
// Concurrent Logging Benchmarks
// ============================================================================

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    let logger = Logger::new(registry_with(Formatter::Template(
        TemplateFormatter::new("{level} {message}").unwrap(),
    )));

    group.bench_function("multi_thread_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let logger = logger.clone();
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            logger.info(black_box("Concurrent message"));
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_formatting,
    bench_dispatch,
    bench_rotating_file,
    bench_concurrent_logging
);

criterion_main!(benches);
