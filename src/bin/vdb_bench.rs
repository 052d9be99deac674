//! Minimal CLI wrapper around [`vdb_core::benchmark::run`].
//!
//! Parses a single optional argument (workload size) and nothing else — no
//! flags, no config loading, no HTTP surface. The harness itself is the
//! deliverable; this binary exists only to invoke it and print its report.

use vdb_core::benchmark::{self, LatencyTargets};
use vdb_core::config::{HnswParams, IndexConfig};

fn main() {
    tracing_subscriber::fmt::init();

    let vector_count: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    let config = IndexConfig {
        dimension: 128,
        max_elements: vector_count + 1,
        hnsw: HnswParams::default(),
        ..IndexConfig::default()
    };
    let targets = LatencyTargets {
        mean_us: 20_000.0,
        p50_us: 20_000.0,
        p95_us: 10_000.0,
        p99_us: 30_000.0,
    };

    match benchmark::run(config, 0x5DEE_CE66_D1A4_B5B5, vector_count, 100, 10, &targets) {
        Ok(report) => {
            println!(
                "insert: n={} mean={:.1}us p50={:.1}us p95={:.1}us p99={:.1}us",
                report.insert_count,
                report.insert.mean_us,
                report.insert.p50_us,
                report.insert.p95_us,
                report.insert.p99_us
            );
            println!(
                "search: n={} mean={:.1}us p50={:.1}us p95={:.1}us p99={:.1}us",
                report.search_count,
                report.search.mean_us,
                report.search.p50_us,
                report.search.p95_us,
                report.search.p99_us
            );
            println!("passed: {}", report.passed);
            if !report.passed {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("benchmark failed: {err}");
            std::process::exit(1);
        }
    }
}
