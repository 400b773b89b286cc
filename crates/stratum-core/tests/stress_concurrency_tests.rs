//! Stress tests for concurrent appends and loads.
//!
//! Uses a finite number of operations per thread so writers always finish.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use common::{encode_chunk, mixed_rows, mixed_schema};
use stratum_core::{StorageConfig, StorageManager};
use tempfile::tempdir;

fn run_storage_stress(num_readers: usize, num_writers: usize, appends_per_writer: usize) {
    let temp = tempdir().expect("Failed to create temp dir");
    let mut config = StorageConfig::with_data_dir(temp.path());
    config.max_chunks_per_file = 4;
    let storage = StorageManager::open(config).unwrap();
    storage.add_table("shared", &mixed_schema()).unwrap();
    for writer in 0..num_writers {
        storage
            .add_table(&format!("own_{writer}"), &mixed_schema())
            .unwrap();
    }
    let loads = AtomicUsize::new(0);

    thread::scope(|scope| {
        for writer in 0..num_writers {
            let storage = &storage;
            scope.spawn(move || {
                for i in 0..appends_per_writer {
                    let rows = mixed_rows((writer * 1_000 + i) as u64, 32, 10);
                    let chunk = encode_chunk(&mixed_schema(), &rows, i % 2 == 0);
                    storage.persist_chunk("shared", &chunk).unwrap();
                    storage.persist_chunk(&format!("own_{writer}"), &chunk).unwrap();
                }
            });
        }
        for _ in 0..num_readers {
            let storage = &storage;
            let loads = &loads;
            scope.spawn(move || {
                for _ in 0..appends_per_writer {
                    let chunks = storage.load_table("shared").unwrap();
                    for mapped in &chunks {
                        let chunk = mapped.chunk().unwrap();
                        assert_eq!(chunk.size(), 32);
                        assert_eq!(chunk.row(31).len(), 5);
                    }
                    loads.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    let total = num_writers * appends_per_writer;
    let shared = storage.load_table("shared").unwrap();
    assert_eq!(shared.len(), total);
    assert!(shared
        .iter()
        .enumerate()
        .all(|(i, mapped)| mapped.chunk_id() as usize == i));
    for writer in 0..num_writers {
        let own = storage.load_table(&format!("own_{writer}")).unwrap();
        assert_eq!(own.len(), appends_per_writer);
    }
    assert_eq!(loads.load(Ordering::Relaxed), num_readers * appends_per_writer);
}

/// Smoke test: 2 readers + 2 writers × 10 appends
#[test]
fn test_stress_smoke_4_threads() {
    run_storage_stress(2, 2, 10);
}

/// Medium stress: 4 readers + 4 writers × 25 appends
#[test]
fn test_stress_medium_8_threads() {
    run_storage_stress(4, 4, 25);
}

/// Heavy stress (ignored for CI)
#[test]
#[ignore = "Heavy stress test, run manually"]
fn test_stress_32_threads() {
    run_storage_stress(16, 16, 100);
}
