//! # Permissioned-Chain Benchmarks
//!
//! Hot paths that run on every request or every delivered event:
//!
//! | Path | Work per call |
//! |------|---------------|
//! | Operation lookup + arity check | One map lookup |
//! | Event de-duplication | Set probe + bounded eviction |
//! | Contract packaging | Tree walk, bincode encode, SHA-256 |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pc_02_chaincode_lifecycle::package;
use pc_03_ledger_gateway::OperationRegistry;
use shared_bus::{ContractEvent, DedupWindow, LedgerEvent};
use shared_types::{ContractDescriptor, TransactionId};
use std::fs;
use std::time::Duration;

// ============================================================================
// Gateway: registry dispatch
// ============================================================================

fn bench_registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-03-ledger-gateway");
    let registry = OperationRegistry::builtin();
    let names: Vec<(String, String)> = registry
        .iter()
        .map(|s| (s.contract.clone(), s.operation.clone()))
        .collect();

    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("lookup_builtin_catalogue", |b| {
        b.iter(|| {
            for (contract, operation) in &names {
                black_box(registry.lookup(contract, operation).is_ok());
            }
        })
    });
    group.bench_function("lookup_unknown", |b| {
        b.iter(|| black_box(registry.lookup("nft", "MintEverything").is_err()))
    });
    group.finish();
}

// ============================================================================
// Events: duplicate suppression
// ============================================================================

fn contract_event(i: u64) -> LedgerEvent {
    LedgerEvent::Contract(ContractEvent {
        contract: "product".into(),
        event_name: "CreateProduct".into(),
        tx_id: TransactionId(format!("tx-{i}")),
        block_number: i,
        payload: Vec::new(),
    })
}

fn bench_dedup_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-bus-dedup");

    for size in [100u64, 1_000, 10_000] {
        let events: Vec<LedgerEvent> = (0..size).map(contract_event).collect();
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("first_sighting", size), &events, |b, events| {
            b.iter(|| {
                let mut window = DedupWindow::new();
                for event in events {
                    black_box(window.first_sighting(event));
                }
            })
        });
    }
    group.finish();
}

// ============================================================================
// Lifecycle: packaging
// ============================================================================

fn bench_packaging(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-02-chaincode-lifecycle");
    group.measurement_time(Duration::from_secs(5));

    for files in [1usize, 10, 50] {
        let dir = tempfile::TempDir::new().expect("temp dir");
        for i in 0..files {
            fs::write(dir.path().join(format!("file_{i}.go")), vec![b'x'; 4096]).expect("write source");
        }
        let descriptor = ContractDescriptor::new("bench", dir.path().to_string_lossy(), "1.0.0");

        group.bench_with_input(BenchmarkId::new("package", files), &descriptor, |b, descriptor| {
            b.iter(|| black_box(package(descriptor).expect("package")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_registry_lookup, bench_dedup_window, bench_packaging);
criterion_main!(benches);
