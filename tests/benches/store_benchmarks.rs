//! # Reconciled Store Benchmarks
//!
//! | Operation | Shape | Target |
//! |-----------|-------|--------|
//! | `ValueStore::apply` | alternating unverified/verified writes | < 5µs |
//! | `ListStore::reconcile_verified` | page of 50 over a list of 1000 | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ls_01_reconciled_store::{ListStore, ValueStore};
use shared_types::{AccountId, Balance, EntityId, Transaction, TransactionId, TrustedValue};

fn tx(id: u64) -> Transaction {
    Transaction {
        id: TransactionId(id),
        from: AccountId::new("bob"),
        to: AccountId::new("alice"),
        amount_e8s: id * 1_000,
        fee_e8s: 10_000,
        memo: id,
        timestamp_ms: id,
    }
}

fn bench_value_apply(c: &mut Criterion) {
    let store = ValueStore::new();
    let entity = EntityId::from(&AccountId::new("alice"));
    let mut request_id = 0u64;

    c.bench_function("ls-01-value-apply", |b| {
        b.iter(|| {
            request_id += 1;
            let value = TrustedValue::new(Balance::new(request_id), request_id % 2 == 0);
            black_box(store.apply(entity.clone(), value, request_id))
        })
    });
}

fn bench_list_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("ls-01-list-reconcile");
    let entity = EntityId::from(&AccountId::new("alice"));

    for history in [100u64, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(history), &history, |b, &history| {
            b.iter_batched(
                || {
                    let store: ListStore<Transaction> = ListStore::new();
                    let verified = (1..=history).rev().map(|id| TrustedValue::verified(tx(id)));
                    store.prepend(entity.clone(), verified.collect(), None);
                    let unverified = (history + 1..=history + 50)
                        .rev()
                        .map(|id| TrustedValue::unverified(tx(id)));
                    store.prepend(entity.clone(), unverified.collect(), Some(1));
                    store
                },
                |store| {
                    let page: Vec<Transaction> = (history + 1..=history + 49).rev().map(tx).collect();
                    black_box(store.reconcile_verified(entity.clone(), 1, page))
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_value_apply, bench_list_reconcile);
criterion_main!(benches);
