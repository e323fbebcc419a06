use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use tillbook_catalog::NewProduct;
use tillbook_infra::reconciler::InvoiceReconciler;
use tillbook_infra::store::{Collections, InMemoryStore};
use tillbook_invoicing::{Customer, LineItemRequest, ReconcilePolicy, StockCommit};

fn reconciler_with_products(
    policy: ReconcilePolicy,
    products: usize,
) -> InvoiceReconciler<Arc<InMemoryStore>> {
    let store = Arc::new(InMemoryStore::with_collections(Collections::new()));
    let reconciler = InvoiceReconciler::new(store, policy);
    for i in 0..products {
        reconciler
            .catalog()
            .add_product(NewProduct {
                name: format!("product-{i}"),
                company: "Acme".to_string(),
                category: "General".to_string(),
                quantity: 1_000_000,
                price: 250,
                actual_price: 100,
            })
            .expect("seed product");
    }
    reconciler
}

fn basket(lines: usize) -> Vec<LineItemRequest> {
    (0..lines)
        .map(|i| LineItemRequest::new(format!("product-{i}"), 2, 250))
        .collect()
}

/// Create an invoice and delete it again; stock ends where it started.
fn bench_create_delete_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_delete_cycle");

    for lines in [1usize, 10, 50] {
        group.throughput(Throughput::Elements(lines as u64));
        for (label, stock_commit) in [
            ("per_item", StockCommit::PerItem),
            ("all_or_nothing", StockCommit::AllOrNothing),
        ] {
            let policy = ReconcilePolicy {
                stock_commit,
                ..ReconcilePolicy::default()
            };
            let reconciler = reconciler_with_products(policy, lines);
            let items = basket(lines);
            group.bench_with_input(BenchmarkId::new(label, lines), &items, |b, items| {
                b.iter(|| {
                    let invoice = reconciler
                        .create(black_box(items), Customer::default(), 0)
                        .expect("create");
                    reconciler.delete(invoice.id_typed()).expect("delete")
                });
            });
        }
    }

    group.finish();
}

/// Invoice numbering reads the max over every stored invoice.
fn bench_create_with_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_with_history");

    for history in [10usize, 1_000] {
        let reconciler = reconciler_with_products(ReconcilePolicy::default(), 1);
        let items = basket(1);
        for _ in 0..history {
            reconciler
                .create(&items, Customer::default(), 0)
                .expect("seed invoice");
        }
        group.bench_with_input(BenchmarkId::from_parameter(history), &items, |b, items| {
            b.iter(|| {
                let invoice = reconciler
                    .create(black_box(items), Customer::default(), 0)
                    .expect("create");
                reconciler.delete(invoice.id_typed()).expect("delete")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create_delete_cycle, bench_create_with_history);
criterion_main!(benches);
