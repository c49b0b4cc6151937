use common::{Collection, DocPath};
use criterion::{Criterion, criterion_group, criterion_main};
use doc_store::{
    BatchOp, DocQuery, DocumentStore, FilterOp, InMemoryDocStore, Precondition,
};
use uuid::Uuid;

fn reservation_path() -> DocPath {
    DocPath::root(Collection::Reservations, Uuid::new_v4())
}

fn reservation_body(eligible: bool) -> serde_json::Value {
    serde_json::json!({
        "state": "checking_in",
        "reservation_time": "2026-08-24T10:00:00Z",
        "eligible_for_timeout": eligible,
    })
}

fn bench_create_document(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("doc_store/create_document", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryDocStore::new();
                store
                    .create(&reservation_path(), reservation_body(true))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_guarded_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("doc_store/guarded_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryDocStore::new();
                let path = reservation_path();
                let created = store.create(&path, reservation_body(true)).await.unwrap();
                store
                    .update(
                        &path,
                        reservation_body(false),
                        Precondition::revision(created.revision),
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_query_100_documents(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryDocStore::new();

    rt.block_on(async {
        for i in 0..100 {
            store
                .create(&reservation_path(), reservation_body(i % 2 == 0))
                .await
                .unwrap();
        }
    });

    c.bench_function("doc_store/query_100_documents", |b| {
        b.iter(|| {
            rt.block_on(async {
                let results = store
                    .query(
                        DocQuery::collection(Collection::Reservations)
                            .filter("eligible_for_timeout", FilterOp::Eq, serde_json::json!(true)),
                    )
                    .await
                    .unwrap();
                assert_eq!(results.len(), 50);
            });
        });
    });
}

fn bench_commit_batch_2(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("doc_store/commit_batch_2", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryDocStore::new();
                let a = reservation_path();
                let b = reservation_path();
                let ra = store.create(&a, reservation_body(true)).await.unwrap();
                let rb = store.create(&b, reservation_body(true)).await.unwrap();
                store
                    .commit(vec![
                        BatchOp::update(
                            a,
                            reservation_body(false),
                            Precondition::revision(ra.revision),
                        ),
                        BatchOp::update(
                            b,
                            reservation_body(false),
                            Precondition::revision(rb.revision),
                        ),
                    ])
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_document,
    bench_guarded_update,
    bench_query_100_documents,
    bench_commit_batch_2,
);
criterion_main!(benches);
