use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ensemble_router::{score, ModelDescriptor, ModelRuntimeState, RequestKind};

fn bench_score(c: &mut Criterion) {
    let model = ModelDescriptor::new("gpt-x", "acme", RequestKind::Technical)
        .cost_per_request(0.01)
        .base_reliability(0.9)
        .max_load(50);
    let state = ModelRuntimeState::new();
    state.record_success(120, 0.85);

    c.bench_function("score single candidate", |b| {
        b.iter(|| score(black_box(&model), black_box(&state), black_box(RequestKind::Technical), black_box("free")))
    });
}

fn bench_select(c: &mut Criterion) {
    let fallback = [
        ModelDescriptor::new("cheap", "acme", RequestKind::General),
        ModelDescriptor::new("medium", "acme", RequestKind::General),
        ModelDescriptor::new("safer", "globex", RequestKind::General),
    ];
    let mut router = ensemble_router::ModelRouter::new(fallback);
    for i in 0..20 {
        router.register(
            ModelDescriptor::new(format!("model-{i}"), if i % 2 == 0 { "acme" } else { "globex" }, RequestKind::General),
            std::sync::Arc::new(ModelRuntimeState::new()),
        );
    }

    c.bench_function("select from 20 candidates", |b| {
        b.iter(|| router.select(black_box("explain how retries work"), black_box("free"), black_box(3), |_| true))
    });
}

criterion_group!(benches, bench_score, bench_select);
criterion_main!(benches);
