use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use type_probe::evaluator::StringEvaluator;
use type_probe::mask::LocaleFamily;

fn generate_samples(rows: usize) -> Vec<Option<String>> {
    (0..rows)
        .map(|i| match i % 6 {
            0 => Some(format!("{i}")),
            1 => Some(format!("{}.{:02}", i, i % 100)),
            2 => Some(format!("2024-01-{:02}", (i % 28) + 1)),
            3 => Some(format!("$1,{:03}.50", i % 1000)),
            4 => None,
            _ => Some(format!("sample-{i}")),
        })
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let samples = generate_samples(10_000);
    let mut group = c.benchmark_group("evaluate");
    group.bench_function("stream_10k_mixed", |b| {
        b.iter_batched(
            || StringEvaluator::new(LocaleFamily::Us).expect("session"),
            |mut evaluator| {
                for sample in &samples {
                    evaluator.evaluate(sample.as_deref());
                }
                evaluator.best_candidate()
            },
            BatchSize::SmallInput,
        );
    });
    let integers: Vec<Option<String>> = (0..10_000).map(|i| Some(format!("{i}"))).collect();
    group.bench_function("stream_10k_integers", |b| {
        b.iter_batched(
            || StringEvaluator::new(LocaleFamily::Us).expect("session"),
            |mut evaluator| {
                for sample in &integers {
                    evaluator.evaluate(sample.as_deref());
                }
                evaluator.best_candidate()
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
