//! Benchmark for the derived views, recomputed on every state change.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use confivote_client::views::{compute_stats, filter_candidates, rank_verified};
use confivote_client::{Address, Candidate, CategoryFilter, RecordId};

const CATEGORIES: [&str; 5] =
    ["Best Film", "Best Actor", "Best Director", "Best Score", "Best Documentary"];

fn candidates(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| Candidate {
            record_id: RecordId::new(format!("vote-{i}")),
            name: format!("Candidate {i}"),
            category: CATEGORIES[i % CATEGORIES.len()].to_string(),
            timestamp: 1_700_000_000 + i as u64,
            creator: Address::new([(i % 256) as u8; 20]),
            public_value1: (i % 11) as u32,
            public_value2: 0,
            is_verified: i % 3 == 0,
            decrypted_value: (i % 3 == 0).then_some((i * 7 % 101) as u32),
        })
        .collect()
}

fn bench_views(c: &mut Criterion) {
    let list = candidates(1_000);
    let filter = CategoryFilter::Exact("Best Film".to_string());

    c.bench_function("stats_1000", |b| b.iter(|| compute_stats(black_box(&list))));
    c.bench_function("rankings_1000", |b| b.iter(|| rank_verified(black_box(&list), 10)));
    c.bench_function("filter_1000", |b| {
        b.iter(|| filter_candidates(black_box(&list), "candidate 1", &filter))
    });
}

criterion_group!(benches, bench_views);
criterion_main!(benches);
