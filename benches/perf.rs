use std::collections::HashMap;

use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use propsim::collector::collect;
use propsim::estimator::estimate;
use propsim::sampler::simulate;
use propsim::{
    Direction, Engine, EngineConfig, HistoryProvider, PropLine, PropRequest, StatCategory,
    StatObservation,
};

const OPPONENTS: [&str; 5] = ["BOS", "MIA", "NYK", "PHI", "MIL"];

struct MapProvider(HashMap<String, Vec<StatObservation>>);

impl HistoryProvider for MapProvider {
    fn history(&self, athlete: &str, _category: StatCategory) -> Option<Vec<StatObservation>> {
        self.0.get(athlete).cloned()
    }
}

fn sample_history(games: usize) -> Vec<StatObservation> {
    let start = NaiveDate::from_ymd_opt(2021, 10, 19).expect("valid date");
    (0..games)
        .map(|i| {
            let value = 12.0 + ((i * 7) % 23) as f64;
            StatObservation::new(
                value,
                OPPONENTS[i % OPPONENTS.len()],
                start + chrono::Duration::days(i as i64 * 2),
            )
        })
        .collect()
}

fn bench_simulate(c: &mut Criterion) {
    let history = sample_history(82);
    let sample = collect(&history, "BOS", 3).expect("non-empty history");
    c.bench_function("simulate_10k", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            let d = simulate(black_box(&sample), 10_000, 0.1, &mut rng).unwrap();
            black_box(d.trials());
        })
    });
}

fn bench_estimate(c: &mut Criterion) {
    let history = sample_history(82);
    let sample = collect(&history, "BOS", 3).expect("non-empty history");
    let mut rng = StdRng::seed_from_u64(1);
    let d = simulate(&sample, 10_000, 0.1, &mut rng).unwrap();
    c.bench_function("estimate_10k", |b| {
        b.iter(|| {
            let p = estimate(black_box(&d), 24.5, Direction::Over).unwrap();
            black_box(p);
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    let mut histories = HashMap::new();
    let mut requests = Vec::new();
    for athlete_idx in 0..40 {
        let athlete = format!("Player {athlete_idx}");
        histories.insert(athlete.clone(), sample_history(60 + athlete_idx));
        for (k, stat) in [StatCategory::Points, StatCategory::Rebounds].iter().enumerate() {
            requests.push(PropRequest {
                athlete: athlete.clone(),
                opponent_id: OPPONENTS[(athlete_idx + k) % OPPONENTS.len()].to_string(),
                line: PropLine::new(*stat, 20.5, Direction::Over).expect("finite line"),
            });
        }
    }
    let provider = MapProvider(histories);
    let engine = Engine::new(EngineConfig {
        seed: Some(3),
        ..EngineConfig::default()
    });

    c.bench_function("batch_80_props", |b| {
        b.iter(|| {
            let out = engine.estimate_batch(black_box(&requests), &provider);
            black_box(out.len());
        })
    });
}

criterion_group!(benches, bench_simulate, bench_estimate, bench_batch);
criterion_main!(benches);
