//! Benchmarks for the hot paths of a capture session
//!
//! - Decoding wire records
//! - Applying a whole stage feed to a car table
//! - Ranking a table under both policies

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use racecontrol::ranking::{RankingPolicy, rank};
use racecontrol::test_utils::{encode_events, ordered_table, stage_events};
use racecontrol::timing::{CarTable, Seeding};
use racecontrol::types::{EVENT_SIZE, Event, Stage};
use std::hint::black_box;

const LAPS: u32 = 57;

fn bench_decode(c: &mut Criterion) {
    let events = stage_events(Stage::FeatureRace, &Seeding::AllActive, &[], LAPS);
    let bytes = encode_events(&events);

    let mut group = c.benchmark_group("event_decode");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("feature_race_feed", |b| {
        b.iter(|| {
            for record in bytes.chunks_exact(EVENT_SIZE) {
                let record: &[u8; EVENT_SIZE] = record.try_into().expect("exact chunk");
                black_box(Event::decode(black_box(record)).expect("valid record"));
            }
        })
    });
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let events = stage_events(Stage::FeatureRace, &Seeding::AllActive, &[], LAPS);

    let mut group = c.benchmark_group("event_apply");
    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("feature_race_feed", |b| {
        b.iter(|| {
            let mut table = CarTable::new_session(&Seeding::AllActive);
            for event in &events {
                black_box(table.apply_event(black_box(event)).expect("valid event"));
            }
            table
        })
    });
    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let race = ordered_table(Stage::FeatureRace, &Seeding::AllActive, &[7, 3, 12], 5);
    let qualifying = ordered_table(Stage::Qualifying1, &Seeding::AllActive, &[19, 0], 5);

    c.bench_function("rank_race", |b| b.iter(|| rank(black_box(&race), RankingPolicy::Race)));
    c.bench_function("rank_time_trial", |b| b.iter(|| rank(black_box(&qualifying), RankingPolicy::TimeTrial)));
}

criterion_group!(benches, bench_decode, bench_apply, bench_rank);
criterion_main!(benches);
