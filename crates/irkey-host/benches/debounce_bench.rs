//! Criterion benchmarks for the per-code hot path: debounce and profile lookup.
//!
//! Run with:
//! ```bash
//! cargo bench --package irkey-host --bench debounce_bench
//! ```

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use irkey_core::{NormalizedCode, Profile};
use irkey_host::application::debounce::Debouncer;
use irkey_host::application::mapper::ActiveProfile;

fn bench_debounce_held_button(c: &mut Criterion) {
    let code = NormalizedCode::from_value(0x08);
    let start = Instant::now();

    c.bench_function("debounce_held_button_100_frames", |b| {
        b.iter(|| {
            let mut debouncer = Debouncer::default();
            let mut accepted = 0;
            for i in 0..100u64 {
                let at = start + Duration::from_millis(i * 108);
                if debouncer.observe(black_box(code.clone()), at, false).is_some() {
                    accepted += 1;
                }
            }
            accepted
        })
    });
}

fn bench_debounce_alternating_codes(c: &mut Criterion) {
    let codes: Vec<NormalizedCode> = (0..32u32).map(NormalizedCode::from_value).collect();
    let start = Instant::now();

    c.bench_function("debounce_alternating_32_codes", |b| {
        b.iter(|| {
            let mut debouncer = Debouncer::default();
            for (i, code) in codes.iter().enumerate() {
                let at = start + Duration::from_millis(i as u64 * 10);
                black_box(debouncer.observe(code.clone(), at, false));
            }
        })
    });
}

fn bench_profile_lookup(c: &mut Criterion) {
    let active = ActiveProfile::new(Profile::default_vizio());
    let hit = NormalizedCode::from_value(0x2F);
    let miss = NormalizedCode::from_value(0x1234);

    c.bench_function("profile_lookup_hit", |b| b.iter(|| active.lookup(black_box(&hit))));
    c.bench_function("profile_lookup_miss", |b| b.iter(|| active.lookup(black_box(&miss))));
}

criterion_group!(
    benches,
    bench_debounce_held_button,
    bench_debounce_alternating_codes,
    bench_profile_lookup
);
criterion_main!(benches);
