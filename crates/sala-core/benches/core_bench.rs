//! Criterion benchmarks for sala-core DSP primitives
//!
//! Run with: cargo bench -p sala-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sala_core::{
    AllpassFilter, BUTTERWORTH_Q, Biquad, CascadedBiquad, DcBlocker, DelayLine, DenormalGuard,
    Matrix, ModulatedAllpass, hadamard, householder, lowpass_coefficients, soft_limit,
};

const SAMPLE_RATE: f32 = 44100.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut biquad = Biquad::new();
                biquad.set_lowpass(5000.0, BUTTERWORTH_Q, SAMPLE_RATE);
                b.iter(|| {
                    for &sample in &input {
                        black_box(biquad.process(black_box(sample)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("cascaded", block_size),
            &block_size,
            |b, _| {
                let mut cascade = CascadedBiquad::new();
                cascade.set_highpass(120.0, BUTTERWORTH_Q, SAMPLE_RATE);
                b.iter(|| {
                    for &sample in &input {
                        black_box(cascade.process(black_box(sample)));
                    }
                });
            },
        );
    }

    // Coefficient calculation cost
    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(lowpass_coefficients(
                black_box(5000.0),
                black_box(BUTTERWORTH_Q),
                black_box(SAMPLE_RATE),
            ))
        });
    });

    group.finish();
}

fn bench_delays(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delay");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("delay_line", block_size),
            &block_size,
            |b, _| {
                let mut delay = DelayLine::new(2357);
                b.iter(|| {
                    for &sample in &input {
                        black_box(delay.process(black_box(sample)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("allpass", block_size),
            &block_size,
            |b, _| {
                let mut allpass = AllpassFilter::new(223).with_smoothing(0.9);
                b.iter(|| {
                    for &sample in &input {
                        black_box(allpass.process(black_box(sample), 0.45));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("modulated_allpass", block_size),
            &block_size,
            |b, _| {
                let mut diffuser = ModulatedAllpass::new(89, SAMPLE_RATE);
                diffuser.set_modulation(0.1, 0.7);
                b.iter(|| {
                    for &sample in &input {
                        black_box(diffuser.process(black_box(sample), 0.3));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_matrices(c: &mut Criterion) {
    let mut group = c.benchmark_group("Matrix");

    let v8 = [0.1f32, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7, -0.8];
    let h8: Matrix<8> = hadamard();
    let m8: Matrix<8> = householder();
    group.bench_function("hadamard_8", |b| b.iter(|| black_box(h8.mul_vec(black_box(&v8)))));
    group.bench_function("householder_8", |b| {
        b.iter(|| black_box(m8.mul_vec(black_box(&v8))));
    });

    let v16 = [0.05f32; 16];
    let m16: Matrix<16> = householder();
    group.bench_function("householder_16", |b| {
        b.iter(|| black_box(m16.mul_vec(black_box(&v16))));
    });

    group.finish();
}

fn bench_utilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("Utilities");
    let input = generate_test_signal(1024);

    group.bench_function("soft_limit", |b| {
        b.iter(|| {
            for &sample in &input {
                black_box(soft_limit(black_box(sample * 2.0)));
            }
        });
    });

    group.bench_function("dc_blocker", |b| {
        let mut blocker = DcBlocker::new();
        b.iter(|| {
            for &sample in &input {
                black_box(blocker.process(black_box(sample)));
            }
        });
    });

    group.bench_function("denormal_guard", |b| {
        let mut guard = DenormalGuard::default();
        b.iter(|| {
            for &sample in &input {
                black_box(guard.apply(black_box(sample * 1e-9)));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_biquad,
    bench_delays,
    bench_matrices,
    bench_utilities
);
criterion_main!(benches);
