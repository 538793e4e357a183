use criterion::{black_box, criterion_group, criterion_main, Criterion};
use streamconv::layers::{state_size, Conv1D, Conv1DT, Layer};
use streamconv::model::Model;

fn bench_conv1d(c: &mut Criterion) {
    let mut conv = Conv1D::<f32>::new(8, 8, 3, 8).unwrap();
    let input = [0.1f32; 8];
    let mut out = [0.0f32; 8];

    c.bench_function("conv1d_runtime_8x8_k3_d8", |b| {
        b.iter(|| {
            conv.forward(black_box(&input), &mut out);
            black_box(&out);
        })
    });

    let mut fixed = Conv1DT::<f32, 8, 8, 3, 8, { state_size(3, 8) }>::new();
    c.bench_function("conv1d_fixed_8x8_k3_d8", |b| {
        b.iter(|| {
            black_box(fixed.process(black_box(&input)));
        })
    });
}

fn bench_model_block(c: &mut Criterion) {
    let mut model = Model::<f32>::new(1).unwrap();
    let mut in_size = 1;
    for dilation in [1, 2, 4, 8, 16] {
        model
            .push_layer(Box::new(Conv1D::new(in_size, 8, 3, dilation).unwrap()))
            .unwrap();
        in_size = 8;
    }
    model
        .push_layer(Box::new(Conv1D::new(8, 1, 1, 1).unwrap()))
        .unwrap();
    let block = vec![0.1f32; 512];

    c.bench_function("model_tcn_block_512", |b| {
        b.iter(|| {
            for &x in &block {
                black_box(model.forward_sample(black_box(x)));
            }
        })
    });
}

criterion_group!(benches, bench_conv1d, bench_model_block);
criterion_main!(benches);
