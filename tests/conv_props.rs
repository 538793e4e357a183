use approx::relative_eq;
use proptest::prelude::*;
use streamconv::layers::offline::causal_conv1d;
use streamconv::layers::{state_size, Conv1D, Conv1DT, Layer};

/// Sizes plus a pool of values that weights, bias and input are drawn from
fn conv_case() -> impl Strategy<Value = (usize, usize, usize, usize, usize, Vec<f64>)> {
    (
        1usize..4,
        1usize..4,
        1usize..5,
        1usize..6,
        0usize..48,
        prop::collection::vec(-1.0f64..1.0, 256),
    )
}

fn nest_weights(
    pool: &mut impl Iterator<Item = f64>,
    out_size: usize,
    in_size: usize,
    kernel_size: usize,
) -> Vec<Vec<Vec<f64>>> {
    (0..out_size)
        .map(|_| {
            (0..in_size)
                .map(|_| pool.by_ref().take(kernel_size).collect())
                .collect()
        })
        .collect()
}

/// Stream the same frames through `Conv1DT` and an equally-sized `Conv1D`
fn fixed_matches_runtime<
    const IN: usize,
    const OUT: usize,
    const KERNEL: usize,
    const DILATION: usize,
    const STATE: usize,
>(
    values: &[f64],
    frames: usize,
) -> Result<(), TestCaseError> {
    let mut pool = values.iter().copied().cycle();
    let weights = nest_weights(&mut pool, OUT, IN, KERNEL);
    let bias: Vec<f64> = pool.by_ref().take(OUT).collect();

    let mut runtime = Conv1D::new(IN, OUT, KERNEL, DILATION).unwrap();
    runtime.set_weights(&weights).unwrap();
    runtime.set_bias(&bias).unwrap();
    let mut fixed = Conv1DT::<f64, IN, OUT, KERNEL, DILATION, STATE>::new();
    fixed.set_weights(&weights).unwrap();
    fixed.set_bias(&bias).unwrap();

    let mut out = [0.0; OUT];
    for _ in 0..frames {
        let mut frame = [0.0; IN];
        for x in frame.iter_mut() {
            *x = pool.next().unwrap_or(0.0);
        }
        runtime.forward(&frame, &mut out);
        let fixed_out = fixed.process(&frame);
        for (a, b) in out.iter().zip(&fixed_out) {
            prop_assert!(relative_eq!(*a, *b, epsilon = 1e-12), "{} != {}", a, b);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn conv_props_stream_matches_batch(
        (in_size, out_size, kernel_size, dilation, frames, values) in conv_case(),
    ) {
        let mut pool = values.into_iter().cycle();
        let weights = nest_weights(&mut pool, out_size, in_size, kernel_size);
        let bias: Vec<f64> = pool.by_ref().take(out_size).collect();
        let input: Vec<Vec<f64>> = (0..frames)
            .map(|_| pool.by_ref().take(in_size).collect())
            .collect();

        let mut conv = Conv1D::new(in_size, out_size, kernel_size, dilation).unwrap();
        conv.set_weights(&weights).unwrap();
        conv.set_bias(&bias).unwrap();

        let reference = causal_conv1d(&input, &weights, &bias, dilation).unwrap();
        let mut out = vec![0.0; out_size];
        for (frame, expected) in input.iter().zip(&reference) {
            conv.forward(frame, &mut out);
            for (a, b) in out.iter().zip(expected) {
                prop_assert!(relative_eq!(*a, *b, epsilon = 1e-9), "{} != {}", a, b);
            }
        }
    }

    #[test]
    fn conv_props_reset_replays(
        (in_size, out_size, kernel_size, dilation, frames, values) in conv_case(),
    ) {
        let mut pool = values.into_iter().cycle();
        let weights = nest_weights(&mut pool, out_size, in_size, kernel_size);
        let input: Vec<Vec<f64>> = (0..frames)
            .map(|_| pool.by_ref().take(in_size).collect())
            .collect();

        let mut conv = Conv1D::new(in_size, out_size, kernel_size, dilation).unwrap();
        conv.set_weights(&weights).unwrap();

        let run = |conv: &mut Conv1D<f64>| -> Vec<Vec<f64>> {
            input
                .iter()
                .map(|frame| {
                    let mut out = vec![0.0; out_size];
                    conv.forward(frame, &mut out);
                    out
                })
                .collect()
        };
        let first = run(&mut conv);
        conv.reset();
        let second = run(&mut conv);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn conv_props_fixed_matches_runtime(
        frames in 0usize..64,
        values in prop::collection::vec(-1.0f64..1.0, 128),
    ) {
        fixed_matches_runtime::<1, 1, 1, 1, { state_size(1, 1) }>(&values, frames)?;
        fixed_matches_runtime::<1, 1, 3, 2, { state_size(3, 2) }>(&values, frames)?;
        fixed_matches_runtime::<2, 3, 2, 5, { state_size(2, 5) }>(&values, frames)?;
        fixed_matches_runtime::<3, 2, 4, 1, { state_size(4, 1) }>(&values, frames)?;
        fixed_matches_runtime::<4, 4, 3, 8, { state_size(3, 8) }>(&values, frames)?;
    }

    #[test]
    fn conv_props_state_size(kernel_size in 1usize..16, dilation in 1usize..16) {
        let conv = Conv1D::<f32>::new(1, 1, kernel_size, dilation).unwrap();
        prop_assert_eq!(conv.state_size(), (kernel_size - 1) * dilation + 1);
        prop_assert_eq!(conv.receptive_field(), conv.state_size());
    }
}
