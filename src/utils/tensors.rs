use burn::tensor::{
    activation::log_softmax, backend::Backend, Data, ElementConversion, Int, Shape, Tensor,
};

/// Pad each row of values out to `seq_length` with `pad_value`, so they line up with a padded
/// batch of token ids. Rows longer than `seq_length` are cut.
pub fn pad_to<B: Backend>(
    pad_value: i64,
    values_list: Vec<Vec<i64>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = values_list.len();

    let mut padded = vec![pad_value; batch_size * seq_length];

    for (index, values) in values_list.into_iter().enumerate() {
        let row = &mut padded[index * seq_length..(index + 1) * seq_length];

        for (slot, value) in row.iter_mut().zip(values) {
            *slot = value;
        }
    }

    Tensor::from_data(
        Data::<B::IntElem, 2>::new(
            padded.into_iter().map(|e| e.elem()).collect(),
            Shape::new([batch_size, seq_length]),
        ),
        device,
    )
}

/// Cross entropy averaged over the positions whose target isn't `ignore_index`.
///
/// `logits` is `[n, n_classes]` and `targets` is `[n]`. When every target is ignored the loss
/// is zero.
pub fn masked_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    ignore_index: i64,
) -> Tensor<B, 1> {
    let [n, _n_classes] = logits.dims();

    let ignored = targets.clone().equal_elem(ignore_index);
    let kept = ignored.clone().bool_not().float();

    // The ignore index isn't a valid class, so point those rows at class 0 before gathering
    let targets = targets.mask_fill(ignored, 0);

    let log_probs = log_softmax(logits, 1)
        .gather(1, targets.reshape([n, 1]))
        .reshape([n]);

    let total = (log_probs * kept.clone()).sum().neg();

    total / kept.sum().clamp_min(1.0)
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;

    type B = NdArray;

    #[test]
    fn pads_and_truncates_rows() {
        let device = Default::default();

        let padded = pad_to::<B>(-100, vec![vec![1, 2], vec![3, 4, 5, 6]], 3, &device);

        assert_eq!(padded.dims(), [2, 3]);
        assert_eq!(
            padded.into_data().convert::<i64>().value,
            vec![1, 2, -100, 3, 4, 5]
        );
    }

    #[test]
    fn ignored_targets_do_not_contribute_to_the_loss() {
        let device = Default::default();

        let logits = Tensor::<B, 2>::from_floats(
            [[2.0, 0.5, 0.1], [9.0, -3.0, 4.0], [0.3, 0.3, 0.3]],
            &device,
        );
        let targets = Tensor::<B, 1, Int>::from_ints([0, -100, 2], &device);

        let loss = masked_cross_entropy(logits, targets, -100)
            .into_scalar()
            .elem::<f64>();

        let log_sum_exp = |row: &[f64]| row.iter().map(|x| x.exp()).sum::<f64>().ln();
        let expected = ((log_sum_exp(&[2.0, 0.5, 0.1]) - 2.0)
            + (log_sum_exp(&[0.3, 0.3, 0.3]) - 0.3))
            / 2.0;

        assert!((loss - expected).abs() < 1e-5, "{} != {}", loss, expected);
    }

    #[test]
    fn fully_ignored_batches_have_zero_loss() {
        let device = Default::default();

        let logits = Tensor::<B, 2>::from_floats([[1.0, 2.0], [3.0, 4.0]], &device);
        let targets = Tensor::<B, 1, Int>::from_ints([-100, -100], &device);

        let loss = masked_cross_entropy(logits, targets, -100)
            .into_scalar()
            .elem::<f64>();

        assert_eq!(loss, 0.0);
    }
}
