// ============================================================
// Layer 4 - Feedback Batcher
// ============================================================
// Implements burn's Batcher trait: stacks N encoded samples into
// one [N, S] index tensor plus a [N] target tensor.
//
// All samples are already padded to the vocabulary's sequence
// length, so stacking is a flatten followed by a reshape:
//   [s1_t1, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::FeedbackSample;

// ─── FeedbackBatch ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FeedbackBatch<B: Backend> {
    /// Token indices, shape [batch_size, seq_len]. 0 is padding.
    pub input_ids: Tensor<B, 2, Int>,

    /// Class codes, shape [batch_size].
    pub targets: Tensor<B, 1, Int>,
}

// ─── FeedbackBatcher ──────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct FeedbackBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> FeedbackBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Flattens equally long id rows into one [rows, seq_len] tensor.
pub fn stack_ids<B: Backend>(rows: &[&[u32]], device: &B::Device) -> Tensor<B, 2, Int> {
    let batch_size = rows.len();
    let seq_len    = rows.first().map_or(0, |r| r.len());

    let flat: Vec<i32> = rows
        .iter()
        .flat_map(|r| r.iter().map(|&id| id as i32))
        .collect();

    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([batch_size, seq_len])
}

impl<B: Backend> Batcher<FeedbackSample, FeedbackBatch<B>> for FeedbackBatcher<B> {
    fn batch(&self, items: Vec<FeedbackSample>) -> FeedbackBatch<B> {
        let rows: Vec<&[u32]> = items.iter().map(|s| s.input_ids.as_slice()).collect();
        let input_ids         = stack_ids::<B>(&rows, &self.device);

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();
        let targets          = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        FeedbackBatch { input_ids, targets }
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let batcher = FeedbackBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![
            FeedbackSample { input_ids: vec![5, 3, 0], label: 2 },
            FeedbackSample { input_ids: vec![1, 0, 0], label: 0 },
        ]);

        assert_eq!(batch.input_ids.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2]);

        let ids: Vec<i64> = batch.input_ids.into_data().iter::<i64>().collect();
        assert_eq!(ids, vec![5, 3, 0, 1, 0, 0]);
    }
}
