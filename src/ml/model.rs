// ============================================================
// Layer 5 - Sequence Classifier Model
// ============================================================
// Embedding → two stacked LSTM layers → masked mean pool →
// dense(ReLU) → class logits.
//
//   input_ids [b, s]
//       │ embedding
//   [b, s, e]
//       │ recurrent 1 (+ dropout)
//   [b, s, h1 · dirs]
//       │ recurrent 2 (+ dropout)
//   [b, s, h2 · dirs]
//       │ mean over non-padding positions
//   [b, h2 · dirs]
//       │ dense + ReLU + dropout
//   [b, dense]
//       │ head
//   [b, classes]
//
// The sentiment axis reads in both directions (dirs = 2), the
// intent axis forwards only. Padding (index 0) is excluded from
// the pool, so trailing zeros never dilute a short review.

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        lstm::{BiLstm, BiLstmConfig, Lstm, LstmConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};

use crate::data::vocabulary::PAD_INDEX;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SequenceClassifierConfig {
    pub vocab_size:         usize,
    pub num_classes:        usize,
    pub bidirectional:      bool,
    pub hidden_size:        usize,
    pub second_hidden_size: usize,
    #[config(default = 128)]
    pub embedding_dim:      usize,
    #[config(default = 64)]
    pub dense_size:         usize,
    #[config(default = 0.3)]
    pub dropout:            f64,
    #[config(default = 0.2)]
    pub head_dropout:       f64,
}

impl SequenceClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceClassifierModel<B> {
        let directions = if self.bidirectional { 2 } else { 1 };

        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let first     = self.recurrent(self.embedding_dim, self.hidden_size, device);
        let second    = self.recurrent(self.hidden_size * directions, self.second_hidden_size, device);
        let dense     = LinearConfig::new(self.second_hidden_size * directions, self.dense_size).init(device);
        let head      = LinearConfig::new(self.dense_size, self.num_classes).init(device);

        SequenceClassifierModel {
            embedding,
            first,
            second,
            dense,
            head,
            dropout:      DropoutConfig::new(self.dropout).init(),
            head_dropout: DropoutConfig::new(self.head_dropout).init(),
        }
    }

    fn recurrent<B: Backend>(&self, d_input: usize, d_hidden: usize, device: &B::Device) -> RecurrentLayer<B> {
        if self.bidirectional {
            RecurrentLayer {
                bidirectional:  Some(BiLstmConfig::new(d_input, d_hidden, true).init(device)),
                unidirectional: None,
            }
        } else {
            RecurrentLayer {
                bidirectional:  None,
                unidirectional: Some(LstmConfig::new(d_input, d_hidden, true).init(device)),
            }
        }
    }
}

// ─── RecurrentLayer ───────────────────────────────────────────────────────────
/// Exactly one of the two fields is set, fixed by the config.
#[derive(Module, Debug)]
pub struct RecurrentLayer<B: Backend> {
    pub bidirectional:  Option<BiLstm<B>>,
    pub unidirectional: Option<Lstm<B>>,
}

impl<B: Backend> RecurrentLayer<B> {
    /// [b, s, d_in] → [b, s, d_hidden · dirs]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match (&self.bidirectional, &self.unidirectional) {
            (Some(bi), _)      => bi.forward(x, None).0,
            (None, Some(uni))  => uni.forward(x, None).0,
            (None, None)       => x,
        }
    }
}

// ─── SequenceClassifierModel ──────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SequenceClassifierModel<B: Backend> {
    pub embedding:    Embedding<B>,
    pub first:        RecurrentLayer<B>,
    pub second:       RecurrentLayer<B>,
    pub dense:        Linear<B>,
    pub head:         Linear<B>,
    pub dropout:      Dropout,
    pub head_dropout: Dropout,
}

pub struct ClassificationOutput<B: Backend> {
    pub loss:    Tensor<B, 1>,
    pub logits:  Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> SequenceClassifierModel<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let mask = input_ids.clone().greater_elem(PAD_INDEX as i32).float(); // [b, s]

        let x = self.embedding.forward(input_ids);
        let x = self.dropout.forward(self.first.forward(x));
        let x = self.dropout.forward(self.second.forward(x)); // [b, s, h]
        let [_, _, hidden] = x.dims();

        // Masked mean: sum real positions, divide by their count.
        let mask3  = mask.clone().reshape([batch_size, seq_len, 1]).expand([batch_size, seq_len, hidden]);
        let summed = (x * mask3).sum_dim(1).reshape([batch_size, hidden]);
        let counts = mask
            .sum_dim(1)
            .clamp_min(1.0)
            .expand([batch_size, hidden]);
        let pooled = summed / counts;

        let x = self.head_dropout.forward(relu(self.dense.forward(pooled)));
        self.head.forward(x)
    }

    pub fn forward_classification(
        &self,
        input_ids: Tensor<B, 2, Int>,
        targets:   Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let logits = self.forward(input_ids);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets.clone());

        ClassificationOutput { loss, logits, targets }
    }

    /// Softmax over classes: [batch, num_classes], rows sum to 1.
    pub fn probabilities(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        softmax(self.forward(input_ids), 1)
    }
}

/// Number of rows whose arg-max matches the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) keeps the reduced dim: [batch, 1] → [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type TestBackend = NdArray;

    fn tiny(bidirectional: bool) -> SequenceClassifierConfig {
        SequenceClassifierConfig::new(20, 3, bidirectional, 6, 4)
            .with_embedding_dim(8)
            .with_dense_size(5)
    }

    fn ids(rows: &[[i32; 5]]) -> Tensor<TestBackend, 2, Int> {
        let flat: Vec<i32> = rows.iter().flatten().copied().collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &Default::default())
            .reshape([rows.len(), 5])
    }

    #[test]
    fn test_output_shape_both_directions() {
        let device = Default::default();
        for bidirectional in [true, false] {
            let model = tiny(bidirectional).init::<TestBackend>(&device);
            let out   = model.forward(ids(&[[3, 4, 0, 0, 0], [5, 6, 7, 8, 9]]));
            assert_eq!(out.dims(), [2, 3]);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = tiny(true).init::<TestBackend>(&Default::default());
        let probs: Vec<f32> = model
            .probabilities(ids(&[[3, 4, 0, 0, 0], [0, 0, 0, 0, 0]]))
            .into_data()
            .iter::<f32>()
            .collect();
        for row in probs.chunks(3) {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_count_correct() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::from_floats([[0.1, 0.9, 0.0], [2.0, 0.0, 1.0]], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device);
        assert_eq!(count_correct(logits, targets), 1);
    }
}
