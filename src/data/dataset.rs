use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One encoded text and its class code.
/// `input_ids` always has the vocabulary's fixed sequence length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSample {
    pub input_ids: Vec<u32>,
    pub label:     usize,
}

pub struct FeedbackDataset {
    samples: Vec<FeedbackSample>,
}

impl FeedbackDataset {
    pub fn new(samples: Vec<FeedbackSample>) -> Self { Self { samples } }
}

impl Dataset<FeedbackSample> for FeedbackDataset {
    fn get(&self, index: usize) -> Option<FeedbackSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_access() {
        let ds = FeedbackDataset::new(vec![
            FeedbackSample { input_ids: vec![4, 2, 0, 0], label: 1 },
            FeedbackSample { input_ids: vec![3, 0, 0, 0], label: 0 },
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().label, 0);
        assert!(ds.get(2).is_none());
    }
}
