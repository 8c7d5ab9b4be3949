// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Supervised train + validation loop using burn's DataLoader and
// Adam, run once per axis.
//
//   - Training runs on TrainBackend (Autodiff<NdArray>)
//   - model.valid() moves the model to InferBackend (NdArray),
//     which also switches dropout off
//   - argmax(1) returns [batch, 1], flattened before .equal()
//
// The backend RNG and the loader shuffle are both seeded, so a
// run is reproducible for a given seed and corpus.

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE, DEFAULT_SEED, DEFAULT_VALIDATION_SPLIT,
};
use crate::data::{
    batcher::FeedbackBatcher,
    dataset::{FeedbackDataset, FeedbackSample},
};
use crate::domain::axis::Axis;
use crate::domain::error::{PipelineError, Result};
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::{count_correct, SequenceClassifierConfig, SequenceClassifierModel};
use crate::ml::{InferBackend, InferDevice, TrainBackend};

// ─── TrainingOptions ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub epochs:           usize,
    pub batch_size:       usize,
    /// Fraction held out for validation, in [0, 1).
    pub validation_split: f64,
    pub learning_rate:    f64,
    pub seed:             u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs:           DEFAULT_EPOCHS,
            batch_size:       DEFAULT_BATCH_SIZE,
            validation_split: DEFAULT_VALIDATION_SPLIT,
            learning_rate:    DEFAULT_LEARNING_RATE,
            seed:             DEFAULT_SEED,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(PipelineError::invalid_input("epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::invalid_input("batch_size must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PipelineError::invalid_input(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PipelineError::invalid_input(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

// ─── TrainingReport ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub axis:                Axis,
    pub epochs:              Vec<EpochMetrics>,
    /// Accuracy over the training batches of the last epoch.
    pub train_accuracy:      f64,
    /// None when nothing was held out.
    pub validation_accuracy: Option<f64>,
    pub train_samples:       usize,
    pub validation_samples:  usize,
}

// ─── run_training ─────────────────────────────────────────────────────────────
pub fn run_training(
    axis:          Axis,
    model_cfg:     &SequenceClassifierConfig,
    train_samples: Vec<FeedbackSample>,
    val_samples:   Vec<FeedbackSample>,
    opts:          &TrainingOptions,
) -> Result<(SequenceClassifierModel<InferBackend>, TrainingReport)> {
    opts.validate()?;
    if train_samples.is_empty() {
        return Err(PipelineError::invalid_input(format!("no training samples for the {axis} axis")));
    }
    if let Some(bad) = train_samples.iter().chain(&val_samples).find(|s| s.label >= model_cfg.num_classes) {
        return Err(PipelineError::numeric(format!(
            "class code {} out of range for {} classes",
            bad.label, model_cfg.num_classes
        )));
    }

    let device = InferDevice::default();
    <TrainBackend as Backend>::seed(opts.seed);

    let train_count = train_samples.len();
    let val_count   = val_samples.len();

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: SequenceClassifierModel<TrainBackend> = model_cfg.init(&device);
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();
    tracing::info!(
        "Training {axis} classifier: {train_count} train / {val_count} validation samples, {} epochs{}",
        opts.epochs,
        if model_cfg.bidirectional { ", bidirectional" } else { "" },
    );

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(FeedbackBatcher::<TrainBackend>::new(device.clone()))
        .batch_size(opts.batch_size)
        .shuffle(opts.seed)
        .num_workers(1)
        .build(FeedbackDataset::new(train_samples));

    let val_loader = DataLoaderBuilder::new(FeedbackBatcher::<InferBackend>::new(device.clone()))
        .batch_size(opts.batch_size)
        .num_workers(1)
        .build(FeedbackDataset::new(val_samples));

    let mut epochs = Vec::with_capacity(opts.epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=opts.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut train_correct  = 0usize;
        let mut train_seen     = 0usize;

        for batch in train_loader.iter() {
            let out = model.forward_classification(batch.input_ids, batch.targets);

            let loss_val: f64 = out.loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(PipelineError::numeric(format!(
                    "{axis} training loss became {loss_val} in epoch {epoch}"
                )));
            }
            train_loss_sum += loss_val;
            train_batches  += 1;
            train_seen     += out.targets.dims()[0];
            train_correct  += count_correct(out.logits.inner(), out.targets.inner());

            let grads = out.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.learning_rate, model, grads);
        }

        // ── Validation phase (dropout off) ────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_correct  = 0usize;
        let mut val_seen     = 0usize;

        for batch in val_loader.iter() {
            let out = model_valid.forward_classification(batch.input_ids, batch.targets);
            val_loss_sum += out.loss.into_scalar().elem::<f64>();
            val_batches  += 1;
            val_seen     += out.targets.dims()[0];
            val_correct  += count_correct(out.logits, out.targets);
        }

        let metrics = EpochMetrics::new(
            epoch,
            train_loss_sum / train_batches.max(1) as f64,
            (val_batches > 0).then(|| val_loss_sum / val_batches as f64),
            train_correct as f64 / train_seen.max(1) as f64,
            (val_seen > 0).then(|| val_correct as f64 / val_seen as f64),
        );
        tracing::info!("[{axis}] {}", metrics.summary_line(opts.epochs));
        epochs.push(metrics);
    }

    let last = epochs
        .last()
        .cloned()
        .ok_or_else(|| PipelineError::numeric("training produced no epochs"))?;

    let report = TrainingReport {
        axis,
        epochs,
        train_accuracy:      last.train_acc,
        validation_accuracy: last.val_acc,
        train_samples:       train_count,
        validation_samples:  val_count,
    };
    tracing::info!(
        "{axis} training complete: train_acc={:.4}, val_acc={}",
        report.train_accuracy,
        report.validation_accuracy.map_or("n/a".to_string(), |a| format!("{a:.4}")),
    );

    Ok((model.valid(), report))
}
