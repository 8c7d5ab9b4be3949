// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends per-epoch training metrics to a CSV file so learning
// curves of both axes can be compared after a run.
//
// Output file: <artifact_dir>/metrics.csv
//
//   axis,epoch,train_loss,val_loss,train_acc,val_acc
//   sentiment,1,1.098612,1.097011,0.341667,0.366667
//   intent,1,1.609438,1.608100,0.205000,0.220000
//
// Validation columns are empty when nothing was held out.
//
// Reading the curves:
//   - loss should fall epoch over epoch
//   - val_loss rising while train_loss falls → overfitting

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::axis::Axis;
use crate::domain::error::Result;

/// One row of metrics for a single training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1.
    pub epoch: usize,

    /// Mean cross-entropy over the training batches.
    pub train_loss: f64,

    /// Mean cross-entropy over the validation batches.
    pub val_loss: Option<f64>,

    /// Fraction of training samples classified correctly, in [0, 1].
    pub train_acc: f64,

    pub val_acc: Option<f64>,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        val_loss:   Option<f64>,
        train_acc:  f64,
        val_acc:    Option<f64>,
    ) -> Self {
        Self { epoch, train_loss, val_loss, train_acc, val_acc }
    }

    pub fn summary_line(&self, total_epochs: usize) -> String {
        format!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={} | train_acc={:.1}% | val_acc={}",
            self.epoch,
            total_epochs,
            self.train_loss,
            self.val_loss.map_or("n/a".to_string(), |v| format!("{v:.4}")),
            self.train_acc * 100.0,
            self.val_acc.map_or("n/a".to_string(), |v| format!("{:.1}%", v * 100.0)),
        )
    }
}

fn optional(v: Option<f64>) -> String {
    v.map_or(String::new(), |v| format!("{v:.6}"))
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to one log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "axis,epoch,train_loss,val_loss,train_acc,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, axis: Axis, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{},{:.6},{},{:.6},{}",
            axis,
            m.epoch,
            m.train_loss,
            optional(m.val_loss),
            m.train_acc,
            optional(m.val_acc),
        )?;

        tracing::debug!("Logged {axis} epoch {} metrics: train_loss={:.4}", m.epoch, m.train_loss);
        Ok(())
    }

    pub fn log_all(&self, axis: Axis, epochs: &[EpochMetrics]) -> Result<()> {
        epochs.iter().try_for_each(|m| self.log(axis, m))
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_without_validation() {
        let line = EpochMetrics::new(1, 2.5, None, 0.2, None).summary_line(5);
        assert!(line.contains("1/5"));
        assert!(line.contains("val_loss=n/a"));
        assert!(line.contains("train_acc=20.0%"));
    }

    #[test]
    fn test_csv_rows_append() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(Axis::Sentiment, &EpochMetrics::new(1, 1.0, Some(0.9), 0.5, Some(0.25))).unwrap();
        logger.log(Axis::Intent, &EpochMetrics::new(1, 1.5, None, 0.4, None)).unwrap();

        let csv   = fs::read_to_string(logger.csv_path()).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "axis,epoch,train_loss,val_loss,train_acc,val_acc");
        assert_eq!(lines[1], "sentiment,1,1.000000,0.900000,0.500000,0.250000");
        assert_eq!(lines[2], "intent,1,1.500000,,0.400000,");

        // reopening does not duplicate the header
        MetricsLogger::new(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(logger.csv_path()).unwrap().lines().count(), 3);
    }
}
