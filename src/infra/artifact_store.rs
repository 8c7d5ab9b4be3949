// ============================================================
// Layer 6 - Artifact Store
// ============================================================
// Persists everything inference needs as one versioned bundle:
//
//   <root>/
//     vocabulary.json          shared by both axes
//     train_config.json        provenance of the last training run
//     sentiment/
//       labels.json            ordered class list
//       classifier.json        format version, model config,
//                              vocabulary fingerprint, report
//       weights.mpk            burn NamedMpk record (full precision)
//     intent/
//       ...
//
// Writes never leave a half-written axis behind: each axis is
// written into a fresh staging directory and renamed into place,
// and the vocabulary goes through a temp file + rename. Writing
// one axis never touches the other axis's directory, and a new
// vocabulary is only accepted together with every axis it would
// otherwise orphan.
//
// Loads check that the pieces belong together: every axis records
// the fingerprint of the vocabulary it was trained against, and a
// mismatch is `ArtifactIncompatible` rather than silently garbled
// embeddings.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::data::{label_encoder::LabelEncoder, vocabulary::Vocabulary};
use crate::domain::axis::Axis;
use crate::domain::error::{PipelineError, Result};
use crate::ml::model::{SequenceClassifierConfig, SequenceClassifierModel};
use crate::ml::trainer::TrainingReport;
use crate::ml::{InferBackend, InferDevice};

pub const BUNDLE_FORMAT_VERSION: u32 = 1;

const VOCABULARY_FILE: &str   = "vocabulary.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const LABELS_FILE: &str       = "labels.json";
const MANIFEST_FILE: &str     = "classifier.json";
/// The recorder appends ".mpk".
const WEIGHTS_STEM: &str      = "weights";
const WEIGHTS_FILE: &str      = "weights.mpk";

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

// ─── AxisArtifacts ────────────────────────────────────────────────────────────
/// Everything one axis contributes to a bundle.
#[derive(Debug, Clone)]
pub struct AxisArtifacts {
    pub axis:   Axis,
    pub labels: LabelEncoder,
    pub config: SequenceClassifierConfig,
    pub model:  SequenceClassifierModel<InferBackend>,
    pub report: Option<TrainingReport>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassifierManifest {
    format_version:         u32,
    axis:                   Axis,
    vocabulary_fingerprint: u32,
    model:                  SequenceClassifierConfig,
    report:                 Option<TrainingReport>,
}

// ─── LoadedBundle ─────────────────────────────────────────────────────────────
#[derive(Debug)]
pub struct LoadedBundle {
    pub vocabulary: Arc<Vocabulary>,
    axes:           BTreeMap<Axis, AxisArtifacts>,
}

impl LoadedBundle {
    /// Moves one axis out of the bundle.
    pub fn take(&mut self, axis: Axis) -> Result<AxisArtifacts> {
        self.axes.remove(&axis).ok_or_else(|| {
            PipelineError::not_ready(format!("the {axis} axis was not requested from the bundle"))
        })
    }

    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.axes.keys().copied()
    }
}

// ─── ArtifactStore ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn axis_dir(&self, axis: Axis) -> PathBuf {
        self.root.join(axis.as_str())
    }

    // ── Save ──────────────────────────────────────────────────────────────────
    /// Writes the vocabulary (if it changed) and the given axes.
    ///
    /// Every check runs before the first write. A new vocabulary is
    /// refused when an axis already on disk was trained against the
    /// current one and is not rewritten in the same call. Axes are
    /// staged in full before the vocabulary or any axis is swapped in.
    pub fn save_bundle(&self, vocabulary: &Vocabulary, axes: &[AxisArtifacts]) -> Result<()> {
        for artifacts in axes {
            if artifacts.config.vocab_size != vocabulary.size() {
                return Err(PipelineError::incompatible(format!(
                    "{} classifier was built for {} vocabulary rows, bundle vocabulary has {}",
                    artifacts.axis,
                    artifacts.config.vocab_size,
                    vocabulary.size()
                )));
            }
        }
        fs::create_dir_all(&self.root)?;
        let vocabulary_changed = self.check_vocabulary_change(vocabulary, axes)?;

        let fingerprint = vocabulary.fingerprint();
        let mut staged: Vec<(Axis, PathBuf)> = Vec::with_capacity(axes.len());
        for artifacts in axes {
            match self.stage_axis(artifacts, fingerprint) {
                Ok(dir) => staged.push((artifacts.axis, dir)),
                Err(e)  => {
                    discard_staged(&staged);
                    return Err(e);
                }
            }
        }

        if vocabulary_changed {
            let path = self.root.join(VOCABULARY_FILE);
            if let Err(e) = write_json_atomic(&self.root, &path, vocabulary) {
                discard_staged(&staged);
                return Err(e);
            }
            tracing::info!("Saved vocabulary ({} entries) to '{}'", vocabulary.size(), path.display());
        }

        for (i, (axis, staging)) in staged.iter().enumerate() {
            if let Err(e) = self.swap_axis(*axis, staging) {
                discard_staged(&staged[i + 1..]);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Whether `vocabulary` replaces the one on disk. Errors when the
    /// replacement would orphan an axis left out of `axes`.
    fn check_vocabulary_change(&self, vocabulary: &Vocabulary, axes: &[AxisArtifacts]) -> Result<bool> {
        let path = self.root.join(VOCABULARY_FILE);
        let existing = match read_json::<Vocabulary>(&path) {
            Ok(existing) => existing,
            // nothing usable on disk to protect
            Err(_) => return Ok(true),
        };
        if existing.fingerprint() == vocabulary.fingerprint() {
            tracing::debug!("Vocabulary unchanged, keeping '{}'", path.display());
            return Ok(false);
        }

        let orphaned = self
            .available_axes()
            .into_iter()
            .filter(|on_disk| !axes.iter().any(|a| a.axis == *on_disk))
            .collect::<Vec<_>>();
        if !orphaned.is_empty() {
            return Err(PipelineError::incompatible(format!(
                "new vocabulary {:08x} would orphan saved axes [{}] trained against {:08x}; save them together",
                vocabulary.fingerprint(),
                orphaned.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", "),
                existing.fingerprint()
            )));
        }
        Ok(true)
    }

    /// Writes one axis into a fresh staging directory.
    fn stage_axis(&self, artifacts: &AxisArtifacts, fingerprint: u32) -> Result<PathBuf> {
        let staging = self.root.join(format!(".{}.staging-{}", artifacts.axis, uuid::Uuid::new_v4()));
        fs::create_dir_all(&staging)?;

        if let Err(e) = write_axis_files(&staging, artifacts, fingerprint) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }
        Ok(staging)
    }

    fn swap_axis(&self, axis: Axis, staging: &Path) -> Result<()> {
        let target  = self.axis_dir(axis);
        let retired = self.root.join(format!(".{axis}.retired-{}", uuid::Uuid::new_v4()));
        let had_previous = target.exists();
        if had_previous {
            if let Err(e) = fs::rename(&target, &retired) {
                let _ = fs::remove_dir_all(staging);
                return Err(e.into());
            }
        }

        if let Err(e) = fs::rename(staging, &target) {
            if had_previous {
                let _ = fs::rename(&retired, &target);
            }
            let _ = fs::remove_dir_all(staging);
            return Err(e.into());
        }

        if had_previous {
            if let Err(e) = fs::remove_dir_all(&retired) {
                tracing::warn!("Could not remove retired '{}': {e}", retired.display());
            }
        }
        tracing::info!("Saved {axis} classifier to '{}'", target.display());
        Ok(())
    }

    /// Records the training configuration next to the bundle.
    pub fn save_train_config<T: Serialize>(&self, config: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(TRAIN_CONFIG_FILE);
        write_json_atomic(&self.root, &path, config)?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(path)
    }

    pub fn load_train_config<T: DeserializeOwned>(&self) -> Result<T> {
        read_json(&self.root.join(TRAIN_CONFIG_FILE))
    }

    // ── Load ──────────────────────────────────────────────────────────────────
    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        read_json(&self.root.join(VOCABULARY_FILE))
    }

    /// Loads the shared vocabulary and every requested axis. Either
    /// all of them load or an error is returned.
    pub fn load_bundle(&self, axes: &[Axis]) -> Result<LoadedBundle> {
        let vocabulary = self.load_vocabulary()?;
        let device     = InferDevice::default();

        let mut loaded = BTreeMap::new();
        for &axis in axes {
            loaded.insert(axis, self.load_axis(axis, &vocabulary, &device)?);
        }

        tracing::info!(
            "Loaded bundle from '{}': {} vocabulary entries, axes [{}]",
            self.root.display(),
            vocabulary.size(),
            loaded.keys().map(Axis::as_str).collect::<Vec<_>>().join(", "),
        );
        Ok(LoadedBundle { vocabulary: Arc::new(vocabulary), axes: loaded })
    }

    fn load_axis(&self, axis: Axis, vocabulary: &Vocabulary, device: &InferDevice) -> Result<AxisArtifacts> {
        let dir = self.axis_dir(axis);
        for file in [LABELS_FILE, MANIFEST_FILE, WEIGHTS_FILE] {
            let path = dir.join(file);
            if !path.exists() {
                return Err(PipelineError::missing(path));
            }
        }

        let labels: LabelEncoder         = read_json(&dir.join(LABELS_FILE))?;
        let manifest: ClassifierManifest = read_json(&dir.join(MANIFEST_FILE))?;
        check_manifest(axis, &manifest, &labels, vocabulary)?;

        let record = WeightsRecorder::new()
            .load(dir.join(WEIGHTS_STEM), device)
            .map_err(|e| PipelineError::Recorder(format!("{}: {e}", dir.join(WEIGHTS_FILE).display())))?;
        let model = manifest.model.init::<InferBackend>(device).load_record(record);

        Ok(AxisArtifacts {
            axis,
            labels,
            config: manifest.model,
            model,
            report: manifest.report,
        })
    }

    // ── Health ────────────────────────────────────────────────────────────────
    /// Axes whose three files are all present.
    pub fn available_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|&axis| {
                let dir = self.axis_dir(axis);
                [LABELS_FILE, MANIFEST_FILE, WEIGHTS_FILE]
                    .iter()
                    .all(|f| dir.join(f).exists())
            })
            .collect()
    }

    /// Vocabulary plus both axes present on disk.
    pub fn has_bundle(&self) -> bool {
        self.root.join(VOCABULARY_FILE).exists() && self.available_axes().len() == Axis::ALL.len()
    }
}

fn discard_staged(staged: &[(Axis, PathBuf)]) {
    for (_, dir) in staged {
        let _ = fs::remove_dir_all(dir);
    }
}

fn write_axis_files(dir: &Path, artifacts: &AxisArtifacts, fingerprint: u32) -> Result<()> {
    let manifest = ClassifierManifest {
        format_version:         BUNDLE_FORMAT_VERSION,
        axis:                   artifacts.axis,
        vocabulary_fingerprint: fingerprint,
        model:                  artifacts.config.clone(),
        report:                 artifacts.report.clone(),
    };
    fs::write(dir.join(LABELS_FILE), serde_json::to_string_pretty(&artifacts.labels)?)?;
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;

    WeightsRecorder::new()
        .record(artifacts.model.clone().into_record(), dir.join(WEIGHTS_STEM))
        .map_err(|e| PipelineError::Recorder(format!("{}: {e}", dir.display())))
}

fn check_manifest(
    axis:       Axis,
    manifest:   &ClassifierManifest,
    labels:     &LabelEncoder,
    vocabulary: &Vocabulary,
) -> Result<()> {
    if manifest.format_version != BUNDLE_FORMAT_VERSION {
        return Err(PipelineError::incompatible(format!(
            "{axis}: bundle format {} (this build reads {BUNDLE_FORMAT_VERSION})",
            manifest.format_version
        )));
    }
    if manifest.axis != axis {
        return Err(PipelineError::incompatible(format!(
            "{axis} directory holds a {} classifier",
            manifest.axis
        )));
    }
    if manifest.vocabulary_fingerprint != vocabulary.fingerprint() {
        return Err(PipelineError::incompatible(format!(
            "{axis} classifier was trained against vocabulary {:08x}, bundle has {:08x}",
            manifest.vocabulary_fingerprint,
            vocabulary.fingerprint()
        )));
    }
    if manifest.model.vocab_size != vocabulary.size() {
        return Err(PipelineError::incompatible(format!(
            "{axis} classifier expects {} vocabulary rows, bundle has {}",
            manifest.model.vocab_size,
            vocabulary.size()
        )));
    }
    let expected = axis.classes();
    if labels.classes() != expected || manifest.model.num_classes != expected.len() {
        return Err(PipelineError::incompatible(format!(
            "{axis} classes [{}] differ from [{}]",
            labels.classes().join(", "),
            expected.join(", ")
        )));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(PipelineError::missing(path));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Temp file in `dir`, then rename over `path`.
fn write_json_atomic<T: Serialize + ?Sized>(dir: &Path, path: &Path, value: &T) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(serde_json::to_string_pretty(value)?.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;
    Ok(())
}
