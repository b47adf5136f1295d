//! Sample aggregation across recording files.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use clonebot_schema::{EncoderConfig, Sample, extract_sample_from_value};
use rand::{Rng, seq::SliceRandom};

use crate::recording::Recording;

/// What happened while aggregating recording files.
///
/// Surfaced to the operator after loading; skips are warnings, not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub frames_extracted: usize,
    pub frames_skipped: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples from {} files ({} files skipped, {} frames skipped)",
            self.frames_extracted, self.files_loaded, self.files_skipped, self.frames_skipped
        )
    }
}

/// In-memory sample store for one training run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Loads and encodes every recording file, best-effort.
    ///
    /// Files that fail to open or parse, and frames that fail to extract,
    /// are warned about on stderr and counted in the report; neither aborts
    /// the aggregation. An empty result is valid here; the caller decides
    /// whether that is fatal.
    #[must_use]
    pub fn load_files(paths: &[PathBuf], config: &EncoderConfig) -> (Self, LoadReport) {
        let mut samples = Vec::new();
        let mut report = LoadReport::default();
        for path in paths {
            match Recording::open(path) {
                Ok(recording) => {
                    report.files_loaded += 1;
                    Self::extract_frames(&recording, path, config, &mut samples, &mut report);
                }
                Err(reason) => {
                    eprintln!("Warning: skipping {}: {reason}", path.display());
                    report.files_skipped += 1;
                }
            }
        }
        (Self { samples }, report)
    }

    fn extract_frames(
        recording: &Recording,
        path: &Path,
        config: &EncoderConfig,
        samples: &mut Vec<Sample>,
        report: &mut LoadReport,
    ) {
        for (index, frame) in recording.frames.iter().enumerate() {
            match extract_sample_from_value(frame, config) {
                Ok(sample) => {
                    samples.push(sample);
                    report.frames_extracted += 1;
                }
                Err(reason) => {
                    eprintln!(
                        "Warning: skipping frame {index} of {}: {reason}",
                        path.display()
                    );
                    report.frames_skipped += 1;
                }
            }
        }
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Splits into disjoint train/validation subsets by random assignment.
    ///
    /// The validation subset gets `floor(len * val_split)` samples; the
    /// remainder trains. `val_split` is clamped to `[0, 1]`.
    #[must_use]
    pub fn split<R>(mut self, val_split: f32, rng: &mut R) -> (Self, Self)
    where
        R: Rng + ?Sized,
    {
        self.samples.shuffle(rng);
        let val_len = (self.samples.len() as f32 * val_split.clamp(0.0, 1.0)) as usize;
        let train_len = self.samples.len() - val_len;
        let val = self.samples.split_off(train_len);
        (Self { samples: self.samples }, Self { samples: val })
    }
}

#[cfg(test)]
mod tests {
    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn sample(tag: f32) -> Sample {
        let mut features = [0.0; clonebot_schema::FEATURE_LEN];
        features[0] = tag;
        Sample {
            features,
            actions: [0.0; clonebot_schema::ACTION_LEN],
        }
    }

    #[test]
    fn test_split_is_disjoint_and_sized_by_fraction() {
        let dataset = Dataset::from_samples((0..100).map(|i| sample(i as f32)).collect());
        let mut rng = Pcg64Mcg::new(0x1234);
        let (train, val) = dataset.split(0.2, &mut rng);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);

        let mut tags: Vec<i64> = train
            .samples()
            .iter()
            .chain(val.samples())
            .map(|s| s.features[0] as i64)
            .collect();
        tags.sort_unstable();
        assert_eq!(tags, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_zero_fraction_keeps_everything_in_train() {
        let dataset = Dataset::from_samples((0..10).map(|i| sample(i as f32)).collect());
        let mut rng = Pcg64Mcg::new(1);
        let (train, val) = dataset.split(0.0, &mut rng);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_load_files_counts_missing_files_as_skips() {
        let paths = vec![PathBuf::from("/nonexistent-dir-for-test/missing.json")];
        let (dataset, report) = Dataset::load_files(&paths, &EncoderConfig::default());
        assert!(dataset.is_empty());
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.files_loaded, 0);
    }
}
