//! Labeled datasets in the MNIST CSV layout: one row per example, the label
//! first, then the pixel columns.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One labeled example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Fixed-length integer feature vector.
    pub features: Vec<i32>,
    /// Class label.
    pub label: i32,
}

/// An ordered, immutable collection of samples sharing one feature length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Build a dataset from samples.
    ///
    /// # Errors
    ///
    /// Fails on an empty sample list or mismatched feature lengths.
    pub fn new(samples: Vec<Sample>) -> EngineResult<Self> {
        let Some(first) = samples.first() else {
            return Err(EngineError::Config("dataset is empty".into()));
        };
        let width = first.features.len();
        if samples.iter().any(|s| s.features.len() != width) {
            return Err(EngineError::Config(
                "dataset rows have differing feature lengths".into(),
            ));
        }
        Ok(Self { samples })
    }

    /// Parse a label-first CSV file, one example per line.
    ///
    /// # Errors
    ///
    /// Fails on io errors, unparseable fields or an empty file.
    pub fn from_csv(path: &Path) -> EngineResult<Self> {
        let file = File::open(path)?;
        let mut samples = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(',');
            let label = parse_field(fields.next(), path)?;
            let features = fields
                .map(|f| parse_field(Some(f), path))
                .collect::<EngineResult<Vec<i32>>>()?;
            samples.push(Sample { features, label });
        }
        Self::new(samples)
    }

    /// Feature vector length shared by every sample.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        self.samples[0].features.len()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset holds no samples. Construction forbids this.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The samples in order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Keep only the first `limit` samples. No-op when `limit` is larger
    /// than the dataset.
    pub fn truncate(&mut self, limit: usize) {
        if limit > 0 {
            self.samples.truncate(limit);
        }
    }

    /// Halve each square image side by averaging 2x2 pixel blocks.
    ///
    /// # Errors
    ///
    /// Fails when the feature length is not a square of an even side.
    pub fn downsample(&mut self) -> EngineResult<()> {
        let width = side_length(self.feature_len())?;
        if width % 2 != 0 {
            return Err(EngineError::Config(format!(
                "cannot halve an image of odd side {width}"
            )));
        }
        let half = width / 2;
        for sample in &mut self.samples {
            let mut smaller = Vec::with_capacity(half * half);
            for row in 0..half {
                for column in 0..half {
                    let base = 2 * row * width + 2 * column;
                    let sum = sample.features[base]
                        + sample.features[base + 1]
                        + sample.features[base + width]
                        + sample.features[base + width + 1];
                    smaller.push(sum / 4);
                }
            }
            sample.features = smaller;
        }
        Ok(())
    }

    /// Map every feature to 1 when above `threshold`, else 0.
    pub fn binarize(&mut self, threshold: i32) {
        for sample in &mut self.samples {
            for feature in &mut sample.features {
                *feature = i32::from(*feature > threshold);
            }
        }
    }
}

fn parse_field(field: Option<&str>, path: &Path) -> EngineResult<i32> {
    field
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| EngineError::Config(format!("malformed CSV field in {}", path.display())))
}

fn side_length(area: usize) -> EngineResult<usize> {
    let mut side = 1;
    while side * side < area {
        side += 1;
    }
    if side * side == area {
        Ok(side)
    } else {
        Err(EngineError::Config(format!(
            "feature length {area} is not a square image"
        )))
    }
}
