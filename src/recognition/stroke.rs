use serde::{Deserialize, Serialize};

/// One timestamped pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeSample {
    /// Milliseconds on any monotonically increasing clock.
    pub timestamp_ms: f64,
    pub x: f64,
    pub y: f64,
}

impl StrokeSample {
    pub fn new(timestamp_ms: f64, x: f64, y: f64) -> Self {
        Self { timestamp_ms, x, y }
    }
}

impl From<(f64, f64, f64)> for StrokeSample {
    fn from((timestamp_ms, x, y): (f64, f64, f64)) -> Self {
        Self::new(timestamp_ms, x, y)
    }
}

/// Samples of one pointer-down to pointer-up motion, in capture order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stroke {
    samples: Vec<StrokeSample>,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[StrokeSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&StrokeSample> {
        self.samples.last()
    }

    pub(crate) fn push(&mut self, sample: StrokeSample) {
        self.samples.push(sample);
    }
}

impl FromIterator<StrokeSample> for Stroke {
    fn from_iter<I: IntoIterator<Item = StrokeSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Every stroke recorded for the current recognition attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    strokes: Vec<Stroke>,
}

impl Drawing {
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Total number of samples across all strokes.
    pub fn sample_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// All samples in stroke order, then capture order within each stroke.
    pub fn flatten(&self) -> Vec<StrokeSample> {
        let mut out = Vec::with_capacity(self.sample_count());
        for stroke in &self.strokes {
            out.extend_from_slice(stroke.samples());
        }
        out
    }

    pub(crate) fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub(crate) fn clear(&mut self) {
        self.strokes.clear();
    }
}

impl FromIterator<Stroke> for Drawing {
    fn from_iter<I: IntoIterator<Item = Stroke>>(iter: I) -> Self {
        Self {
            strokes: iter.into_iter().collect(),
        }
    }
}

/// Model-ready feature triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    /// Seconds since the previous point.
    pub dt: f32,
    pub nx: f32,
    pub ny: f32,
}
