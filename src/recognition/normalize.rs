//! Stroke feature normalization.
//!
//! Coordinates are rescaled into the drawing's bounding box and timestamps
//! become per-sample deltas in seconds, the layout the recognizer was trained
//! on.

use super::error::RecognitionError;
use super::stroke::{NormalizedPoint, StrokeSample};

const MS_PER_SECOND: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundingBox {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl BoundingBox {
    fn enclosing(samples: &[StrokeSample]) -> Option<Self> {
        let first = samples.first()?;
        let mut bounds = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for sample in &samples[1..] {
            bounds.min_x = bounds.min_x.min(sample.x);
            bounds.max_x = bounds.max_x.max(sample.x);
            bounds.min_y = bounds.min_y.min(sample.y);
            bounds.max_y = bounds.max_y.max(sample.y);
        }
        Some(bounds)
    }

    /// A dot or a straight axis-aligned line collapses one extent to zero;
    /// widen it by one unit so that axis normalizes to 0.
    fn widen_degenerate(mut self) -> Self {
        if self.min_x == self.max_x {
            self.max_x = self.min_x + 1.0;
        }
        if self.min_y == self.max_y {
            self.max_y = self.min_y + 1.0;
        }
        self
    }
}

/// Convert flattened stroke samples into model features.
///
/// The output has one point per input sample, in the same order. The first
/// point always has `dt == 0`.
pub fn normalize(samples: &[StrokeSample]) -> Result<Vec<NormalizedPoint>, RecognitionError> {
    let bounds = BoundingBox::enclosing(samples)
        .ok_or_else(|| RecognitionError::InvalidInput("cannot normalize zero samples".into()))?
        .widen_degenerate();
    let width = bounds.max_x - bounds.min_x;
    let height = bounds.max_y - bounds.min_y;

    let mut previous_ms = samples[0].timestamp_ms;
    let points = samples
        .iter()
        .map(|sample| {
            let point = NormalizedPoint {
                dt: ((sample.timestamp_ms - previous_ms) / MS_PER_SECOND) as f32,
                nx: ((sample.x - bounds.min_x) / width) as f32,
                ny: ((sample.y - bounds.min_y) / height) as f32,
            };
            previous_ms = sample.timestamp_ms;
            point
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(f64, f64, f64)]) -> Vec<StrokeSample> {
        points.iter().copied().map(StrokeSample::from).collect()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn rescales_into_unit_box_with_time_deltas() {
        let input = samples(&[(0.0, 0.0, 0.0), (10.0, 10.0, 0.0), (20.0, 10.0, 10.0)]);
        let out = normalize(&input).unwrap();
        let expected = [(0.0, 0.0, 0.0), (0.01, 1.0, 0.0), (0.01, 1.0, 1.0)];
        assert_eq!(out.len(), expected.len());
        for (point, (dt, nx, ny)) in out.iter().zip(expected) {
            assert!(approx(point.dt, dt), "dt {} != {dt}", point.dt);
            assert!(approx(point.nx, nx));
            assert!(approx(point.ny, ny));
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = normalize(&[]).unwrap_err();
        assert!(matches!(err, RecognitionError::InvalidInput(_)));
    }

    #[test]
    fn single_dot_maps_to_origin() {
        let out = normalize(&samples(&[(42.0, 7.5, -3.0)])).unwrap();
        assert_eq!(
            out,
            vec![NormalizedPoint {
                dt: 0.0,
                nx: 0.0,
                ny: 0.0
            }]
        );
    }

    #[test]
    fn vertical_line_keeps_x_at_zero() {
        let out = normalize(&samples(&[(0.0, 5.0, 0.0), (8.0, 5.0, 4.0), (16.0, 5.0, 8.0)])).unwrap();
        assert!(out.iter().all(|p| p.nx == 0.0));
        assert!(approx(out[1].ny, 0.5));
        assert!(approx(out[2].ny, 1.0));
    }

    #[test]
    fn horizontal_line_keeps_y_at_zero() {
        let out = normalize(&samples(&[(0.0, -2.0, 3.0), (4.0, 2.0, 3.0)])).unwrap();
        assert!(out.iter().all(|p| p.ny == 0.0));
        assert!(approx(out[0].nx, 0.0));
        assert!(approx(out[1].nx, 1.0));
    }

    #[test]
    fn output_stays_within_unit_box_and_touches_extremes() {
        let input = samples(&[
            (100.0, 31.0, 80.0),
            (116.0, 12.0, 95.0),
            (133.0, 48.5, 60.0),
            (150.0, 20.0, 77.0),
            (150.0, 33.0, 101.0),
        ]);
        let out = normalize(&input).unwrap();
        assert_eq!(out.len(), input.len());
        assert_eq!(out[0].dt, 0.0);
        assert!(out.iter().all(|p| (0.0..=1.0).contains(&p.nx)));
        assert!(out.iter().all(|p| (0.0..=1.0).contains(&p.ny)));
        assert!(out.iter().any(|p| p.nx == 0.0 || p.ny == 0.0));
        assert!(out.iter().any(|p| p.nx == 1.0 || p.ny == 1.0));
        assert_eq!(out[4].dt, 0.0);
        assert!(approx(out[1].dt, 0.016));
    }
}
