//! Centroid Estimator.
//!
//! Reduces the column energy vector to a horizontal position:
//!
//! ```text
//! position = (Σ energy[i] * i / Σ energy[i]) / (N - 1)
//! ```
//!
//! The position is only meaningful when the model judges a target present,
//! so it falls back to the midpoint when `validity <= 0.5` or when the scene
//! carries no energy. There is no hysteresis across cycles.

use tofsight_types::{DEFAULT_POSITION, GRID_SIDE, VALIDITY_THRESHOLD};

/// Energy sums below this are treated as an empty scene.
pub const MIN_ENERGY_SUM: f32 = 1e-6;

/// Validity-gated centroid of `columns`, normalized to `[0, 1]`.
pub fn estimate_position(columns: &[f32; GRID_SIDE], validity: f32) -> f32 {
    if validity <= VALIDITY_THRESHOLD {
        return DEFAULT_POSITION;
    }

    let (sum, weighted) = columns
        .iter()
        .enumerate()
        .fold((0.0f32, 0.0f32), |(sum, weighted), (i, &e)| {
            (sum + e, weighted + e * i as f32)
        });

    if sum < MIN_ENERGY_SUM {
        return DEFAULT_POSITION;
    }
    (weighted / sum) / (GRID_SIDE - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(col: usize) -> [f32; GRID_SIDE] {
        let mut c = [0.0; GRID_SIDE];
        c[col] = 8.0;
        c
    }

    #[test]
    fn low_validity_always_centers() {
        for validity in [0.0, 0.25, 0.5] {
            assert_eq!(estimate_position(&only(0), validity), 0.5);
            assert_eq!(estimate_position(&only(7), validity), 0.5);
        }
    }

    #[test]
    fn column_zero_is_left_edge() {
        assert!(estimate_position(&only(0), 0.9).abs() < 1e-6);
    }

    #[test]
    fn column_seven_is_right_edge() {
        assert!((estimate_position(&only(7), 0.9) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_energy_is_centered() {
        assert!((estimate_position(&[1.0; GRID_SIDE], 0.9) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn column_three_is_three_sevenths() {
        assert!((estimate_position(&only(3), 0.99) - 3.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn negligible_energy_centers() {
        assert_eq!(estimate_position(&[0.0; GRID_SIDE], 1.0), 0.5);
        assert_eq!(estimate_position(&[1e-8; GRID_SIDE], 1.0), 0.5);
    }

    #[test]
    fn weighted_mean_between_columns() {
        let mut c = [0.0; GRID_SIDE];
        c[2] = 1.0;
        c[6] = 3.0;
        // (2*1 + 6*3) / 4 = 5 → 5/7
        assert!((estimate_position(&c, 0.8) - 5.0 / 7.0).abs() < 1e-6);
    }
}
