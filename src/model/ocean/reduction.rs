/*
Copyright 2023 Shelfmelt Authors

This file is part of Shelfmelt.

Shelfmelt is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Shelfmelt is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Shelfmelt. If not, see https://www.gnu.org/licenses/.
*/

//! Module with weighted reductions of ocean fields:
//! area-weighted mean over a sector and thickness-weighted
//! mean over a depth band.
//!
//! Missing values (non-finite) are skipped together
//! with their weights. When no valid value remains
//! the mean is `NaN`.

use super::{bisection, depth::DepthBand, CellArea, LevelBounds};
use crate::{errors::OceanError, Float};
use log::{debug, warn};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayView4, Zip};

/// Levels covering a depth band together
/// with their clipped thickness.
#[derive(Clone, PartialEq, Debug)]
pub struct LevelWeights {
    /// Index of the shallowest level in the band.
    pub first: usize,

    /// Index of the deepest level in the band (inclusive).
    pub last: usize,

    /// Thickness of levels `first..=last` within the band.
    pub weights: Array1<Float>,
}

/// Computes area-weighted mean of the field over
/// gridpoints selected by the mask.
///
/// Returns array with axes `(time, level)`.
pub fn area_weighted_mean(
    field: ArrayView4<Float>,
    area: &CellArea,
    mask: ArrayView2<bool>,
) -> Result<Array2<Float>, OceanError> {
    let (times, levels, rows, columns) = field.dim();

    if area.shape() != (rows, columns) {
        return Err(OceanError::ShapeMismatch(
            "cell area does not match horizontal shape of the field",
        ));
    }

    if mask.dim() != (rows, columns) {
        return Err(OceanError::ShapeMismatch(
            "sector mask does not match horizontal shape of the field",
        ));
    }

    let weights = area.weights();
    let mut means = Array2::from_elem((times, levels), Float::NAN);

    for ((t, k), mean) in means.indexed_iter_mut() {
        let slab = field.slice(s![t, k, .., ..]);

        let (sum, total_weight) = Zip::from(slab).and(weights).and(mask).fold(
            (0.0, 0.0),
            |(sum, total), &value, &weight, &selected| {
                if selected && value.is_finite() {
                    (sum + weight * value, total + weight)
                } else {
                    (sum, total)
                }
            },
        );

        if total_weight > 0.0 {
            *mean = sum / total_weight;
        }
    }

    Ok(means)
}

/// Finds levels covering the depth band and
/// computes their thickness clipped to the band.
pub fn level_weights(bounds: &LevelBounds, band: DepthBand) -> Result<LevelWeights, OceanError> {
    let last = bisection::nearest_above(bounds.bottoms_slice(), band.bottom)?;
    let first = bisection::nearest_below(bounds.tops_slice(), band.top)?;

    let clip = |bound: Float| bound.min(band.bottom).max(band.top);

    let tops = bounds.tops();
    let bottoms = bounds.bottoms();

    let weights: Array1<Float> = (first..=last)
        .map(|k| clip(bottoms[k]) - clip(tops[k]))
        .collect();

    debug!(
        "Levels {}-{} cover depth band {:.1}-{:.1} m",
        first, last, band.top, band.bottom
    );

    Ok(LevelWeights {
        first,
        last,
        weights,
    })
}

/// Computes thickness-weighted mean of `(time, level)`
/// series over the depth band.
pub fn level_weighted_mean(
    series: ArrayView2<Float>,
    bounds: &LevelBounds,
    band: DepthBand,
) -> Result<Array1<Float>, OceanError> {
    if series.ncols() != bounds.len() {
        return Err(OceanError::ShapeMismatch(
            "number of levels differs from number of level bounds",
        ));
    }

    let level_weights = level_weights(bounds, band)?;
    let slab = series.slice(s![.., level_weights.first..=level_weights.last]);

    let means: Array1<Float> = slab
        .rows()
        .into_iter()
        .map(|levels| weighted_mean(levels, level_weights.weights.view()))
        .collect();

    let missing = means.iter().filter(|m| !m.is_finite()).count();
    if missing > 0 {
        warn!(
            "{} of {} time steps have no valid data in depth band {:.1}-{:.1} m",
            missing,
            means.len(),
            band.top,
            band.bottom
        );
    }

    Ok(means)
}

fn weighted_mean(values: ArrayView1<Float>, weights: ArrayView1<Float>) -> Float {
    let (sum, total_weight) = Zip::from(values)
        .and(weights)
        .fold((0.0, 0.0), |(sum, total), &value, &weight| {
            if value.is_finite() {
                (sum + weight * value, total + weight)
            } else {
                (sum, total)
            }
        });

    if total_weight > 0.0 {
        sum / total_weight
    } else {
        Float::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::{area_weighted_mean, level_weighted_mean, level_weights};
    use crate::{
        errors::{OceanError, SearchError},
        model::ocean::{depth::DepthBand, CellArea, LevelBounds},
    };
    use float_cmp::approx_eq;
    use ndarray::{array, Array1, Array4};

    fn four_levels() -> LevelBounds {
        LevelBounds::new(&[(0.0, 100.0), (100.0, 300.0), (300.0, 500.0), (500.0, 800.0)]).unwrap()
    }

    #[test]
    fn amundsen_band_weights() {
        let band = DepthBand::new(255.0, 355.0).unwrap();
        let lw = level_weights(&four_levels(), band).unwrap();

        assert_eq!(lw.first, 1);
        assert_eq!(lw.last, 2);
        assert_eq!(lw.weights, array![45.0, 55.0]);
    }

    #[test]
    fn weights_sum_to_band_thickness() {
        let bounds = LevelBounds::new(
            &Array1::linspace(0.0, 1000.0, 21)
                .windows(2)
                .into_iter()
                .map(|w| (w[0], w[1]))
                .collect::<Vec<_>>(),
        )
        .unwrap();

        for (top, bottom) in [(0.0, 1000.0), (255.0, 355.0), (12.5, 13.0), (475.0, 975.0)] {
            let lw = level_weights(&bounds, DepthBand::new(top, bottom).unwrap()).unwrap();

            assert!(lw.weights.iter().all(|&w| w >= 0.0));
            assert!(approx_eq!(f64, lw.weights.sum(), bottom - top, epsilon = 1e-9));
        }
    }

    #[test]
    fn band_below_deepest_level() {
        let band = DepthBand::new(750.0, 850.0).unwrap();

        assert!(matches!(
            level_weights(&four_levels(), band),
            Err(OceanError::Search(SearchError::DepthBoundsExhausted { .. }))
        ));
    }

    #[test]
    fn masked_area_mean() {
        // one time step, one level, 2x2 grid
        let field = Array4::from_shape_vec((1, 1, 2, 2), vec![1.0, 2.0, 3.0, f64::NAN]).unwrap();
        let area = CellArea::new(array![[1.0, 3.0], [100.0, 5.0]]);
        let mask = array![[true, true], [false, true]];

        let mean = area_weighted_mean(field.view(), &area, mask.view()).unwrap();

        // unselected cell is excluded even though its area is large,
        // missing value is skipped with its weight
        assert!(approx_eq!(f64, mean[[0, 0]], (1.0 + 6.0) / 4.0, ulps = 2));
    }

    #[test]
    fn empty_selection_is_nan() {
        let field = Array4::from_elem((2, 1, 1, 2), 1.0);
        let area = CellArea::new(array![[1.0, 1.0]]);
        let mask = array![[false, false]];

        let mean = area_weighted_mean(field.view(), &area, mask.view()).unwrap();
        assert!(mean.iter().all(|m| m.is_nan()));
    }

    #[test]
    fn depth_mean_with_partial_cells() {
        // two time steps, four levels
        let series = array![[0.0, 1.0, 2.0, 3.0], [0.0, 1.0, f64::NAN, 3.0]];
        let band = DepthBand::new(255.0, 355.0).unwrap();

        let means = level_weighted_mean(series.view(), &four_levels(), band).unwrap();

        assert!(approx_eq!(f64, means[0], (45.0 * 1.0 + 55.0 * 2.0) / 100.0, ulps = 2));
        assert!(approx_eq!(f64, means[1], 1.0, ulps = 2));
    }

    #[test]
    fn level_count_mismatch() {
        let series = array![[0.0, 1.0]];
        let band = DepthBand::new(10.0, 20.0).unwrap();

        assert!(matches!(
            level_weighted_mean(series.view(), &four_levels(), band),
            Err(OceanError::ShapeMismatch(_))
        ));
    }
}
