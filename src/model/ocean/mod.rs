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

//! Module responsible for storing ocean model data
//! and reducing it to sector mean temperatures.

pub mod annual;
pub mod bisection;
pub mod calendar;
pub mod coordinates;
pub mod depth;
pub mod reduction;
pub mod sectors;

use self::coordinates::HorizontalCoords;
use crate::{errors::OceanError, Float};
use ndarray::{Array2, Array4, ArrayView1, ArrayView2, ArrayView4};

/// Ocean variable on model levels with axes
/// `(time, level, row, column)`.
///
/// Every time step is labelled with its year,
/// non-finite values are treated as missing data (land).
#[derive(Clone, PartialEq, Debug)]
pub struct OceanField {
    data: Array4<Float>,
    years: Vec<i32>,
    coords: HorizontalCoords,
}

impl OceanField {
    pub fn new(
        data: Array4<Float>,
        years: Vec<i32>,
        coords: HorizontalCoords,
    ) -> Result<Self, OceanError> {
        let (times, _, rows, columns) = data.dim();

        if years.len() != times {
            return Err(OceanError::ShapeMismatch(
                "number of year labels differs from length of time axis",
            ));
        }

        if coords.shape() != (rows, columns) {
            return Err(OceanError::ShapeMismatch(
                "coordinates do not match horizontal shape of the field",
            ));
        }

        Ok(OceanField {
            data,
            years,
            coords,
        })
    }

    pub fn data(&self) -> ArrayView4<Float> {
        self.data.view()
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn coords(&self) -> &HorizontalCoords {
        &self.coords
    }

    pub fn horizontal_shape(&self) -> (usize, usize) {
        self.coords.shape()
    }

    pub fn levels(&self) -> usize {
        self.data.dim().1
    }
}

/// Horizontal area of ocean grid cells, used as weights.
///
/// Missing (non-finite) and negative areas are stored as zero weight.
#[derive(Clone, PartialEq, Debug)]
pub struct CellArea {
    weights: Array2<Float>,
}

impl CellArea {
    pub fn new(area: Array2<Float>) -> Self {
        let weights = area.mapv(|a| if a.is_finite() && a > 0.0 { a } else { 0.0 });

        CellArea { weights }
    }

    pub fn weights(&self) -> ArrayView2<Float> {
        self.weights.view()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.weights.dim()
    }
}

/// Upper and lower depth bounds of ocean model levels.
///
/// Levels are ordered from the surface downwards,
/// do not overlap and have positive thickness.
#[derive(Clone, PartialEq, Debug)]
pub struct LevelBounds {
    tops: Vec<Float>,
    bottoms: Vec<Float>,
}

impl LevelBounds {
    pub fn new(bounds: &[(Float, Float)]) -> Result<Self, OceanError> {
        if bounds.is_empty() {
            return Err(OceanError::InvalidLevelBounds("there are no levels"));
        }

        for (i, &(top, bottom)) in bounds.iter().enumerate() {
            if !top.is_finite() || !bottom.is_finite() {
                return Err(OceanError::InvalidLevelBounds("bounds must be finite"));
            }

            if bottom <= top {
                return Err(OceanError::InvalidLevelBounds(
                    "level bottom must be deeper than its top",
                ));
            }

            if i > 0 && top < bounds[i - 1].1 {
                return Err(OceanError::InvalidLevelBounds(
                    "levels overlap or are not ordered by depth",
                ));
            }
        }

        Ok(LevelBounds {
            tops: bounds.iter().map(|b| b.0).collect(),
            bottoms: bounds.iter().map(|b| b.1).collect(),
        })
    }

    /// Constructs bounds from `(level, 2)` array,
    /// as stored in `lev_bnds` CMIP6 variable.
    pub fn from_array(bounds: ArrayView2<Float>) -> Result<Self, OceanError> {
        if bounds.ncols() != 2 {
            return Err(OceanError::ShapeMismatch(
                "level bounds must have exactly two columns",
            ));
        }

        let pairs: Vec<(Float, Float)> = bounds.rows().into_iter().map(|r| (r[0], r[1])).collect();

        LevelBounds::new(&pairs)
    }

    pub fn len(&self) -> usize {
        self.tops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tops.is_empty()
    }

    pub fn tops(&self) -> ArrayView1<Float> {
        ArrayView1::from(self.tops.as_slice())
    }

    pub fn bottoms(&self) -> ArrayView1<Float> {
        ArrayView1::from(self.bottoms.as_slice())
    }

    pub(crate) fn tops_slice(&self) -> &[Float] {
        &self.tops
    }

    pub(crate) fn bottoms_slice(&self) -> &[Float] {
        &self.bottoms
    }
}
