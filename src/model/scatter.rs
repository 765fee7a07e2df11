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

//! Mapping of sector values onto the ice-sheet
//! model grid using BISICLES sector masks.

use super::{melt::MeltAnomalySeries, ocean::sectors::Sector};
use crate::{errors::ScatterError, Float};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use rayon::prelude::*;

/// Order of sectors in BISICLES mask files
/// (`smask1` to `smask5`).
pub const BISICLES_MASK_ORDER: [Sector; 5] = [
    Sector::Apen,
    Sector::Amun,
    Sector::Ross,
    Sector::Eais,
    Sector::Wedd,
];

/// Ice-sheet grid mask of one sector.
#[derive(Clone, PartialEq, Debug)]
pub struct SpatialMask {
    sector: Sector,
    selected: Array2<bool>,
}

impl SpatialMask {
    /// Constructs the mask from its integer codes,
    /// missing (non-finite) codes are treated as 0.
    pub fn from_codes(sector: Sector, codes: ArrayView2<Float>) -> Result<Self, ScatterError> {
        if let Some(&value) = codes
            .iter()
            .find(|&&c| c.is_finite() && c != 0.0 && c != 1.0)
        {
            return Err(ScatterError::InvalidMaskValue { sector, value });
        }

        let selected = codes.mapv(|c| c == 1.0);

        Ok(SpatialMask { sector, selected })
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn selected(&self) -> ArrayView2<bool> {
        self.selected.view()
    }
}

/// Set of sector masks sharing the same ice-sheet grid.
#[derive(Clone, PartialEq, Debug)]
pub struct SpatialMaskSet {
    x: Array1<Float>,
    y: Array1<Float>,
    masks: Vec<SpatialMask>,
}

impl SpatialMaskSet {
    /// Masks are applied in the given order, grid axes are
    /// `(x, y)` as in BISICLES flattened files.
    ///
    /// Every sector can have at most one mask and masks must not overlap.
    pub fn new(
        x: Array1<Float>,
        y: Array1<Float>,
        masks: Vec<SpatialMask>,
    ) -> Result<Self, ScatterError> {
        if masks.is_empty() {
            return Err(ScatterError::NoMasks);
        }

        if masks.iter().any(|m| m.selected.dim() != (x.len(), y.len())) {
            return Err(ScatterError::ShapeMismatch(
                "mask shape differs from its x and y coordinates",
            ));
        }

        for (i, first) in masks.iter().enumerate() {
            for second in &masks[i + 1..] {
                if first.sector == second.sector {
                    return Err(ScatterError::DuplicateMask(first.sector));
                }

                let cells = Zip::from(&first.selected)
                    .and(&second.selected)
                    .fold(0, |n, &a, &b| if a && b { n + 1 } else { n });

                if cells > 0 {
                    return Err(ScatterError::OverlappingMasks {
                        first: first.sector,
                        second: second.sector,
                        cells,
                    });
                }
            }
        }

        Ok(SpatialMaskSet { x, y, masks })
    }

    pub fn x(&self) -> ArrayView1<Float> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView1<Float> {
        self.y.view()
    }

    pub fn masks(&self) -> &[SpatialMask] {
        &self.masks
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.x.len(), self.y.len())
    }

    /// Background grid with the same value everywhere.
    pub fn uniform_background(&self, value: Float) -> Array2<Float> {
        Array2::from_elem(self.shape(), value)
    }
}

/// Produces a grid where every cell selected by a sector
/// mask takes that sector's value. Cells outside all masks
/// keep the background value.
///
/// Masks of sectors without a value are skipped,
/// so their cells also keep the background value.
pub fn scatter(
    sector_values: &[(Sector, Float)],
    masks: &SpatialMaskSet,
    background: ArrayView2<Float>,
) -> Result<Array2<Float>, ScatterError> {
    if background.dim() != masks.shape() {
        return Err(ScatterError::ShapeMismatch(
            "background grid differs from mask grid",
        ));
    }

    let mut grid = background.to_owned();

    for mask in masks.masks() {
        let value = match sector_values.iter().find(|(s, _)| *s == mask.sector) {
            Some((_, value)) => *value,
            None => continue,
        };

        Zip::from(&mut grid)
            .and(&mask.selected)
            .for_each(|cell, &selected| {
                if selected {
                    *cell = value;
                }
            });
    }

    Ok(grid)
}

/// Scatters every year of the melt table,
/// returned grids are sorted by year.
pub fn scatter_series(
    anomalies: &MeltAnomalySeries,
    masks: &SpatialMaskSet,
    background: ArrayView2<Float>,
) -> Result<Vec<(i32, Array2<Float>)>, ScatterError> {
    let table = anomalies.series();

    for mask in masks.masks() {
        if !table.sectors().contains(&mask.sector) {
            warn!(
                "No melt computed for sector {}, its mask is filled with background",
                mask.sector
            );
        }
    }

    debug!(
        "Mapping {} years of melt anomalies onto {} masks",
        table.years().len(),
        masks.masks().len()
    );

    let mut grids = table
        .years()
        .par_iter()
        .enumerate()
        .map(|(row, &year)| {
            let values: Vec<(Sector, Float)> = table.row(row).collect();
            scatter(&values, masks, background).map(|grid| (year, grid))
        })
        .collect::<Result<Vec<_>, ScatterError>>()?;

    grids.sort_by_key(|(year, _)| *year);

    Ok(grids)
}

#[cfg(test)]
mod tests {
    use super::{scatter, SpatialMask, SpatialMaskSet};
    use crate::{errors::ScatterError, model::ocean::sectors::Sector};
    use ndarray::{array, Array1, Array2};

    fn mask_set() -> SpatialMaskSet {
        let ross = SpatialMask::from_codes(Sector::Ross, array![[1.0, 0.0], [0.0, 0.0]].view()).unwrap();
        let amun = SpatialMask::from_codes(Sector::Amun, array![[0.0, 1.0], [0.0, f64::NAN]].view()).unwrap();

        SpatialMaskSet::new(array![0.0, 1.0], array![0.0, 1.0], vec![ross, amun]).unwrap()
    }

    #[test]
    fn values_land_in_their_masks() {
        let masks = mask_set();
        let background = masks.uniform_background(0.0);

        let grid = scatter(
            &[(Sector::Amun, 2.5), (Sector::Ross, -1.0)],
            &masks,
            background.view(),
        )
        .unwrap();

        assert_eq!(grid, array![[-1.0, 2.5], [0.0, 0.0]]);
    }

    #[test]
    fn background_passes_through() {
        let masks = mask_set();
        let background = array![[7.0, 7.0], [8.0, 9.0]];

        let grid = scatter(&[(Sector::Amun, 1.0), (Sector::Ross, 1.0)], &masks, background.view()).unwrap();

        assert_eq!(grid[[1, 0]], 8.0);
        assert_eq!(grid[[1, 1]], 9.0);
    }

    #[test]
    fn sector_without_value_keeps_background() {
        let masks = mask_set();
        let background = masks.uniform_background(-9.0);

        let grid = scatter(&[(Sector::Ross, 1.0)], &masks, background.view()).unwrap();

        assert_eq!(grid, array![[1.0, -9.0], [-9.0, -9.0]]);
    }

    #[test]
    fn background_shape_is_checked() {
        let masks = mask_set();
        let background = Array2::zeros((3, 2));

        assert!(matches!(
            scatter(&[(Sector::Ross, 1.0)], &masks, background.view()),
            Err(ScatterError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn invalid_masks() {
        assert!(matches!(
            SpatialMask::from_codes(Sector::Eais, array![[2.0]].view()),
            Err(ScatterError::InvalidMaskValue { value, .. }) if value == 2.0
        ));

        let ross = SpatialMask::from_codes(Sector::Ross, array![[1.0, 0.0]].view()).unwrap();
        assert!(SpatialMaskSet::new(Array1::zeros(2), Array1::zeros(1), vec![ross]).is_err());
        assert_eq!(
            SpatialMaskSet::new(Array1::zeros(1), Array1::zeros(1), vec![]),
            Err(ScatterError::NoMasks)
        );
    }

    #[test]
    fn masks_are_disjoint() {
        let ross = SpatialMask::from_codes(Sector::Ross, array![[1.0, 1.0]].view()).unwrap();
        let amun = SpatialMask::from_codes(Sector::Amun, array![[0.0, 1.0]].view()).unwrap();
        let other_ross = SpatialMask::from_codes(Sector::Ross, array![[0.0, 0.0]].view()).unwrap();

        assert_eq!(
            SpatialMaskSet::new(array![0.0], array![0.0, 1.0], vec![ross.clone(), amun]),
            Err(ScatterError::OverlappingMasks {
                first: Sector::Ross,
                second: Sector::Amun,
                cells: 1,
            })
        );
        assert_eq!(
            SpatialMaskSet::new(array![0.0], array![0.0, 1.0], vec![ross, other_ross]),
            Err(ScatterError::DuplicateMask(Sector::Ross))
        );
    }
}
