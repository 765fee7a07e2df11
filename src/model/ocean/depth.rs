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

//! Selection of the ocean depth range over which
//! temperature is averaged for each sector.

use super::sectors::Sector;
use crate::{
    constants::{DEEP_BAND_HALF_WIDTH, DEFAULT_HALF_WIDTH, WIDE_BAND_HALF_WIDTH},
    errors::{OceanError, SectorError},
    Float,
};
use float_cmp::approx_eq;
use log::debug;
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Vertical slab between two depths (positive downwards).
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct DepthBand {
    pub top: Float,
    pub bottom: Float,
}

impl DepthBand {
    pub fn new(top: Float, bottom: Float) -> Result<Self, OceanError> {
        if !top.is_finite() || !bottom.is_finite() {
            return Err(OceanError::InvalidDepthBand("band limits must be finite"));
        }

        if bottom < top || approx_eq!(Float, top, bottom) {
            return Err(OceanError::InvalidDepthBand(
                "band bottom must be deeper than its top",
            ));
        }

        Ok(DepthBand { top, bottom })
    }

    fn centred(depth: Float, half_width: Float) -> Result<Self, OceanError> {
        DepthBand::new(depth - half_width, depth + half_width)
    }

    pub fn thickness(&self) -> Float {
        self.bottom - self.top
    }
}

/// How the centre of the depth band is chosen.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepthSelection {
    /// Centre at shelf base depth of each sector.
    ShelfBase,

    /// Centre at the same depth for every sector.
    Fixed(Float),
}

impl Default for DepthSelection {
    fn default() -> Self {
        DepthSelection::ShelfBase
    }
}

/// Shelf base depths (m) of every base sector.
pub fn levermann_shelf_depths() -> FxHashMap<Sector, Float> {
    let mut depths = FxHashMap::default();

    depths.insert(Sector::Eais, 369.0);
    depths.insert(Sector::Wedd, 420.0);
    depths.insert(Sector::Amun, 305.0);
    depths.insert(Sector::Ross, 312.0);
    depths.insert(Sector::Apen, 420.0);

    depths
}

#[derive(Clone, PartialEq, Debug)]
pub struct DepthBandSelector {
    selection: DepthSelection,
    half_width: Float,
    shelf_depths: FxHashMap<Sector, Float>,
}

impl Default for DepthBandSelector {
    fn default() -> Self {
        DepthBandSelector {
            selection: DepthSelection::ShelfBase,
            half_width: DEFAULT_HALF_WIDTH,
            shelf_depths: levermann_shelf_depths(),
        }
    }
}

impl DepthBandSelector {
    pub fn new(
        selection: DepthSelection,
        half_width: Float,
        shelf_depths: FxHashMap<Sector, Float>,
    ) -> Self {
        DepthBandSelector {
            selection,
            half_width,
            shelf_depths,
        }
    }

    /// Returns the depth band used for the sector.
    ///
    /// With shelf base selection the sector must be present
    /// in the shelf depth table (`anta` is not by default).
    pub fn band(&self, sector: Sector) -> Result<DepthBand, OceanError> {
        let band = match self.selection {
            DepthSelection::ShelfBase => {
                let depth = self
                    .shelf_depths
                    .get(&sector)
                    .ok_or_else(|| SectorError::UnknownSector(sector.to_string()))?;

                DepthBand::centred(*depth, self.half_width)?
            }
            DepthSelection::Fixed(depth) => {
                let half_width = if approx_eq!(Float, depth, 900.0) {
                    DEEP_BAND_HALF_WIDTH
                } else if approx_eq!(Float, depth, 550.0) {
                    WIDE_BAND_HALF_WIDTH
                } else {
                    self.half_width
                };

                DepthBand::centred(depth, half_width)?
            }
        };

        debug!(
            "Depth band for sector {}: {:.1}-{:.1} m",
            sector, band.top, band.bottom
        );

        Ok(band)
    }
}
