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

//! Module with definitions of Antarctic ocean sectors
//! (after Levermann et al. 2020) and methods to select
//! them on the ocean grid.
//!
//! Each sector is a union of lat-lon rectangles. Sectors
//! crossing the 0/360 meridian (eais) or having an irregular
//! coastline (apen) are defined with two rectangles.

use super::coordinates::HorizontalCoords;
use crate::{errors::SectorError, Float};
use log::{debug, warn};
use ndarray::{Array2, Zip};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// Closed set of Antarctic sectors.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    /// East Antarctic Ice Sheet
    Eais,
    /// Weddell Sea
    Wedd,
    /// Amundsen Sea
    Amun,
    /// Ross Sea
    Ross,
    /// Antarctic Peninsula
    Apen,
    /// Synthetic union of all other sectors
    Anta,
}

impl Sector {
    /// Sectors which have their own geographic definition.
    pub const BASE: [Sector; 5] = [
        Sector::Eais,
        Sector::Wedd,
        Sector::Amun,
        Sector::Ross,
        Sector::Apen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Sector::Eais => "eais",
            Sector::Wedd => "wedd",
            Sector::Amun => "amun",
            Sector::Ross => "ross",
            Sector::Apen => "apen",
            Sector::Anta => "anta",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sector {
    type Err = SectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eais" => Ok(Sector::Eais),
            "wedd" => Ok(Sector::Wedd),
            "amun" => Ok(Sector::Amun),
            "ross" => Ok(Sector::Ross),
            "apen" => Ok(Sector::Apen),
            "anta" => Ok(Sector::Anta),
            _ => Err(SectorError::UnknownSector(s.to_string())),
        }
    }
}

/// Lat-lon rectangle with open (strict) bounds.
///
/// Missing bound means that the rectangle is unbounded
/// in that direction.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Deserialize)]
pub struct Rectangle {
    #[serde(default)]
    pub lat_min: Option<Float>,
    #[serde(default)]
    pub lat_max: Option<Float>,
    #[serde(default)]
    pub lon_min: Option<Float>,
    #[serde(default)]
    pub lon_max: Option<Float>,
}

impl Rectangle {
    pub const fn new(
        lat_min: Option<Float>,
        lat_max: Option<Float>,
        lon_min: Option<Float>,
        lon_max: Option<Float>,
    ) -> Self {
        Rectangle {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    pub fn contains(&self, lat: Float, lon: Float) -> bool {
        if !lat.is_finite() || !lon.is_finite() {
            return false;
        }

        self.lat_min.map_or(true, |b| lat > b)
            && self.lat_max.map_or(true, |b| lat < b)
            && self.lon_min.map_or(true, |b| lon > b)
            && self.lon_max.map_or(true, |b| lon < b)
    }

    fn is_degenerate(&self) -> bool {
        let empty = |min: Option<Float>, max: Option<Float>| match (min, max) {
            (Some(min), Some(max)) => min >= max,
            _ => false,
        };

        empty(self.lat_min, self.lat_max) || empty(self.lon_min, self.lon_max)
    }
}

/// Immutable table of sector definitions.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(transparent)]
pub struct SectorTable {
    definitions: FxHashMap<Sector, Vec<Rectangle>>,
}

impl Default for SectorTable {
    fn default() -> Self {
        SectorTable::levermann()
    }
}

impl SectorTable {
    /// Sector definitions used by Levermann et al. (2020),
    /// longitudes in degrees east `[0, 360)`.
    pub fn levermann() -> Self {
        let mut definitions = FxHashMap::default();

        definitions.insert(
            Sector::Eais,
            vec![
                Rectangle::new(Some(-76.0), Some(-65.0), None, Some(173.0)),
                Rectangle::new(Some(-76.0), Some(-65.0), Some(350.0), None),
            ],
        );
        definitions.insert(
            Sector::Wedd,
            vec![Rectangle::new(None, Some(-72.0), Some(295.0), Some(350.0))],
        );
        definitions.insert(
            Sector::Amun,
            vec![Rectangle::new(None, Some(-70.0), Some(210.0), Some(295.0))],
        );
        definitions.insert(
            Sector::Ross,
            vec![Rectangle::new(None, Some(-76.0), Some(150.0), Some(210.0))],
        );
        definitions.insert(
            Sector::Apen,
            vec![
                Rectangle::new(Some(-70.0), Some(-65.0), Some(294.0), Some(310.0)),
                Rectangle::new(Some(-75.0), Some(-70.0), Some(285.0), Some(295.0)),
            ],
        );

        SectorTable { definitions }
    }

    /// Rectangles defining the sector. The `anta` union
    /// has no rectangles of its own.
    pub fn rectangles(&self, sector: Sector) -> Result<&[Rectangle], SectorError> {
        self.definitions
            .get(&sector)
            .map(Vec::as_slice)
            .ok_or_else(|| SectorError::UnknownSector(sector.to_string()))
    }

    /// Checks that every rectangle can contain a point.
    pub fn is_consistent(&self) -> bool {
        self.definitions
            .values()
            .all(|rects| !rects.is_empty() && rects.iter().all(|r| !r.is_degenerate()))
    }

    /// Computes mask of gridpoints belonging to the sector.
    ///
    /// The `anta` mask is the union of all base sector masks,
    /// points on shared boundaries are not deduplicated.
    pub fn compute(
        &self,
        coords: &HorizontalCoords,
        sector: Sector,
    ) -> Result<Array2<bool>, SectorError> {
        if sector == Sector::Anta && !self.definitions.contains_key(&Sector::Anta) {
            let mut union = Array2::from_elem(coords.shape(), false);

            for base in Sector::BASE {
                let mask = self.compute(coords, base)?;
                Zip::from(&mut union).and(&mask).for_each(|u, &m| *u |= m);
            }

            return Ok(union);
        }

        let rectangles = self.rectangles(sector)?;

        let mask = Zip::from(coords.lat())
            .and(coords.lon())
            .map_collect(|&lat, &lon| rectangles.iter().any(|r| r.contains(lat, lon)));

        Ok(mask)
    }
}

/// Masks of requested sectors computed once
/// for one grid and reused afterwards.
#[derive(Clone, PartialEq, Debug)]
pub struct SectorMasks {
    masks: FxHashMap<Sector, Array2<bool>>,
}

impl SectorMasks {
    pub fn compute(
        table: &SectorTable,
        coords: &HorizontalCoords,
        sectors: &[Sector],
    ) -> Result<Self, SectorError> {
        let mut masks = FxHashMap::default();

        // base sectors first so that the union can reuse them
        let needs_union = sectors.contains(&Sector::Anta)
            && !table.definitions.contains_key(&Sector::Anta);

        for &sector in Sector::BASE.iter().filter(|s| needs_union || sectors.contains(*s)) {
            let mask = table.compute(coords, sector)?;
            log_selection(sector, &mask);
            masks.insert(sector, mask);
        }

        if sectors.contains(&Sector::Anta) {
            let union = if needs_union {
                let mut union = Array2::from_elem(coords.shape(), false);
                for base in Sector::BASE {
                    Zip::from(&mut union)
                        .and(&masks[&base])
                        .for_each(|u, &m| *u |= m);
                }
                union
            } else {
                table.compute(coords, Sector::Anta)?
            };

            log_selection(Sector::Anta, &union);
            masks.insert(Sector::Anta, union);
        }

        Ok(SectorMasks { masks })
    }

    pub fn get(&self, sector: Sector) -> Result<&Array2<bool>, SectorError> {
        self.masks
            .get(&sector)
            .ok_or_else(|| SectorError::UnknownSector(sector.to_string()))
    }
}

fn log_selection(sector: Sector, mask: &Array2<bool>) {
    let selected = mask.iter().filter(|&&m| m).count();

    if selected == 0 {
        warn!("Sector {} does not contain any gridpoint", sector);
    } else {
        debug!("Sector {} contains {} gridpoints", sector, selected);
    }
}

#[cfg(test)]
mod tests {
    use super::{Rectangle, Sector, SectorMasks, SectorTable};
    use crate::{errors::SectorError, model::ocean::coordinates::HorizontalCoords};
    use ndarray::{array, Array1, Zip};

    fn test_grid() -> HorizontalCoords {
        HorizontalCoords::from_axes(
            array![-80.0, -77.0, -70.0, -60.0].view(),
            array![0.0, 100.0, 200.0, 300.0].view(),
        )
    }

    fn dense_grid() -> HorizontalCoords {
        let lat = Array1::linspace(-89.5, -60.5, 59);
        let lon = Array1::linspace(0.5, 359.5, 360);
        HorizontalCoords::from_axes(lat.view(), lon.view())
    }

    #[test]
    fn sector_names() {
        for sector in Sector::BASE.iter().chain([Sector::Anta].iter()) {
            assert_eq!(sector.name().parse::<Sector>().unwrap(), *sector);
        }

        assert_eq!(
            "weddell".parse::<Sector>(),
            Err(SectorError::UnknownSector("weddell".to_string()))
        );
    }

    #[test]
    fn ross_selection() {
        let coords = test_grid();
        let mask = SectorTable::levermann().compute(&coords, Sector::Ross).unwrap();

        assert!(mask[[0, 2]]);

        // every selected point must lie inside lat < -76, 150 < lon < 210
        Zip::from(&mask)
            .and(coords.lat())
            .and(coords.lon())
            .for_each(|&m, &lat, &lon| {
                assert_eq!(m, lat < -76.0 && lon > 150.0 && lon < 210.0);
            });

        assert_eq!(mask.iter().filter(|&&m| m).count(), 2);
    }

    #[test]
    fn masks_are_idempotent() {
        let coords = dense_grid();
        let table = SectorTable::levermann();

        for sector in Sector::BASE {
            let first = table.compute(&coords, sector).unwrap();
            let second = table.compute(&coords, sector).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn union_equals_or_of_sectors() {
        let coords = dense_grid();
        let table = SectorTable::levermann();

        let union = table.compute(&coords, Sector::Anta).unwrap();

        let mut expected = ndarray::Array2::from_elem(coords.shape(), false);
        for sector in Sector::BASE {
            let mask = table.compute(&coords, sector).unwrap();
            Zip::from(&mut expected).and(&mask).for_each(|e, &m| *e = *e || m);
        }

        assert_eq!(union, expected);

        let cached = SectorMasks::compute(&table, &coords, &[Sector::Anta]).unwrap();
        assert_eq!(cached.get(Sector::Anta).unwrap(), &expected);
    }

    #[test]
    fn eais_crosses_meridian() {
        let coords = HorizontalCoords::from_axes(
            array![-70.0].view(),
            array![-5.0, 5.0, 180.0, 345.0].view(),
        );
        let mask = SectorTable::levermann().compute(&coords, Sector::Eais).unwrap();

        assert_eq!(mask.row(0).to_vec(), vec![true, true, false, false]);
    }

    #[test]
    fn masks_cache_only_requested() {
        let coords = test_grid();
        let masks =
            SectorMasks::compute(&SectorTable::levermann(), &coords, &[Sector::Ross]).unwrap();

        assert!(masks.get(Sector::Ross).is_ok());
        assert!(masks.get(Sector::Wedd).is_err());
    }

    #[test]
    fn rectangle_bounds_are_strict() {
        let rect = Rectangle::new(Some(-76.0), Some(-65.0), None, Some(173.0));

        assert!(rect.contains(-70.0, 0.0));
        assert!(!rect.contains(-76.0, 10.0));
        assert!(!rect.contains(-70.0, 173.0));
        assert!(!rect.contains(f64::NAN, 10.0));
    }
}
