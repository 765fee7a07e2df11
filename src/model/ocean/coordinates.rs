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

//! Horizontal coordinates of the ocean grid and
//! detection of the naming convention used for them.

use crate::{
    errors::{OceanError, SectorError},
    Float,
};
use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rustc_hash::FxHashMap;

/// Naming conventions of latitude and longitude
/// coordinates found in CMIP6 output.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CoordinateNaming {
    /// `latitude` and `longitude`, used on curvilinear ocean grids.
    Long,

    /// `lat` and `lon`, used on regular grids.
    Short,
}

impl CoordinateNaming {
    /// Selects the naming scheme by checking which coordinate
    /// names are present. When both schemes are complete
    /// the long one takes precedence.
    pub fn probe<S: AsRef<str>>(available: &[S]) -> Result<Self, SectorError> {
        let has = |name: &str| available.iter().any(|n| n.as_ref() == name);

        for naming in [CoordinateNaming::Long, CoordinateNaming::Short] {
            if has(naming.latitude()) && has(naming.longitude()) {
                debug!("Using {:?} coordinate naming", naming);
                return Ok(naming);
            }
        }

        let names: Vec<&str> = available.iter().map(AsRef::as_ref).collect();
        Err(SectorError::CoordinateNaming(names.join(", ")))
    }

    pub fn latitude(&self) -> &'static str {
        match self {
            CoordinateNaming::Long => "latitude",
            CoordinateNaming::Short => "lat",
        }
    }

    pub fn longitude(&self) -> &'static str {
        match self {
            CoordinateNaming::Long => "longitude",
            CoordinateNaming::Short => "lon",
        }
    }
}

/// Latitude and longitude of every horizontal gridpoint.
///
/// Longitudes are stored in the `[0, 360)` convention
/// used by sector definitions.
#[derive(Clone, PartialEq, Debug)]
pub struct HorizontalCoords {
    lat: Array2<Float>,
    lon: Array2<Float>,
}

impl HorizontalCoords {
    pub fn new(lat: Array2<Float>, lon: Array2<Float>) -> Result<Self, OceanError> {
        if lat.dim() != lon.dim() {
            return Err(OceanError::ShapeMismatch(
                "latitude and longitude must have the same shape",
            ));
        }

        let lon = lon.mapv(wrap_longitude);

        Ok(HorizontalCoords { lat, lon })
    }

    /// Constructs coordinates of a regular grid from its axes,
    /// rows follow latitude and columns follow longitude.
    pub fn from_axes(lat: ArrayView1<Float>, lon: ArrayView1<Float>) -> Self {
        let lat_2d = Array2::from_shape_fn((lat.len(), lon.len()), |(j, _)| lat[j]);
        let lon_2d = Array2::from_shape_fn((lat.len(), lon.len()), |(_, i)| wrap_longitude(lon[i]));

        HorizontalCoords {
            lat: lat_2d,
            lon: lon_2d,
        }
    }

    /// Picks latitude and longitude out of named coordinate
    /// arrays after probing which naming scheme they use.
    pub fn from_named(coords: &FxHashMap<String, Array2<Float>>) -> Result<Self, OceanError> {
        let names: Vec<&str> = coords.keys().map(String::as_str).collect();
        let naming = CoordinateNaming::probe(&names)?;

        // probe guarantees both names are present
        let lat = coords[naming.latitude()].clone();
        let lon = coords[naming.longitude()].clone();

        HorizontalCoords::new(lat, lon)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.lat.dim()
    }

    pub fn lat(&self) -> ArrayView2<Float> {
        self.lat.view()
    }

    pub fn lon(&self) -> ArrayView2<Float> {
        self.lon.view()
    }
}

/// Converts longitude from any convention
/// to a value in `[0, 360)`.
fn wrap_longitude(lon: Float) -> Float {
    if lon.is_finite() {
        lon.rem_euclid(360.0)
    } else {
        lon
    }
}
