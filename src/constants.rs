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

//! Module containing constants used by the model.
//!
//! Physical parameters of the quadratic basal melt
//! parameterisation follow Favier et al. (2019).

use crate::Float;

///Ice density (kg m^-3)
pub const RHO_I: Float = 917.0;

///Sea water density (kg m^-3)
pub const RHO_SW: Float = 1028.0;

/// Specific heat capacity of ocean mixed layer (J kg^-1 K^-1)
pub const C_PO: Float = 3974.0;

///Latent heat of fusion of ice (J kg^-1)
pub const L_I: Float = 3.34e5;

///Freezing temperature of sea water at the shelf base (degC)
pub const T_F: Float = -1.6;

///Scaling of the quadratic melt constant to melt rates in m yr^-1
pub const MELT_SCALE: Float = 1.0e5;

///Absolute melt anomaly above which results are treated as unphysical
pub const MELT_PLAUSIBILITY_BOUND: Float = 100.0;

///Default half-width (m) of the depth band around shelf base
pub const DEFAULT_HALF_WIDTH: Float = 50.0;

///Half-width (m) used for the fixed 900 m depth band (800-1000 m)
pub const DEEP_BAND_HALF_WIDTH: Float = 100.0;

///Half-width (m) used for the fixed 550 m depth band (400-700 m)
pub const WIDE_BAND_HALF_WIDTH: Float = 150.0;
