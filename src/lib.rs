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

//! Shelfmelt is the coupling layer between CMIP6 ocean model output
//! and the BISICLES ice-sheet model.
//!
//! It computes volume-weighted mean ocean temperature around the ice-shelf
//! base in each Antarctic (Levermann) sector, converts it into a quadratic
//! basal melt anomaly and maps the anomaly back onto BISICLES sector masks.
//!
//! The numerical core works only on in-memory [`ndarray`] arrays,
//! reading and writing files is provided by the `netcdf` feature.

pub mod constants;
pub mod errors;
pub mod model;

pub type Float = f64;
