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

//! Reading of CMIP6 ocean data and BISICLES masks from NetCDF
//! and writing of melt grids back to NetCDF.
//!
//! Only this module knows about files, the rest of the model
//! works on in-memory arrays.

mod reader;
mod writer;

pub use reader::{read_cell_area, read_inputs, read_level_bounds, read_masks, read_ocean_field};
pub use writer::write_grid;

use crate::{errors::InputError, Float};
use netcdf::AttributeValue;

/// Values with magnitude above this are treated as missing
/// (CMIP6 uses `1e20` as fill value).
const MISSING_THRESHOLD: Float = 1.0e19;

fn variable<'f>(file: &'f netcdf::File, name: &str) -> Result<netcdf::Variable<'f>, InputError> {
    file.variable(name)
        .ok_or_else(|| InputError::MissingVariable(name.to_string()))
}

fn dimensions(var: &netcdf::Variable) -> Vec<usize> {
    var.dimensions().iter().map(|d| d.len()).collect()
}

fn dimension_names(var: &netcdf::Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name()).collect()
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<Float> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(Float::from(v)),
        AttributeValue::Int(v) => Some(Float::from(v)),
        AttributeValue::Short(v) => Some(Float::from(v)),
        _ => None,
    }
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

/// Reads the whole variable, replacing fill values with `NaN`.
fn read_values(var: &netcdf::Variable) -> Result<Vec<Float>, InputError> {
    let fill_value = numeric_attribute(var, "_FillValue");
    let missing_value = numeric_attribute(var, "missing_value");

    let values = var.get_values::<Float, _>(..)?;

    Ok(values
        .into_iter()
        .map(|v| {
            if !v.is_finite()
                || v.abs() >= MISSING_THRESHOLD
                || Some(v) == fill_value
                || Some(v) == missing_value
            {
                Float::NAN
            } else {
                v
            }
        })
        .collect())
}
