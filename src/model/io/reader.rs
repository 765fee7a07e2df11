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

use super::{dimension_names, dimensions, read_values, string_attribute, variable};
use crate::{
    errors::InputError,
    model::{
        configuration::Input,
        ocean::{
            calendar::{decode_years, Calendar, TimeUnits},
            coordinates::{CoordinateNaming, HorizontalCoords},
            sectors::Sector,
            CellArea, LevelBounds, OceanField,
        },
        scatter::{SpatialMask, SpatialMaskSet, BISICLES_MASK_ORDER},
        Inputs,
    },
    Float,
};
use log::{debug, info};
use ndarray::{concatenate, Array1, Array2, Array3, Array4, ArrayView4, Axis};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Reads all inputs listed in the configuration.
///
/// Level bounds are read from the first temperature file.
pub fn read_inputs(input: &Input) -> Result<Inputs, InputError> {
    let field = read_ocean_field(&input.thetao_files, &input.temperature_variable)?;

    let first_file = input
        .thetao_files
        .first()
        .ok_or(InputError::DataNotSufficient("no ocean temperature files"))?;
    let bounds = read_level_bounds(first_file, &input.level_bounds_variable)?;

    let area = read_cell_area(&input.area_file, &input.area_variable)?;
    let masks = read_masks(&input.mask_files, &input.mask_variable)?;

    if area.shape() != field.horizontal_shape() {
        return Err(InputError::DataNotSufficient(
            "cell area grid differs from ocean temperature grid",
        ));
    }

    if bounds.len() != field.levels() {
        return Err(InputError::DataNotSufficient(
            "number of level bounds differs from number of ocean levels",
        ));
    }

    Ok(Inputs {
        field,
        area,
        bounds,
        masks,
    })
}

/// Reads ocean potential temperature from all files and
/// concatenates them along the time axis.
pub fn read_ocean_field(files: &[PathBuf], name: &str) -> Result<OceanField, InputError> {
    let mut fields: Vec<OceanField> = Vec::with_capacity(files.len());

    for path in files {
        debug!("Reading {} from {}", name, path.display());
        let field = read_temperature_file(path, name)?;

        if let Some(first) = fields.first() {
            if first.coords() != field.coords() || first.levels() != field.levels() {
                return Err(InputError::DataNotSufficient(
                    "ocean temperature files are not on the same grid",
                ));
            }
        }

        fields.push(field);
    }

    let mut fields = fields.into_iter();
    let first = fields
        .next()
        .ok_or(InputError::DataNotSufficient("no ocean temperature files"))?;

    let rest: Vec<OceanField> = fields.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let mut years = first.years().to_vec();
    let mut views: Vec<ArrayView4<Float>> = vec![first.data()];

    for field in &rest {
        years.extend_from_slice(field.years());
        views.push(field.data());
    }

    let data = concatenate(Axis(0), &views)?;

    info!(
        "Read {} time steps of ocean temperature from {} files",
        years.len(),
        rest.len() + 1
    );

    Ok(OceanField::new(data, years, first.coords().clone())?)
}

fn read_temperature_file(path: &Path, name: &str) -> Result<OceanField, InputError> {
    let file = netcdf::open(path)?;

    let coords = read_coords(&file)?;
    let years = read_years(&file)?;

    let var = variable(&file, name)?;
    let shape = dimensions(&var);

    if shape.len() != 4 {
        return Err(InputError::WrongDimensionality(name.to_string()));
    }

    let data = Array4::from_shape_vec((shape[0], shape[1], shape[2], shape[3]), read_values(&var)?)?;

    Ok(OceanField::new(data, years, coords)?)
}

/// Reads horizontal coordinates, either as 2D curvilinear
/// arrays or as 1D axes of a regular grid.
fn read_coords(file: &netcdf::File) -> Result<HorizontalCoords, InputError> {
    let names: Vec<String> = file.variables().map(|v| v.name()).collect();
    let naming = CoordinateNaming::probe(&names)?;

    let lat = variable(file, naming.latitude())?;
    let lon = variable(file, naming.longitude())?;

    let lat_shape = dimensions(&lat);
    let lon_shape = dimensions(&lon);

    match (lat_shape.as_slice(), lon_shape.as_slice()) {
        ([lat_rows, lat_columns], [lon_rows, lon_columns]) => {
            let lat_values = Array2::from_shape_vec((*lat_rows, *lat_columns), read_values(&lat)?)?;
            let lon_values = Array2::from_shape_vec((*lon_rows, *lon_columns), read_values(&lon)?)?;

            Ok(HorizontalCoords::new(lat_values, lon_values)?)
        }
        ([_], [_]) => {
            let lat_values = Array1::from(read_values(&lat)?);
            let lon_values = Array1::from(read_values(&lon)?);

            Ok(HorizontalCoords::from_axes(lat_values.view(), lon_values.view()))
        }
        _ => Err(InputError::WrongDimensionality(
            naming.latitude().to_string(),
        )),
    }
}

fn read_years(file: &netcdf::File) -> Result<Vec<i32>, InputError> {
    let time = variable(file, "time")?;

    let units = string_attribute(&time, "units")
        .ok_or_else(|| InputError::MissingAttribute("units".to_string()))?;
    let calendar = string_attribute(&time, "calendar").unwrap_or_else(|| "standard".to_string());

    let units = TimeUnits::parse(&units)?;
    let calendar = Calendar::from_attribute(&calendar)?;

    let values = time.get_values::<Float, _>(..)?;

    Ok(decode_years(&values, &units, calendar)?)
}

/// Reads level bounds, time-dependent bounds
/// are averaged over time.
pub fn read_level_bounds(path: &Path, name: &str) -> Result<LevelBounds, InputError> {
    let file = netcdf::open(path)?;
    let var = variable(&file, name)?;
    let shape = dimensions(&var);
    let values = read_values(&var)?;

    let bounds = match shape.as_slice() {
        [levels, 2] => Array2::from_shape_vec((*levels, 2), values)?,
        [times, levels, 2] => Array3::from_shape_vec((*times, *levels, 2), values)?
            .mean_axis(Axis(0))
            .ok_or(InputError::DataNotSufficient("level bounds have no time steps"))?,
        _ => return Err(InputError::WrongDimensionality(name.to_string())),
    };

    Ok(LevelBounds::from_array(bounds.view())?)
}

pub fn read_cell_area(path: &Path, name: &str) -> Result<CellArea, InputError> {
    let file = netcdf::open(path)?;
    let var = variable(&file, name)?;
    let shape = dimensions(&var);

    if shape.len() != 2 {
        return Err(InputError::WrongDimensionality(name.to_string()));
    }

    let area = Array2::from_shape_vec((shape[0], shape[1]), read_values(&var)?)?;

    Ok(CellArea::new(area))
}

/// Reads sector masks in the order of BISICLES mask files.
///
/// Masks are returned on `(x, y)` grid regardless
/// of dimension order in the files.
pub fn read_masks(
    files: &FxHashMap<Sector, PathBuf>,
    name: &str,
) -> Result<SpatialMaskSet, InputError> {
    let mut axes: Option<(Array1<Float>, Array1<Float>)> = None;
    let mut masks = Vec::with_capacity(files.len());

    for sector in BISICLES_MASK_ORDER {
        let path = match files.get(&sector) {
            Some(path) => path,
            None => continue,
        };

        debug!("Reading {} mask from {}", sector, path.display());

        let file = netcdf::open(path)?;
        let x = Array1::from(variable(&file, "x")?.get_values::<Float, _>(..)?);
        let y = Array1::from(variable(&file, "y")?.get_values::<Float, _>(..)?);

        let var = variable(&file, name)?;
        let shape = dimensions(&var);

        if shape.len() != 2 {
            return Err(InputError::WrongDimensionality(name.to_string()));
        }

        let codes = Array2::from_shape_vec((shape[0], shape[1]), read_values(&var)?)?;
        let codes = if dimension_names(&var).first().map(String::as_str) == Some("y") {
            codes.reversed_axes()
        } else {
            codes
        };

        if let Some((first_x, first_y)) = &axes {
            if first_x != &x || first_y != &y {
                return Err(InputError::DataNotSufficient(
                    "sector masks are not on the same grid",
                ));
            }
        }

        if axes.is_none() {
            axes = Some((x, y));
        }

        masks.push(SpatialMask::from_codes(sector, codes.view())?);
    }

    let (x, y) = axes.ok_or(InputError::DataNotSufficient("no sector masks"))?;

    info!("Read {} sector masks on {}x{} grid", masks.len(), x.len(), y.len());

    Ok(SpatialMaskSet::new(x, y, masks)?)
}
