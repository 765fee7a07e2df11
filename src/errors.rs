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

use crate::{
    model::ocean::{calendar::Calendar, sectors::Sector},
    Float,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Error while processing ocean data: {0}")]
    Ocean(#[from] OceanError),

    #[error("Error while computing basal melt: {0}")]
    Melt(#[from] MeltError),

    #[error("Error while mapping basal melt onto sector masks: {0}")]
    Scatter(#[from] ScatterError),

    #[cfg(feature = "netcdf")]
    #[error("Error while handling input data: {0}")]
    Input(#[from] InputError),

    #[error("Error while converting output grid: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Error while writing output: {0}")]
    CantWriteTable(#[from] csv::Error),

    #[error("Error while accessing output: {0}")]
    CantAccessOutput(#[from] std::io::Error),

    #[error("Output is not correct: {0}")]
    FaultyOutput(&'static str),

    #[error("Memory limit of {0} MB is below already allocated memory")]
    MemoryLimit(usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectorError {
    #[error("Neither latitude/longitude nor lat/lon coordinates found, available names: {0}")]
    CoordinateNaming(String),

    #[error("Sector '{0}' is not known")]
    UnknownSector(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Searched array is empty")]
    EmptyArray,

    #[error("Depth {target} is outside of available level bounds ({shallowest} to {deepest})")]
    DepthBoundsExhausted {
        target: Float,
        shallowest: Float,
        deepest: Float,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OceanError {
    #[error("Sector selection failed: {0}")]
    Sector(#[from] SectorError),

    #[error("Level search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Arrays have mismatched shapes: {0}")]
    ShapeMismatch(&'static str),

    #[error("Level bounds are invalid: {0}")]
    InvalidLevelBounds(&'static str),

    #[error("Depth band is invalid: {0}")]
    InvalidDepthBand(&'static str),

    #[error("Calendar decoding failed: {0}")]
    Calendar(#[from] CalendarError),

    #[error("Result is empty: {0}")]
    EmptyResult(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Time units '{0}' are not in '<unit> since <date>' form")]
    MalformedUnits(String),

    #[error("Calendar '{0}' is not supported")]
    UnsupportedCalendar(String),

    #[error("Reference date {date} does not exist in {calendar:?} calendar")]
    InvalidReferenceDate { date: String, calendar: Calendar },

    #[error("Time value {0} cannot be represented as a date")]
    OutOfRange(Float),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeltError {
    #[error("Basal melt anomaly {value} for sector {sector} in year {year} is implausible")]
    ImplausibleMelt {
        sector: Sector,
        year: i32,
        value: Float,
    },

    #[error("No baseline temperature provided for sector {0}")]
    MissingBaseline(Sector),

    #[error("Melt sensitivity coefficient must be positive and finite, got {0}")]
    InvalidGamma(Float),

    #[error("Result is empty: {0}")]
    EmptyResult(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScatterError {
    #[error("Mask of sector {sector} contains value {value}, only 0 and 1 are allowed")]
    InvalidMaskValue { sector: Sector, value: Float },

    #[error("Arrays have mismatched shapes: {0}")]
    ShapeMismatch(&'static str),

    #[error("Set of spatial masks is empty")]
    NoMasks,

    #[error("Sector {0} has more than one mask")]
    DuplicateMask(Sector),

    #[error("Masks of sectors {first} and {second} overlap in {cells} cells")]
    OverlappingMasks {
        first: Sector,
        second: Sector,
        cells: usize,
    },
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Cannot launch conversion tool: {0}")]
    CantLaunch(#[from] std::io::Error),

    #[error("Conversion tool {tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

#[cfg(feature = "netcdf")]
#[derive(Error, Debug)]
pub enum InputError {
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Variable '{0}' not found in input file")]
    MissingVariable(String),

    #[error("Variable '{0}' has unexpected number of dimensions")]
    WrongDimensionality(String),

    #[error("Attribute '{0}' is missing or not a string")]
    MissingAttribute(String),

    #[error("Input data is not sufficient: {0}")]
    DataNotSufficient(&'static str),

    #[error("Input data is inconsistent: {0}")]
    Ocean(#[from] OceanError),

    #[error("Spatial masks are invalid: {0}")]
    Scatter(#[from] ScatterError),
}

#[cfg(feature = "netcdf")]
impl From<SectorError> for InputError {
    fn from(err: SectorError) -> Self {
        InputError::Ocean(OceanError::Sector(err))
    }
}

#[cfg(feature = "netcdf")]
impl From<CalendarError> for InputError {
    fn from(err: CalendarError) -> Self {
        InputError::Ocean(OceanError::Calendar(err))
    }
}

#[cfg(feature = "netcdf")]
impl From<ndarray::ShapeError> for InputError {
    fn from(_: ndarray::ShapeError) -> Self {
        InputError::Ocean(OceanError::ShapeMismatch(
            "variable cannot be reshaped to expected dimensions",
        ))
    }
}
