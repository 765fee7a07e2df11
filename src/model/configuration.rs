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

//! Module responsible for parsing and checking the configuration file.
//!
//! The configuration file uses [YAML](https://en.wikipedia.org/wiki/YAML)
//! and `serde` to enforce strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use super::{
    melt::{reference_baselines, Baselines, BasalMeltModel},
    ocean::{
        annual::Aggregation,
        depth::{levermann_shelf_depths, DepthBandSelector, DepthSelection},
        sectors::{Sector, SectorTable},
    },
    series::SectorSeriesBuilder,
};
use crate::{constants::DEFAULT_HALF_WIDTH, errors::ConfigError, Float};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Fields with information about model input data.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Input {
    /// List of NetCDF files with ocean potential temperature.
    ///
    /// Files are read in the given order and concatenated
    /// along the time axis, so they should be listed
    /// chronologically. All files must share the same grid.
    pub thetao_files: Vec<PathBuf>,

    /// NetCDF file with ocean grid cell area.
    pub area_file: PathBuf,

    /// _(Optional)_ Name of the level bounds variable.
    /// Defaults to `lev_bnds`.
    #[serde(default = "Input::default_level_bounds_variable")]
    pub level_bounds_variable: String,

    /// _(Optional)_ Defaults to `thetao`.
    #[serde(default = "Input::default_temperature_variable")]
    pub temperature_variable: String,

    /// _(Optional)_ Defaults to `areacello`.
    #[serde(default = "Input::default_area_variable")]
    pub area_variable: String,

    /// Flattened BISICLES sector masks, one file per sector.
    ///
    /// All masks must be defined on the same `(x, y)` grid.
    pub mask_files: FxHashMap<Sector, PathBuf>,

    /// _(Optional)_ Name of the mask variable in mask files.
    /// Defaults to `smask`.
    #[serde(default = "Input::default_mask_variable")]
    pub mask_variable: String,
}

impl Input {
    fn default_level_bounds_variable() -> String {
        "lev_bnds".to_string()
    }

    fn default_temperature_variable() -> String {
        "thetao".to_string()
    }

    fn default_area_variable() -> String {
        "areacello".to_string()
    }

    fn default_mask_variable() -> String {
        "smask".to_string()
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.thetao_files.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one ocean temperature file must be provided",
            ));
        }

        if self.mask_files.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one sector mask file must be provided",
            ));
        }

        if self.mask_files.contains_key(&Sector::Anta) {
            return Err(ConfigError::OutOfBounds(
                "Whole Antarctica cannot have its own sector mask",
            ));
        }

        Ok(())
    }
}

/// _(Optional)_ Sectors for which mean temperature is computed.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Sectors {
    /// _(Optional)_ Ordered list of sectors. Output columns
    /// follow this order.
    ///
    /// Defaults to all five base sectors.
    #[serde(default = "Sectors::default_list")]
    pub list: Vec<Sector>,

    /// _(Optional)_ Rectangles (in degrees) defining every base sector.
    /// Longitudes must be in `[0, 360)` range.
    ///
    /// Defaults to sectors of Levermann et al. (2020).
    #[serde(default)]
    pub definitions: SectorTable,
}

impl Sectors {
    fn default_list() -> Vec<Sector> {
        Sector::BASE.to_vec()
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.list.is_empty() {
            return Err(ConfigError::OutOfBounds("Sector list cannot be empty"));
        }

        let mut sorted = self.list.clone();
        sorted.sort_unstable();
        sorted.dedup();

        if sorted.len() != self.list.len() {
            return Err(ConfigError::OutOfBounds(
                "Sector list cannot contain duplicates",
            ));
        }

        if !self.definitions.is_consistent() {
            return Err(ConfigError::OutOfBounds(
                "Every sector definition must contain at least one non-degenerate rectangle",
            ));
        }

        Ok(())
    }
}

impl Default for Sectors {
    fn default() -> Self {
        Sectors {
            list: Sectors::default_list(),
            definitions: SectorTable::default(),
        }
    }
}

/// _(Optional)_ Fields controlling the depth band
/// over which temperature is averaged.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Depth {
    /// _(Optional)_ Either `shelf-base` or `fixed: <depth>`.
    ///
    /// Defaults to `shelf-base`.
    #[serde(default)]
    pub selection: DepthSelection,

    /// _(Optional)_ Half of the band thickness in meters.
    ///
    /// Defaults to `50`. Must be positive.
    #[serde(default = "Depth::default_half_width")]
    pub half_width: Float,

    /// _(Optional)_ Shelf base depth (m) of each sector.
    #[serde(default = "levermann_shelf_depths")]
    pub shelf_depths: FxHashMap<Sector, Float>,
}

impl Depth {
    fn default_half_width() -> Float {
        DEFAULT_HALF_WIDTH
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !self.half_width.is_finite() || self.half_width <= 0.0 {
            return Err(ConfigError::OutOfBounds(
                "Depth band half width must be positive",
            ));
        }

        if let DepthSelection::Fixed(depth) = self.selection {
            if !depth.is_finite() || depth < 0.0 {
                return Err(ConfigError::OutOfBounds(
                    "Fixed depth must be non-negative",
                ));
            }
        }

        if self
            .shelf_depths
            .values()
            .any(|d| !d.is_finite() || *d < 0.0)
        {
            return Err(ConfigError::OutOfBounds(
                "Shelf base depths must be non-negative",
            ));
        }

        Ok(())
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth {
            selection: DepthSelection::default(),
            half_width: Depth::default_half_width(),
            shelf_depths: levermann_shelf_depths(),
        }
    }
}

/// Fields of the basal melt parameterisation.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Forcing {
    /// Melt sensitivity coefficient calibrated
    /// for the ocean model. Must be positive.
    pub gamma: Float,

    /// _(Optional)_ Baseline temperature (degC) of each sector.
    /// Every processed sector must have a baseline.
    #[serde(default = "reference_baselines")]
    pub baselines: Baselines,

    /// _(Optional)_ Either `annual-mean` or `none`
    /// (for data which is already annual).
    ///
    /// Defaults to `annual-mean`.
    #[serde(default)]
    pub aggregate: Aggregation,

    /// _(Optional)_ Melt value outside of all sector masks.
    ///
    /// Defaults to `0`.
    #[serde(default)]
    pub background: Float,
}

impl Forcing {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(ConfigError::OutOfBounds(
                "Melt sensitivity coefficient must be positive",
            ));
        }

        if self.baselines.values().any(|b| !b.is_finite()) {
            return Err(ConfigError::OutOfBounds(
                "Baseline temperatures must be finite",
            ));
        }

        if !self.background.is_finite() {
            return Err(ConfigError::OutOfBounds(
                "Background melt must be finite",
            ));
        }

        Ok(())
    }
}

/// _(Optional)_ Fields describing model output.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// _(Optional)_ Directory for output files.
    /// It must be empty or not exist.
    ///
    /// Defaults to `./output/`.
    #[serde(default = "Output::default_directory")]
    pub directory: PathBuf,

    /// _(Optional)_ Prefix of per-year grid files
    /// (`<name><year>.nc`). Defaults to `bm_`.
    #[serde(default = "Output::default_name")]
    pub name: String,

    /// _(Optional)_ Path to the tool converting NetCDF grids
    /// into BISICLES AMR files, called as
    /// `<converter> <input.nc> <output.2d.hdf5> <variable>`.
    ///
    /// When not set grids are left as NetCDF.
    #[serde(default)]
    pub converter: Option<PathBuf>,

    /// _(Optional)_ Name of the melt variable in output grids.
    /// Defaults to `bm`.
    #[serde(default = "Output::default_variable")]
    pub variable: String,
}

impl Output {
    fn default_directory() -> PathBuf {
        PathBuf::from("./output/")
    }

    fn default_name() -> String {
        "bm_".to_string()
    }

    fn default_variable() -> String {
        "bm".to_string()
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.name.contains(std::path::MAIN_SEPARATOR) {
            return Err(ConfigError::OutOfBounds(
                "Output name cannot contain path separators",
            ));
        }

        if self.variable.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "Output variable name cannot be empty",
            ));
        }

        Ok(())
    }
}

impl Default for Output {
    fn default() -> Self {
        Output {
            directory: Output::default_directory(),
            name: Output::default_name(),
            converter: None,
            variable: Output::default_variable(),
        }
    }
}

/// _(Optional)_ Fields with information about
/// resources available for model.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used by the model.
    /// The thread pool initiated by this model will use
    /// up to this number of workers.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit for the model in MB.
    /// Useful for enabling meaningful Out-of-memory error messages.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space.
    ///
    /// Whole ocean temperature fields are held in memory, so for long
    /// high-resolution runs it is worth setting the limit slightly
    /// below available system memory. The allocator then aborts with
    /// an OOM message instead of the system killing the process.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub input: Input,

    #[serde(default)]
    pub sectors: Sectors,

    #[serde(default)]
    pub depth: Depth,

    pub forcing: Forcing,

    #[serde(default)]
    pub output: Output,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::new_from_slice(data.as_slice())
    }

    pub fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.input.check_bounds()?;
        config.sectors.check_bounds()?;
        config.depth.check_bounds()?;
        config.forcing.check_bounds()?;
        config.output.check_bounds()?;
        config.resources.check_bounds()?;
        config.check_listed_sectors()?;

        Ok(config)
    }

    /// Overriding a per-sector table replaces it as a whole,
    /// so every listed sector is checked against all tables.
    fn check_listed_sectors(&self) -> Result<(), ConfigError> {
        let definitions = &self.sectors.definitions;

        for &sector in &self.sectors.list {
            let defined = if sector == Sector::Anta {
                definitions.rectangles(Sector::Anta).is_ok()
                    || Sector::BASE
                        .iter()
                        .all(|&base| definitions.rectangles(base).is_ok())
            } else {
                definitions.rectangles(sector).is_ok()
            };

            if !defined {
                return Err(ConfigError::OutOfBounds(
                    "Every listed sector must have a sector definition",
                ));
            }

            if !self.forcing.baselines.contains_key(&sector) {
                return Err(ConfigError::OutOfBounds(
                    "Every listed sector must have a baseline temperature",
                ));
            }

            if self.depth.selection == DepthSelection::ShelfBase
                && !self.depth.shelf_depths.contains_key(&sector)
            {
                return Err(ConfigError::OutOfBounds(
                    "Every listed sector must have a shelf base depth",
                ));
            }
        }

        Ok(())
    }

    pub fn series_builder(&self) -> SectorSeriesBuilder {
        let depths = DepthBandSelector::new(
            self.depth.selection,
            self.depth.half_width,
            self.depth.shelf_depths.clone(),
        );

        SectorSeriesBuilder::new(
            self.sectors.definitions.clone(),
            depths,
            self.forcing.aggregate,
        )
    }

    pub fn melt_model(&self) -> Result<BasalMeltModel, ConfigError> {
        BasalMeltModel::new(self.forcing.gamma).map_err(|_| {
            ConfigError::OutOfBounds("Melt sensitivity coefficient must be positive")
        })
    }
}
