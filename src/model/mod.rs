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

//! Module containing the actual model code.
//!
//! The model runs in three steps:
//!
//! 1. Ocean temperature is averaged over each sector area and over
//!    the depth band around the sector's ice shelf base ([`series`]).
//! 2. Mean temperature is converted into quadratic basal melt anomaly
//!    relative to the sector baseline ([`melt`]).
//! 3. Anomalies are mapped onto BISICLES sector masks, one grid per year
//!    ([`scatter`]), which are then written and optionally converted
//!    into AMR files.

pub mod configuration;
pub mod converter;
#[cfg(feature = "netcdf")]
pub mod io;
pub mod melt;
pub mod ocean;
pub mod scatter;
pub mod series;

#[cfg(test)]
mod super_tests;

use self::{
    configuration::Config,
    melt::MeltAnomalySeries,
    ocean::{CellArea, LevelBounds, OceanField},
    scatter::{scatter_series, SpatialMaskSet},
    series::SectorSeries,
};
use crate::{errors::ModelError, Float};
use log::{debug, info};
use ndarray::Array2;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{fs, path::Path};

#[cfg(feature = "netcdf")]
use self::converter::AmrConverter;
#[cfg(feature = "netcdf")]
use indicatif::{ProgressBar, ProgressStyle};

/// All data needed to compute melt grids, already in memory.
#[derive(Clone, PartialEq, Debug)]
pub struct Inputs {
    pub field: OceanField,
    pub area: CellArea,
    pub bounds: LevelBounds,
    pub masks: SpatialMaskSet,
}

/// Results of a model run.
#[derive(Clone, PartialEq, Debug)]
pub struct ModelOutput {
    pub temperatures: SectorSeries,
    pub anomalies: MeltAnomalySeries,
    /// Melt grids sorted by year.
    pub grids: Vec<(i32, Array2<Float>)>,
}

/// Structure containing model parameters.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
}

impl Core {
    /// Model [`Core`] constructor.
    pub fn new(config: Config) -> Result<Self, ModelError> {
        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .stack_size(2 * 1024 * 1024)
            .build()?;

        Ok(Core { config, threadpool })
    }

    /// Computes sector temperatures, melt anomalies and melt grids.
    ///
    /// All parallel work runs on the model thread pool.
    pub fn compute(&self, inputs: &Inputs) -> Result<ModelOutput, ModelError> {
        let builder = self.config.series_builder();
        let melt_model = self.config.melt_model()?;

        self.threadpool.install(|| -> Result<ModelOutput, ModelError> {
            info!("Computing mean ocean temperature of sectors");
            let temperatures = builder.build(
                &inputs.field,
                &inputs.area,
                &inputs.bounds,
                &self.config.sectors.list,
            )?;

            info!("Computing basal melt anomalies");
            let anomalies = melt_model.anomalies(&temperatures, &self.config.forcing.baselines)?;

            info!("Mapping basal melt anomalies onto sector masks");
            let background = inputs
                .masks
                .uniform_background(self.config.forcing.background);
            let grids = scatter_series(&anomalies, &inputs.masks, background.view())?;

            Ok(ModelOutput {
                temperatures,
                anomalies,
                grids,
            })
        })
    }

    /// Writes both tables as CSV into the output directory.
    pub fn write_tables(&self, output: &ModelOutput) -> Result<(), ModelError> {
        let out_dir = &self.config.output.directory;

        output
            .temperatures
            .write_csv(&out_dir.join("ocean_temperature.csv"))?;
        output
            .anomalies
            .series()
            .write_csv(&out_dir.join("basal_melt_anomaly.csv"))?;

        Ok(())
    }

    /// Writes one NetCDF grid per year, in year order,
    /// converting each into AMR file when converter is set.
    #[cfg(feature = "netcdf")]
    pub fn write_grids(&self, output: &ModelOutput, masks: &SpatialMaskSet) -> Result<(), ModelError> {
        let out_config = &self.config.output;
        let converter = out_config
            .converter
            .as_ref()
            .map(|tool| AmrConverter::new(tool.clone(), out_config.variable.clone()));

        let grids_bar = ProgressBar::new(output.grids.len() as u64);
        grids_bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .progress_chars("#>-"),
        );
        grids_bar.set_prefix("Written grids");

        for (year, grid) in &output.grids {
            let nc_path = out_config
                .directory
                .join(format!("{}{}.nc", out_config.name, year));

            io::write_grid(&nc_path, masks.x(), masks.y(), grid.view(), &out_config.variable)?;

            if let Some(converter) = &converter {
                converter.convert(&nc_path)?;
            }

            grids_bar.inc(1);
        }

        grids_bar.finish_with_message("All grids written");

        Ok(())
    }
}

/// Main model function, responsible for all steps.
///
/// It reads the input data listed in configuration, computes melt
/// grids and writes them together with intermediate tables
/// into the output directory.
#[cfg(feature = "netcdf")]
pub fn run(config: Config) -> Result<(), ModelError> {
    info!("Preparing the model core");

    prepare_output_dir(&config.output.directory)?;
    let model_core = Core::new(config)?;

    info!("Reading input data");
    let inputs = io::read_inputs(&model_core.config.input)?;

    let output = model_core.compute(&inputs)?;

    info!("Writing output");
    model_core.write_tables(&output)?;
    model_core.write_grids(&output, &inputs.masks)?;

    Ok(())
}

/// Makes sure that output directory exists and is empty,
/// so that no results of previous runs get mixed in.
pub fn prepare_output_dir(out_path: &Path) -> Result<(), ModelError> {
    debug!("Checking and setting output directory");

    if out_path.is_dir() {
        if out_path.read_dir()?.next().is_none() {
            debug!("Output directory exists but is empty so continuing");
        } else {
            return Err(ModelError::FaultyOutput(
                "Output directory exists and is not empty",
            ));
        }
    } else {
        debug!("Output directory does not exist so creating a new one");
        fs::create_dir_all(out_path)?;
    }

    Ok(())
}
