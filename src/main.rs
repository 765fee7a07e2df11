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

//! Shelfmelt command line program.
//!
//! Reads `config.yaml` (or the file given as the first argument),
//! computes basal melt anomaly grids and writes them
//! into the output directory.

use cap::Cap;
use env_logger::Env;
use log::{debug, error, info};
use shelfmelt::{
    errors::ModelError,
    model::{self, configuration::Config},
};
use std::{alloc, env, path::PathBuf};

/// Global allocator used by the model.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("SHELFMELT_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("SHELFMELT_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match run() {
        Ok(_) => info!("Model execution finished. Check the output directory and log."),
        Err(err) => error!("Model execution failed with error: {}", err),
    }
}

fn run() -> Result<(), ModelError> {
    let config_path = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("config.yaml"), PathBuf::from);

    debug!("Reading configuration from {}", config_path.display());
    let config = Config::new_from_file(&config_path)?;

    debug!("Setting memory limit");
    let memory = config.resources.memory;
    ALLOCATOR
        .set_limit(memory.saturating_mul(1024 * 1024))
        .map_err(|_| ModelError::MemoryLimit(memory))?;

    model::run(config)
}
