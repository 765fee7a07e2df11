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

//! Conversion of NetCDF grids into BISICLES AMR files
//! with an external filetools program (eg. `nctoamr2d`).

use crate::errors::ConversionError;
use log::debug;
use std::{
    path::{Path, PathBuf},
    process::Command,
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AmrConverter {
    tool: PathBuf,
    variable: String,
}

impl AmrConverter {
    pub fn new(tool: PathBuf, variable: String) -> Self {
        AmrConverter { tool, variable }
    }

    /// Path of the AMR file written next to the NetCDF grid.
    pub fn output_path(input: &Path) -> PathBuf {
        input.with_extension("2d.hdf5")
    }

    /// Runs the conversion tool and waits for it to finish.
    ///
    /// Non-zero exit status is an error reported
    /// together with the tool's stderr.
    pub fn convert(&self, input: &Path) -> Result<PathBuf, ConversionError> {
        let output = AmrConverter::output_path(input);

        debug!(
            "Converting {} to {}",
            input.display(),
            output.display()
        );

        let result = Command::new(&self.tool)
            .arg(input)
            .arg(&output)
            .arg(&self.variable)
            .output()?;

        if !result.status.success() {
            return Err(ConversionError::Failed {
                tool: self.tool.display().to_string(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::AmrConverter;
    use crate::errors::ConversionError;
    use std::path::{Path, PathBuf};

    #[test]
    fn output_next_to_input() {
        assert_eq!(
            AmrConverter::output_path(Path::new("./output/bm_2015.nc")),
            PathBuf::from("./output/bm_2015.2d.hdf5")
        );
    }

    #[test]
    fn missing_tool_fails() {
        let converter = AmrConverter::new(
            PathBuf::from("./this-tool-does-not-exist"),
            "bm".to_string(),
        );

        assert!(matches!(
            converter.convert(Path::new("bm_2015.nc")),
            Err(ConversionError::CantLaunch(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_fails() {
        let converter = AmrConverter::new(PathBuf::from("false"), "bm".to_string());

        assert!(matches!(
            converter.convert(Path::new("bm_2015.nc")),
            Err(ConversionError::Failed { .. })
        ));
    }
}
