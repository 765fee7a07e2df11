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

use crate::{errors::InputError, Float};
use ndarray::{ArrayView1, ArrayView2};
use std::path::Path;

/// Writes a melt grid as variable `name(x, y)`, the layout
/// expected by BISICLES filetools.
pub fn write_grid(
    path: &Path,
    x: ArrayView1<Float>,
    y: ArrayView1<Float>,
    grid: ArrayView2<Float>,
    name: &str,
) -> Result<(), InputError> {
    if grid.dim() != (x.len(), y.len()) {
        return Err(InputError::DataNotSufficient(
            "melt grid differs from its x and y coordinates",
        ));
    }

    let mut file = netcdf::create(path)?;

    file.add_dimension("x", x.len())?;
    file.add_dimension("y", y.len())?;

    {
        let mut x_var = file.add_variable::<Float>("x", &["x"])?;
        x_var.put_attribute("units", "m")?;
        x_var.put_values(&x.to_vec(), ..)?;
    }

    {
        let mut y_var = file.add_variable::<Float>("y", &["y"])?;
        y_var.put_attribute("units", "m")?;
        y_var.put_values(&y.to_vec(), ..)?;
    }

    let values: Vec<Float> = grid.iter().copied().collect();

    let mut melt_var = file.add_variable::<Float>(name, &["x", "y"])?;
    melt_var.put_attribute("long_name", "basal melt anomaly")?;
    melt_var.put_attribute("units", "m/yr")?;
    melt_var.put_values(&values, ..)?;

    Ok(())
}
