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

//! Aggregation of sub-annual ocean data to annual means.

use super::OceanField;
use crate::{errors::OceanError, Float};
use log::debug;
use ndarray::{s, Array3, Array4, Zip};
use serde::Deserialize;
use std::{borrow::Cow, collections::BTreeMap};

/// Pre-processing step applied to the time axis
/// before sector means are computed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregation {
    /// Average all time steps sharing the same year.
    AnnualMean,

    /// Use time steps as they are (data is already annual).
    None,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::AnnualMean
    }
}

impl Aggregation {
    pub fn apply<'a>(&self, field: &'a OceanField) -> Result<Cow<'a, OceanField>, OceanError> {
        match self {
            Aggregation::AnnualMean => annual_mean(field).map(Cow::Owned),
            Aggregation::None => Ok(Cow::Borrowed(field)),
        }
    }
}

/// Averages the field over time steps of every year,
/// skipping missing values. Years are sorted ascending.
pub fn annual_mean(field: &OceanField) -> Result<OceanField, OceanError> {
    let data = field.data();
    let (times, levels, rows, columns) = data.dim();

    if times == 0 {
        return Err(OceanError::EmptyResult("ocean field has no time steps"));
    }

    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (t, &year) in field.years().iter().enumerate() {
        groups.entry(year).or_default().push(t);
    }

    debug!(
        "Aggregating {} time steps into {} annual means",
        times,
        groups.len()
    );

    let mut means = Array4::from_elem((groups.len(), levels, rows, columns), Float::NAN);

    for (g, steps) in groups.values().enumerate() {
        let mut sum = Array3::<Float>::zeros((levels, rows, columns));
        let mut count = Array3::<Float>::zeros((levels, rows, columns));

        for &t in steps {
            Zip::from(&mut sum)
                .and(&mut count)
                .and(data.slice(s![t, .., .., ..]))
                .for_each(|s, c, &v| {
                    if v.is_finite() {
                        *s += v;
                        *c += 1.0;
                    }
                });
        }

        Zip::from(means.slice_mut(s![g, .., .., ..]))
            .and(&sum)
            .and(&count)
            .for_each(|m, &s, &c| {
                if c > 0.0 {
                    *m = s / c;
                }
            });
    }

    let years = groups.keys().copied().collect();

    OceanField::new(means, years, field.coords().clone())
}
