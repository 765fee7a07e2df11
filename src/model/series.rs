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

//! Module responsible for building annual series
//! of volume-weighted mean ocean temperature
//! in every requested sector.
//!
//! For each sector the field is first averaged over the
//! sector area and then over the depth band around
//! the sector's ice shelf base. Sector masks are computed
//! only once per grid and shared by all years.

use super::ocean::{
    annual::Aggregation,
    depth::DepthBandSelector,
    reduction::{area_weighted_mean, level_weighted_mean},
    sectors::{Sector, SectorMasks, SectorTable},
    CellArea, LevelBounds, OceanField,
};
use crate::{errors::OceanError, Float};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use std::path::Path;

/// Table with one row per year and one column per sector.
#[derive(Clone, PartialEq, Debug)]
pub struct SectorSeries {
    years: Vec<i32>,
    sectors: Vec<Sector>,
    values: Array2<Float>,
}

impl SectorSeries {
    pub fn new(
        years: Vec<i32>,
        sectors: Vec<Sector>,
        values: Array2<Float>,
    ) -> Result<Self, OceanError> {
        if values.dim() != (years.len(), sectors.len()) {
            return Err(OceanError::ShapeMismatch(
                "table values do not match number of years and sectors",
            ));
        }

        Ok(SectorSeries {
            years,
            sectors,
            values,
        })
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn values(&self) -> ArrayView2<Float> {
        self.values.view()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column(&self, sector: Sector) -> Option<ArrayView1<Float>> {
        let index = self.sectors.iter().position(|&s| s == sector)?;

        Some(self.values.column(index))
    }

    /// Values of all sectors in the given row.
    pub fn row(&self, index: usize) -> impl Iterator<Item = (Sector, Float)> + '_ {
        self.sectors
            .iter()
            .copied()
            .zip(self.values.row(index).into_iter().copied())
    }

    /// Writes the table as CSV with `year` column
    /// followed by one column per sector.
    pub fn write_csv(&self, path: &Path) -> Result<(), csv::Error> {
        let mut out_file = csv::Writer::from_path(path)?;

        let mut header = vec!["year".to_string()];
        header.extend(self.sectors.iter().map(|s| s.to_string()));
        out_file.write_record(&header)?;

        for (year, row) in self.years.iter().zip(self.values.rows()) {
            let mut record = vec![year.to_string()];
            record.extend(row.iter().map(|v| v.to_string()));
            out_file.write_record(&record)?;
        }

        out_file.flush()?;

        Ok(())
    }
}

/// Builder of volume-weighted sector mean series.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct SectorSeriesBuilder {
    table: SectorTable,
    depths: DepthBandSelector,
    aggregation: Aggregation,
}

impl SectorSeriesBuilder {
    pub fn new(table: SectorTable, depths: DepthBandSelector, aggregation: Aggregation) -> Self {
        SectorSeriesBuilder {
            table,
            depths,
            aggregation,
        }
    }

    /// Computes the series for all sectors, columns follow
    /// the order of `sectors`.
    ///
    /// Sectors are processed in parallel on the current
    /// rayon thread pool.
    pub fn build(
        &self,
        field: &OceanField,
        area: &CellArea,
        bounds: &LevelBounds,
        sectors: &[Sector],
    ) -> Result<SectorSeries, OceanError> {
        if sectors.is_empty() {
            return Err(OceanError::EmptyResult("no sectors requested"));
        }

        if field.levels() != bounds.len() {
            return Err(OceanError::ShapeMismatch(
                "number of levels differs from number of level bounds",
            ));
        }

        let field = self.aggregation.apply(field)?;

        if field.years().is_empty() {
            return Err(OceanError::EmptyResult("ocean field has no time steps"));
        }

        debug!("Computing masks of {} sectors", sectors.len());
        let masks = SectorMasks::compute(&self.table, field.coords(), sectors)?;

        let columns = sectors
            .par_iter()
            .map(|&sector| self.sector_mean(&field, area, bounds, &masks, sector))
            .collect::<Result<Vec<Array1<Float>>, OceanError>>()?;

        let mut values = Array2::from_elem((field.years().len(), sectors.len()), Float::NAN);
        for (mut column, series) in values.axis_iter_mut(Axis(1)).zip(columns) {
            column.assign(&series);
        }

        info!(
            "Computed mean ocean temperature of {} sectors over {} years",
            sectors.len(),
            field.years().len()
        );

        SectorSeries::new(field.years().to_vec(), sectors.to_vec(), values)
    }

    fn sector_mean(
        &self,
        field: &OceanField,
        area: &CellArea,
        bounds: &LevelBounds,
        masks: &SectorMasks,
        sector: Sector,
    ) -> Result<Array1<Float>, OceanError> {
        let band = self.depths.band(sector)?;
        let mask = masks.get(sector)?;

        let area_mean = area_weighted_mean(field.data(), area, mask.view())?;
        let volume_mean = level_weighted_mean(area_mean.view(), bounds, band)?;

        debug!("Computed volume-weighted mean of sector {}", sector);

        Ok(volume_mean)
    }
}
