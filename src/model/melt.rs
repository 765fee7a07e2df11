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

//! Quadratic basal melt parameterisation (Favier et al. 2019).
//!
//! Melt rate is proportional to `(T - Tf) * |T - Tf|`, so it keeps
//! the sign of thermal forcing and becomes negative (refreezing)
//! for ocean temperature below freezing point. Anomalies are computed
//! relative to melt at the baseline temperature of each sector.

use super::{ocean::sectors::Sector, series::SectorSeries};
use crate::{
    constants::{C_PO, L_I, MELT_PLAUSIBILITY_BOUND, MELT_SCALE, RHO_I, RHO_SW, T_F},
    errors::MeltError,
    Float,
};
use log::{debug, info};
use ndarray::Array2;
use rustc_hash::FxHashMap;

/// Baseline (reference climate) temperature of each sector.
pub type Baselines = FxHashMap<Sector, Float>;

/// Baseline temperatures (degC) of the reference ocean climate.
pub fn reference_baselines() -> Baselines {
    let mut baselines = FxHashMap::default();

    baselines.insert(Sector::Eais, 0.272_097_953_410_557_26);
    baselines.insert(Sector::Wedd, -1.471_784_486_780_416);
    baselines.insert(Sector::Amun, 2.151_023_340_746_032_6);
    baselines.insert(Sector::Ross, 0.517_784_893_969_683_3);
    baselines.insert(Sector::Apen, -0.619_259_625_128_306_7);

    baselines
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct BasalMeltModel {
    gamma: Float,
}

impl BasalMeltModel {
    /// Constructs the model with melt sensitivity
    /// coefficient calibrated for the ocean model.
    pub fn new(gamma: Float) -> Result<Self, MeltError> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(MeltError::InvalidGamma(gamma));
        }

        Ok(BasalMeltModel { gamma })
    }

    pub fn quadratic_constant(&self) -> Float {
        let c_lin = (RHO_SW * C_PO) / (RHO_I * L_I);

        self.gamma * MELT_SCALE * c_lin.powi(2)
    }

    pub fn melt(&self, temperature: Float) -> Float {
        let forcing = temperature - T_F;

        forcing * forcing.abs() * self.quadratic_constant()
    }

    /// Melt anomaly relative to baseline temperature,
    /// without checking its plausibility.
    pub fn raw_anomaly(&self, temperature: Float, baseline: Float) -> Float {
        self.melt(temperature) - self.melt(baseline)
    }

    /// Melt anomaly relative to baseline temperature.
    ///
    /// Anomalies outside `(-100, 100)` (and `NaN`) are rejected.
    pub fn anomaly(
        &self,
        temperature: Float,
        baseline: Float,
        sector: Sector,
        year: i32,
    ) -> Result<Float, MeltError> {
        let value = self.raw_anomaly(temperature, baseline);

        if !(value > -MELT_PLAUSIBILITY_BOUND && value < MELT_PLAUSIBILITY_BOUND) {
            return Err(MeltError::ImplausibleMelt {
                sector,
                year,
                value,
            });
        }

        Ok(value)
    }

    /// Converts a table of sector temperatures into
    /// a table of melt anomalies of the same shape.
    pub fn anomalies(
        &self,
        temperatures: &SectorSeries,
        baselines: &Baselines,
    ) -> Result<MeltAnomalySeries, MeltError> {
        if temperatures.is_empty() {
            return Err(MeltError::EmptyResult("temperature table is empty"));
        }

        let sectors = temperatures.sectors();
        let years = temperatures.years();

        let sector_baselines = sectors
            .iter()
            .map(|&s| baselines.get(&s).copied().ok_or(MeltError::MissingBaseline(s)))
            .collect::<Result<Vec<Float>, MeltError>>()?;

        debug!(
            "Computing melt anomalies with quadratic constant {:.4}",
            self.quadratic_constant()
        );

        let mut values = Array2::zeros((years.len(), sectors.len()));

        for ((row, column), value) in values.indexed_iter_mut() {
            *value = self.anomaly(
                temperatures.values()[[row, column]],
                sector_baselines[column],
                sectors[column],
                years[row],
            )?;
        }

        info!(
            "Computed basal melt anomalies of {} sectors over {} years",
            sectors.len(),
            years.len()
        );

        let series = SectorSeries::new(years.to_vec(), sectors.to_vec(), values)
            .map_err(|_| MeltError::EmptyResult("melt table has inconsistent shape"))?;

        Ok(MeltAnomalySeries { series })
    }
}

/// Table of basal melt anomalies, every value
/// is within the plausibility bound.
#[derive(Clone, PartialEq, Debug)]
pub struct MeltAnomalySeries {
    series: SectorSeries,
}

impl MeltAnomalySeries {
    pub fn series(&self) -> &SectorSeries {
        &self.series
    }
}

#[cfg(test)]
mod tests {
    use super::{reference_baselines, BasalMeltModel};
    use crate::{
        constants::T_F,
        errors::MeltError,
        model::{ocean::sectors::Sector, series::SectorSeries},
    };
    use float_cmp::approx_eq;
    use ndarray::Array2;

    #[test]
    fn quadratic_constant() {
        let model = BasalMeltModel::new(1.0).unwrap();
        let expected = 1.0e5 * ((1028.0 * 3974.0) / (917.0 * 3.34e5_f64)).powi(2);

        assert!(approx_eq!(f64, model.quadratic_constant(), expected, ulps = 4));
    }

    #[test]
    fn warm_water_anomaly() {
        let model = BasalMeltModel::new(1.0).unwrap();
        let ms = model.quadratic_constant();

        assert_eq!(model.melt(-1.6), 0.0);

        let anomaly = model.anomaly(-1.0, -1.6, Sector::Ross, 2000).unwrap();
        assert!(approx_eq!(f64, anomaly, 0.36 * ms, epsilon = 1e-12));
    }

    #[test]
    fn zero_anomaly_at_baseline() {
        let model = BasalMeltModel::new(7.5).unwrap();

        for t in [-2.5, -1.6, 0.0, 0.3, 2.15] {
            assert_eq!(model.anomaly(t, t, Sector::Amun, 1900).unwrap(), 0.0);
        }
    }

    #[test]
    fn melt_is_odd_around_freezing() {
        let model = BasalMeltModel::new(2.0).unwrap();

        for d in [0.1, 0.5, 1.0, 3.0] {
            let warm = model.melt(T_F + d);
            let cold = model.melt(T_F - d);

            assert!(warm > 0.0 && cold < 0.0);
            assert!(approx_eq!(f64, warm, -cold, epsilon = 1e-9));
        }
    }

    #[test]
    fn implausible_anomaly_is_rejected() {
        let model = BasalMeltModel::new(1.0).unwrap();

        // far too warm water for any shelf
        let err = model.anomaly(40.0, 0.0, Sector::Wedd, 2100).unwrap_err();
        assert!(matches!(
            err,
            MeltError::ImplausibleMelt {
                sector: Sector::Wedd,
                year: 2100,
                ..
            }
        ));

        assert!(model.anomaly(f64::NAN, 0.0, Sector::Wedd, 2100).is_err());
    }

    #[test]
    fn invalid_gamma() {
        assert!(BasalMeltModel::new(0.0).is_err());
        assert!(BasalMeltModel::new(f64::INFINITY).is_err());
    }

    #[test]
    fn table_anomalies() {
        let model = BasalMeltModel::new(1.0).unwrap();
        let baselines = reference_baselines();

        let temperatures = SectorSeries::new(
            vec![2000, 2001],
            vec![Sector::Amun, Sector::Wedd],
            Array2::from_shape_vec((2, 2), vec![2.151_023_340_746_032_6, -1.5, 2.5, -1.471_784_486_780_416])
                .unwrap(),
        )
        .unwrap();

        let anomalies = model.anomalies(&temperatures, &baselines).unwrap();
        let table = anomalies.series();

        assert_eq!(table.years(), temperatures.years());
        assert_eq!(table.sectors(), temperatures.sectors());
        assert_eq!(table.values()[[0, 0]], 0.0);
        assert_eq!(table.values()[[1, 1]], 0.0);
        assert!(table.values()[[1, 0]] > 0.0);
        assert!(table.values()[[0, 1]] < 0.0);

        let mut partial = baselines.clone();
        partial.remove(&Sector::Wedd);
        assert_eq!(
            model.anomalies(&temperatures, &partial),
            Err(MeltError::MissingBaseline(Sector::Wedd))
        );
    }

    #[test]
    fn empty_table_is_rejected() {
        let model = BasalMeltModel::new(1.0).unwrap();
        let temperatures =
            SectorSeries::new(vec![], vec![Sector::Ross], Array2::zeros((0, 1))).unwrap();

        assert!(matches!(
            model.anomalies(&temperatures, &reference_baselines()),
            Err(MeltError::EmptyResult(_))
        ));
    }
}
