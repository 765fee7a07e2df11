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

//! This is a module for integration tests of the model,
//! but with access to private fields and methods.
//!
//! Inputs are built in memory so that the whole chain from ocean
//! temperature to melt grids can be tested without NetCDF files.

use super::{
    configuration::Config,
    melt::BasalMeltModel,
    ocean::{
        annual::Aggregation, coordinates::HorizontalCoords, depth::DepthSelection,
        sectors::Sector, CellArea, LevelBounds, OceanField,
    },
    prepare_output_dir,
    scatter::{SpatialMask, SpatialMaskSet},
    Core, Inputs,
};
use crate::errors::ModelError;
use float_cmp::approx_eq;
use ndarray::{array, Array4};
use std::{fs, path::Path};

const AMUN_BASELINE: f64 = 2.151_023_340_746_032_6;
const ROSS_BASELINE: f64 = 0.517_784_893_969_683_3;

/// One ocean cell in Ross and one in Amundsen sector, Amundsen
/// water stays at its baseline temperature. Monthly Ross
/// temperatures average to 0.6 in 2000 and to 0.7 in 2001.
fn synthetic_inputs() -> Inputs {
    let coords = HorizontalCoords::new(array![[-80.0, -75.0]], array![[200.0, 250.0]]).unwrap();
    let ross = [0.55, 0.65, 0.65, 0.75];

    let data = Array4::from_shape_fn((4, 4, 1, 2), |(t, _, _, i)| {
        if i == 0 {
            ross[t]
        } else {
            AMUN_BASELINE
        }
    });

    let field = OceanField::new(data, vec![2000, 2000, 2001, 2001], coords).unwrap();
    let area = CellArea::new(array![[2.0, 3.0]]);
    let bounds =
        LevelBounds::new(&[(0.0, 100.0), (100.0, 300.0), (300.0, 500.0), (500.0, 800.0)]).unwrap();

    let amun = SpatialMask::from_codes(Sector::Amun, array![[0.0], [1.0], [0.0]].view()).unwrap();
    let ross = SpatialMask::from_codes(Sector::Ross, array![[1.0], [0.0], [0.0]].view()).unwrap();
    let masks = SpatialMaskSet::new(array![0.0, 1.0, 2.0], array![0.0], vec![amun, ross]).unwrap();

    Inputs {
        field,
        area,
        bounds,
        masks,
    }
}

fn config(extra: &str) -> Config {
    let yaml = format!(
        r#"
input:
  thetao_files: [thetao.nc]
  area_file: areacello.nc
  mask_files:
    amun: amun.nc
    ross: ross.nc
{}
"#,
        extra
    );

    Config::new_from_slice(yaml.as_bytes()).unwrap()
}

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("shelfmelt-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn configuration_file() {
    let config = Config::new_from_file(Path::new("./test-data/config.yaml")).unwrap();

    assert_eq!(config.input.thetao_files.len(), 2);
    assert_eq!(config.input.mask_files.len(), 5);
    assert_eq!(config.sectors.list, Sector::BASE.to_vec());
    assert_eq!(config.depth.selection, DepthSelection::ShelfBase);
    assert_eq!(config.forcing.aggregate, Aggregation::AnnualMean);
    assert_eq!(config.forcing.baselines[&Sector::Ross], ROSS_BASELINE);
    assert_eq!(config.output.name, "bm_ssp585_");
    assert!(config.output.converter.is_some());
    assert_eq!(config.resources.threads, 4);
}

#[test]
fn full_pipeline() {
    let core = Core::new(config(
        "sectors:\n  list: [ross, amun]\nforcing:\n  gamma: 1.0\n  background: 0.25\nresources:\n  threads: 2",
    ))
    .unwrap();

    let output = core.compute(&synthetic_inputs()).unwrap();
    let model = BasalMeltModel::new(1.0).unwrap();

    let temperatures = output.temperatures.column(Sector::Ross).unwrap();
    assert_eq!(output.temperatures.years(), &[2000, 2001]);
    assert!(approx_eq!(f64, temperatures[0], 0.6, epsilon = 1e-12));
    assert!(approx_eq!(f64, temperatures[1], 0.7, epsilon = 1e-12));

    assert_eq!(output.grids.len(), 2);

    for ((year, grid), (expected_year, temperature)) in
        output.grids.iter().zip([(2000, 0.6), (2001, 0.7)])
    {
        let expected = model.raw_anomaly(temperature, ROSS_BASELINE);

        assert_eq!(*year, expected_year);
        assert!(approx_eq!(f64, grid[[0, 0]], expected, epsilon = 1e-9));
        assert!(approx_eq!(f64, grid[[1, 0]], 0.0, epsilon = 1e-9));
        assert_eq!(grid[[2, 0]], 0.25);
    }
}

#[test]
fn single_sector_round_trip() {
    let core = Core::new(config(
        "sectors:\n  list: [ross]\nforcing:\n  gamma: 1.0\n  aggregate: none\n  background: -1.0",
    ))
    .unwrap();

    let output = core.compute(&synthetic_inputs()).unwrap();
    let anomalies = output.anomalies.series();

    assert_eq!(anomalies.sectors(), &[Sector::Ross]);
    assert_eq!(anomalies.years().len(), 4);

    let (year, grid) = &output.grids[0];
    assert_eq!(*year, 2000);
    assert_eq!(grid[[0, 0]], anomalies.values()[[0, 0]]);
    assert_eq!(grid[[1, 0]], -1.0);
    assert_eq!(grid[[2, 0]], -1.0);
}

#[test]
fn missing_baseline_stops_the_run() {
    let mut config = config("sectors:\n  list: [ross]\nforcing:\n  gamma: 1.0");
    config.forcing.baselines.remove(&Sector::Ross);
    let core = Core::new(config).unwrap();

    assert!(matches!(
        core.compute(&synthetic_inputs()),
        Err(ModelError::Melt(_))
    ));
}

#[test]
fn tables_are_written() {
    let out_dir = scratch_dir("tables");
    let core = Core::new(config(&format!(
        "sectors:\n  list: [ross, amun]\nforcing:\n  gamma: 1.0\noutput:\n  directory: {}",
        out_dir.display()
    )))
    .unwrap();

    prepare_output_dir(&out_dir).unwrap();

    let output = core.compute(&synthetic_inputs()).unwrap();
    core.write_tables(&output).unwrap();

    let mut reader = csv::Reader::from_path(out_dir.join("basal_melt_anomaly.csv")).unwrap();
    let header = reader.headers().unwrap().clone();
    assert_eq!(header.iter().collect::<Vec<_>>(), vec!["year", "ross", "amun"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][0], "2001");

    assert!(out_dir.join("ocean_temperature.csv").is_file());

    // second run into the same directory must not mix outputs
    assert!(matches!(
        prepare_output_dir(&out_dir),
        Err(ModelError::FaultyOutput(_))
    ));

    fs::remove_dir_all(&out_dir).unwrap();
}
