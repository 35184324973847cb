//! Forecast pipeline: select, forecast, merge, persist

use crate::config::PlannerConfig;
use crate::data::{DataLoader, Series, WorkforceData};
use crate::engine::{ForecastEngine, ForecastRun};
use crate::error::Result;
use crate::models::{ArimaModel, ForecastModel, TrendModel};
use crate::table::ForecastTable;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs forecasts over a loaded dataset and keeps the forecast table current
#[derive(Debug, Clone)]
pub struct Planner<P = TrendModel, F = ArimaModel> {
    data: WorkforceData,
    engine: ForecastEngine<P, F>,
    output_path: PathBuf,
}

impl Planner {
    /// Load the dataset named by `config` and build the default engine
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        let data = DataLoader::from_csv(config.input_path())?;
        Self::new(data, config)
    }

    /// Build the default engine over an already loaded dataset
    pub fn new(data: WorkforceData, config: &PlannerConfig) -> Result<Self> {
        let engine = ForecastEngine::from_config(config)?;
        Ok(Planner::with_engine(data, engine, config.output_path.clone()))
    }
}

impl<P: ForecastModel, F: ForecastModel> Planner<P, F> {
    /// Use a custom engine
    pub fn with_engine(data: WorkforceData, engine: ForecastEngine<P, F>, output_path: PathBuf) -> Self {
        Self {
            data,
            engine,
            output_path,
        }
    }

    /// The loaded dataset
    pub fn data(&self) -> &WorkforceData {
        &self.data
    }

    /// Where forecasts are persisted
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Historical series for one department/region pair
    pub fn history(&self, department: &str, region: &str) -> Series {
        self.data.series(department, region)
    }

    /// Forecast one pair and merge the rows into the stored table.
    ///
    /// Nothing is written unless the forecast succeeds.
    pub fn run_forecast(&self, department: &str, region: &str, horizon: usize) -> Result<ForecastRun> {
        let series = self.history(department, region);
        let run = self.engine.forecast(&series, horizon)?;

        let mut table = ForecastTable::load(&self.output_path)?;
        let replaced = table.merge(run.rows.clone())?;
        table.save(&self.output_path)?;

        info!(
            department,
            region,
            replaced,
            added = run.rows.len(),
            "merged forecast into table"
        );

        Ok(run)
    }

    /// Currently stored forecasts
    pub fn stored_forecasts(&self) -> Result<ForecastTable> {
        ForecastTable::load(&self.output_path)
    }
}
