use headcount_forecast::data::Series;
use headcount_forecast::error::Result;
use headcount_forecast::models::{ForecastResult, TrainedForecastModel};
use headcount_forecast::{
    DataLoader, ForecastEngine, ForecastError, ForecastModel, ForecastTable, ModelUsed, Planner,
    PlannerConfig,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, TempDir};

#[derive(Debug, Clone)]
struct FailingModel;

#[derive(Debug)]
struct NeverTrained;

impl TrainedForecastModel for NeverTrained {
    fn forecast(&self, _horizons: usize) -> Result<ForecastResult> {
        Err(ForecastError::ForecastingError("never trained".to_string()))
    }

    fn predict(&self) -> Result<ForecastResult> {
        Err(ForecastError::ForecastingError("never trained".to_string()))
    }

    fn name(&self) -> &str {
        "never trained"
    }
}

impl ForecastModel for FailingModel {
    type Trained = NeverTrained;

    fn train(&self, _series: &Series) -> Result<NeverTrained> {
        Err(ForecastError::ForecastingError("injected fault".to_string()))
    }

    fn name(&self) -> &str {
        "Failing model"
    }
}

// Helper function to lay out a data directory with a small dataset
fn create_workspace() -> (TempDir, PlannerConfig) {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let mut file = fs::File::create(data_dir.join("workforce_data.csv")).unwrap();
    writeln!(file, "Department,Region,Year,Headcount").unwrap();
    for (year, value) in [(2019, 100), (2020, 105), (2021, 110), (2022, 108), (2023, 115)] {
        writeln!(file, "Retail,West,{},{}", year, value).unwrap();
    }
    for (year, value) in [(2020, 40), (2021, 42), (2022, 47), (2023, 49)] {
        writeln!(file, "Treasury,East,{},{}", year, value).unwrap();
    }
    writeln!(file, "Audit,North,2023,12").unwrap();

    let config = PlannerConfig {
        data_dir,
        output_path: dir.path().join("forecast.csv"),
        ..PlannerConfig::default()
    };

    (dir, config)
}

fn stored(path: &Path) -> ForecastTable {
    ForecastTable::load(path).unwrap()
}

#[test]
fn test_full_forecast_workflow() {
    let (_dir, config) = create_workspace();
    let planner = Planner::from_config(&config).unwrap();

    assert_eq!(planner.data().departments(), vec!["Audit", "Retail", "Treasury"]);
    assert_eq!(planner.history("Retail", "West").len(), 5);

    let run = planner.run_forecast("Retail", "West", 2).unwrap();
    assert_eq!(run.model_used, ModelUsed::Primary);
    assert_eq!(run.rows.len(), 2);

    let table = stored(planner.output_path());
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows(), run.rows.as_slice());
}

#[test]
fn test_repeated_runs_keep_one_batch_per_pair() {
    let (_dir, config) = create_workspace();
    let planner = Planner::from_config(&config).unwrap();

    planner.run_forecast("Retail", "West", 3).unwrap();
    planner.run_forecast("Retail", "West", 3).unwrap();

    let table = stored(planner.output_path());
    assert_eq!(table.rows_for("Retail", "West").len(), 3);
    assert_eq!(table.len(), 3);
}

#[test]
fn test_forecasting_one_pair_keeps_the_other() {
    let (_dir, config) = create_workspace();
    let planner = Planner::from_config(&config).unwrap();

    planner.run_forecast("Treasury", "East", 4).unwrap();
    let treasury_before = stored(planner.output_path()).rows().to_vec();

    planner.run_forecast("Retail", "West", 2).unwrap();
    planner.run_forecast("Retail", "West", 1).unwrap();

    let table = stored(planner.output_path());
    let treasury_after: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| r.department == "Treasury")
        .cloned()
        .collect();
    assert_eq!(treasury_before, treasury_after);
    assert_eq!(table.rows_for("Retail", "West").len(), 1);
}

#[test]
fn test_fallback_run_is_persisted() {
    let (_dir, config) = create_workspace();
    let data = DataLoader::from_csv(config.input_path()).unwrap();
    let engine = ForecastEngine::new(FailingModel, headcount_forecast::models::ArimaModel::fallback());
    let planner = Planner::with_engine(data, engine, config.output_path.clone());

    let run = planner.run_forecast("Retail", "West", 3).unwrap();
    assert_eq!(run.model_used, ModelUsed::Fallback);
    assert!(run.warning.is_some());

    let table = stored(planner.output_path());
    let years: Vec<i32> = table.rows().iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2024, 2025, 2026]);
}

#[test]
fn test_failed_run_writes_nothing() {
    let (_dir, config) = create_workspace();
    let planner = Planner::from_config(&config).unwrap();
    planner.run_forecast("Treasury", "East", 2).unwrap();
    let before = fs::read_to_string(planner.output_path()).unwrap();

    // A single observation defeats both models
    let err = planner.run_forecast("Audit", "North", 2).unwrap_err();
    assert!(matches!(err, ForecastError::FallbackFailed { .. }));

    // Unknown pair fails before any model runs
    let err = planner.run_forecast("Audit", "South", 2).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData { .. }));

    let err = planner.run_forecast("Retail", "West", 6).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));

    assert_eq!(fs::read_to_string(planner.output_path()).unwrap(), before);
}

#[test]
fn test_missing_dataset_fails_at_load() {
    let dir = tempdir().unwrap();
    let config = PlannerConfig {
        data_dir: dir.path().join("missing"),
        ..PlannerConfig::default()
    };
    assert!(matches!(Planner::from_config(&config), Err(ForecastError::IoError(_))));
}
