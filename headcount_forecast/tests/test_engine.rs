use headcount_forecast::data::Series;
use headcount_forecast::engine::{ForecastEngine, ModelUsed};
use headcount_forecast::error::{ForecastError, Result};
use headcount_forecast::models::{
    ArimaModel, ForecastModel, ForecastResult, TrainedForecastModel, TrendModel,
};
use headcount_forecast::ForecastRow;
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Model whose training always fails, standing in for a broken primary
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

/// Model that always returns the same forecast, whatever the horizon
#[derive(Debug, Clone)]
struct CannedModel {
    values: Vec<f64>,
    intervals: Vec<(f64, f64)>,
}

impl TrainedForecastModel for CannedModel {
    fn forecast(&self, _horizons: usize) -> Result<ForecastResult> {
        ForecastResult::new_with_intervals(
            self.values.clone(),
            self.values.len(),
            self.intervals.clone(),
        )
    }

    fn predict(&self) -> Result<ForecastResult> {
        Err(ForecastError::ForecastingError("no fitted values".to_string()))
    }

    fn name(&self) -> &str {
        "Canned model"
    }
}

impl ForecastModel for CannedModel {
    type Trained = CannedModel;

    fn train(&self, _series: &Series) -> Result<CannedModel> {
        Ok(self.clone())
    }

    fn name(&self) -> &str {
        "Canned model"
    }
}

fn retail_west() -> Series {
    Series::new(
        "Retail",
        "West",
        vec![
            (2019, 100.0),
            (2020, 105.0),
            (2021, 110.0),
            (2022, 108.0),
            (2023, 115.0),
        ],
    )
}

fn assert_rows_well_formed(rows: &[ForecastRow], horizon: usize) {
    assert_eq!(rows.len(), horizon);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.year, 2024 + i as i32);
        assert_eq!(row.department, "Retail");
        assert_eq!(row.region, "West");
        assert!(row.lower <= row.forecast_headcount);
        assert!(row.forecast_headcount <= row.upper);
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
#[case(5)]
fn test_primary_rows_cover_horizon(#[case] horizon: usize) {
    let run = ForecastEngine::default().forecast(&retail_west(), horizon).unwrap();

    assert_eq!(run.model_used, ModelUsed::Primary);
    assert_rows_well_formed(&run.rows, horizon);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(5)]
fn test_fallback_rows_cover_horizon(#[case] horizon: usize) {
    let engine = ForecastEngine::new(FailingModel, ArimaModel::fallback());
    let run = engine.forecast(&retail_west(), horizon).unwrap();

    assert_eq!(run.model_used, ModelUsed::Fallback);
    assert_eq!(run.model_name, "ARIMA(1,1,0)");
    assert_rows_well_formed(&run.rows, horizon);
}

#[test]
fn test_retail_west_example() {
    let run = ForecastEngine::default().forecast(&retail_west(), 2).unwrap();

    let years: Vec<i32> = run.rows.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2024, 2025]);
    assert_rows_well_formed(&run.rows, 2);
}

#[test]
fn test_fallback_warning_carries_primary_error() {
    let engine = ForecastEngine::new(FailingModel, ArimaModel::fallback());
    let run = engine.forecast(&retail_west(), 2).unwrap();

    let warning = run.warning.unwrap();
    assert!(warning.contains("Failing model"));
    assert!(warning.contains("injected fault"));
}

#[test]
fn test_fallback_failure_is_explicit_error() {
    let engine = ForecastEngine::new(FailingModel, FailingModel);
    let err = engine.forecast(&retail_west(), 2).unwrap_err();

    match err {
        ForecastError::FallbackFailed { primary, fallback } => {
            assert!(primary.contains("injected fault"));
            assert!(fallback.contains("injected fault"));
        }
        other => panic!("Expected FallbackFailed, got {:?}", other),
    }
}

#[test]
fn test_empty_series_never_reaches_models() {
    let engine = ForecastEngine::new(FailingModel, FailingModel);
    let series = Series::new("Retail", "Nowhere", Vec::new());

    let err = engine.forecast(&series, 2).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData { .. }));
}

#[test]
fn test_two_points_fall_back_only_when_needed() {
    let series = Series::new("Ops", "East", vec![(2022, 40.0), (2023, 44.0)]);
    let run = ForecastEngine::default().forecast(&series, 3).unwrap();

    assert_eq!(run.model_used, ModelUsed::Primary);
    assert_eq!(run.rows.len(), 3);
    assert_eq!(run.rows[0].year, 2024);
}

#[test]
fn test_max_horizon_is_configurable() {
    let engine = ForecastEngine::new(TrendModel::new(), ArimaModel::fallback()).with_max_horizon(2);
    assert_eq!(engine.max_horizon(), 2);
    assert!(engine.forecast(&retail_west(), 3).is_err());
    assert!(engine.forecast(&retail_west(), 2).is_ok());
}

#[test]
fn test_primary_outside_its_interval_falls_back() {
    let primary = CannedModel {
        values: vec![10.0],
        intervals: vec![(11.0, 12.0)],
    };
    let engine = ForecastEngine::new(primary, ArimaModel::fallback());
    let run = engine.forecast(&retail_west(), 1).unwrap();

    assert_eq!(run.model_used, ModelUsed::Fallback);
    assert!(run.warning.unwrap().contains("outside their intervals"));
    assert_rows_well_formed(&run.rows, 1);
}

#[test]
fn test_primary_with_wrong_period_count_falls_back() {
    let primary = CannedModel {
        values: vec![120.0, 125.0],
        intervals: vec![(110.0, 130.0), (112.0, 138.0)],
    };
    let engine = ForecastEngine::new(primary, ArimaModel::fallback());
    let run = engine.forecast(&retail_west(), 1).unwrap();

    assert_eq!(run.model_used, ModelUsed::Fallback);
    assert!(run.warning.unwrap().contains("returned 2 periods instead of 1"));
    assert_rows_well_formed(&run.rows, 1);
}

#[test]
fn test_well_formed_canned_primary_is_kept() {
    let primary = CannedModel {
        values: vec![120.0],
        intervals: vec![(110.0, 130.0)],
    };
    let engine = ForecastEngine::new(primary, FailingModel);
    let run = engine.forecast(&retail_west(), 1).unwrap();

    assert_eq!(run.model_used, ModelUsed::Primary);
    assert_eq!(run.rows[0].forecast_headcount, 120.0);
    assert!(run.accuracy.is_none());
}
