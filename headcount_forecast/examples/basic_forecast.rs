use headcount_forecast::data::Series;
use headcount_forecast::models::arima::ArimaModel;
use headcount_forecast::models::trend::TrendModel;
use headcount_forecast::models::{ForecastModel, TrainedForecastModel};
use headcount_forecast::ForecastEngine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Headcount Forecast: Basic Forecasting Example");
    println!("=============================================\n");

    let series = Series::new(
        "Retail",
        "West",
        vec![
            (2019, 100.0),
            (2020, 105.0),
            (2021, 110.0),
            (2022, 108.0),
            (2023, 115.0),
        ],
    );
    println!(
        "{} ({}): {} years of history, last year {:?}\n",
        series.department(),
        series.region(),
        series.len(),
        series.last_year()
    );

    // Each model on its own
    let trend = TrendModel::new().train(&series)?;
    println!(
        "{}: {} changepoints, final rate {:.2} per year",
        trend.name(),
        trend.changepoint_count(),
        trend.final_rate()
    );
    let trend_forecast = trend.forecast(3)?;
    println!("  forecast: {:?}", trend_forecast.values());

    let arima = ArimaModel::fallback().train(&series)?;
    println!(
        "{}: phi = {:.3}, sigma^2 = {:.3}",
        arima.name(),
        arima.ar_coefficient(),
        arima.sigma2()
    );
    let arima_forecast = arima.forecast(3)?;
    println!("  forecast: {:?}\n", arima_forecast.values());

    // The engine picks the trend model and falls back to ARIMA on failure
    let run = ForecastEngine::default().forecast(&series, 3)?;
    println!("Engine used the {} model ({})", run.model_used, run.model_name);
    for row in &run.rows {
        println!(
            "  {}: {:.1} [{:.1}, {:.1}]",
            row.year, row.forecast_headcount, row.lower, row.upper
        );
    }
    if let Some(accuracy) = &run.accuracy {
        print!("\n{}", accuracy);
    }

    Ok(())
}
