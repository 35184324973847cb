// src/render.rs

use headcount_forecast::{ForecastRow, ForecastRun, Series};
use std::fmt::Write;

/// Plain-text table of a historical series
pub fn history_table(series: &Series) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Historical headcount: {} ({})",
        series.department(),
        series.region()
    );
    let _ = writeln!(out, "{:>6}  {:>10}", "Year", "Headcount");
    for (year, headcount) in series.points() {
        let _ = writeln!(out, "{:>6}  {:>10.1}", year, headcount);
    }
    out
}

/// Plain-text table of forecast rows
pub fn forecast_table(rows: &[ForecastRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<10} {:>6}  {:>10}  {:>10}  {:>10}",
        "Department", "Region", "Year", "Forecast", "Lower", "Upper"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<16} {:<10} {:>6}  {:>10.1}  {:>10.1}  {:>10.1}",
            row.department, row.region, row.year, row.forecast_headcount, row.lower, row.upper
        );
    }
    out
}

/// Summary of one forecast run
pub fn run_summary(run: &ForecastRun, horizon: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Forecast (next {} years) using {} model {}",
        horizon, run.model_used, run.model_name
    );
    out.push_str(&forecast_table(&run.rows));
    if let Some(accuracy) = &run.accuracy {
        out.push('\n');
        let _ = write!(out, "{}", accuracy);
    }
    out
}
