//! Persisted forecast table with per department/region upsert

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Column headers of the persisted forecast table
pub const FORECAST_COLUMNS: [&str; 6] = [
    "Department",
    "Region",
    "Year",
    "Forecast_Headcount",
    "Lower",
    "Upper",
];

/// One forecast year for a department/region pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Forecast_Headcount")]
    pub forecast_headcount: f64,
    #[serde(rename = "Lower")]
    pub lower: f64,
    #[serde(rename = "Upper")]
    pub upper: f64,
}

impl ForecastRow {
    /// Whether this row belongs to the given department/region pair
    pub fn matches(&self, department: &str, region: &str) -> bool {
        self.department == department && self.region == region
    }
}

/// All stored forecasts, one batch per department/region pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the table from disk; a missing file is an empty table
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);
        let rows = reader
            .deserialize::<ForecastRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { rows })
    }

    /// Replace every stored row of the batch's department/region with the batch.
    ///
    /// Returns the number of rows that were removed. Rows of other pairs are
    /// left as they were.
    pub fn merge(&mut self, batch: Vec<ForecastRow>) -> Result<usize> {
        let (department, region) = match batch.first() {
            Some(first) => (first.department.clone(), first.region.clone()),
            None => {
                return Err(ForecastError::ValidationError(
                    "Cannot merge an empty forecast batch".to_string(),
                ))
            }
        };

        if batch.iter().any(|row| !row.matches(&department, &region)) {
            return Err(ForecastError::ValidationError(
                "Forecast batch mixes department/region pairs".to_string(),
            ));
        }

        let before = self.rows.len();
        self.rows.retain(|row| !row.matches(&department, &region));
        let removed = before - self.rows.len();
        self.rows.extend(batch);

        Ok(removed)
    }

    /// Rewrite the whole table at `path`.
    ///
    /// Rows go to a temporary file next to the target which then replaces it,
    /// so readers never see a half-written table. Concurrent writers are not
    /// coordinated; the last one to finish wins.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file());
            writer.write_record(FORECAST_COLUMNS)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        tmp.persist(path)?;

        info!(path = %path.display(), rows = self.rows.len(), "saved forecast table");
        Ok(())
    }

    /// All rows in stored order
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Rows stored for one department/region pair
    pub fn rows_for(&self, department: &str, region: &str) -> Vec<&ForecastRow> {
        self.rows
            .iter()
            .filter(|row| row.matches(department, region))
            .collect()
    }

    /// Sorted department/region pairs that have stored forecasts
    pub fn keys(&self) -> Vec<(String, String)> {
        self.rows
            .iter()
            .map(|row| (row.department.clone(), row.region.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
