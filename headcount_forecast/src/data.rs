//! Historical headcount data and series selection

use crate::error::{ForecastError, Result};
use crate::utils::year_to_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Column headers the historical dataset must provide
pub const HISTORY_COLUMNS: [&str; 4] = ["Department", "Region", "Year", "Headcount"];

/// One row of the historical dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Headcount")]
    pub headcount: f64,
}

impl HistoricalRecord {
    /// Create a new record
    pub fn new(department: &str, region: &str, year: i32, headcount: f64) -> Self {
        Self {
            department: department.to_string(),
            region: region.to_string(),
            year,
            headcount,
        }
    }

    /// Whether this record belongs to the given department/region pair
    pub fn matches(&self, department: &str, region: &str) -> bool {
        self.department == department && self.region == region
    }
}

/// Read-only handle over the loaded historical dataset.
///
/// Built once per session and passed to whatever needs it; nothing in the
/// crate mutates it after loading.
#[derive(Debug, Clone, Default)]
pub struct WorkforceData {
    records: Vec<HistoricalRecord>,
}

/// Annual headcount series for a single department/region pair
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    department: String,
    region: String,
    points: Vec<(i32, f64)>,
}

/// Data loader for historical headcount tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load the historical dataset from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<WorkforceData> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);

        let headers = reader.headers()?.clone();
        for required in HISTORY_COLUMNS {
            if !headers.iter().any(|h| h == required) {
                return Err(ForecastError::CsvError(format!(
                    "Missing column '{}' in {}",
                    required,
                    path.display()
                )));
            }
        }

        let records = reader
            .deserialize::<HistoricalRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        info!(
            path = %path.display(),
            rows = records.len(),
            "loaded historical headcount data"
        );

        Ok(WorkforceData::from_records(records))
    }
}

impl WorkforceData {
    /// Create a dataset from already-parsed records
    pub fn from_records(records: Vec<HistoricalRecord>) -> Self {
        Self { records }
    }

    /// All records, in file order
    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted, de-duplicated department names
    pub fn departments(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.department.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted, de-duplicated region names
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Select the series for one department/region pair, ordered by year.
    ///
    /// Returns an empty series when nothing matches. Missing years are not
    /// interpolated.
    pub fn series(&self, department: &str, region: &str) -> Series {
        let mut points: Vec<(i32, f64)> = self
            .records
            .iter()
            .filter(|r| r.matches(department, region))
            .map(|r| (r.year, r.headcount))
            .collect();

        // Stable, so duplicate years keep file order
        points.sort_by_key(|(year, _)| *year);

        if points.windows(2).any(|w| w[0].0 == w[1].0) {
            warn!(department, region, "duplicate years in historical series");
        }

        Series {
            department: department.to_string(),
            region: region.to_string(),
            points,
        }
    }
}

impl Series {
    /// Create a series from (year, headcount) points; points are sorted by year
    pub fn new(department: &str, region: &str, mut points: Vec<(i32, f64)>) -> Self {
        points.sort_by_key(|(year, _)| *year);
        Self {
            department: department.to_string(),
            region: region.to_string(),
            points,
        }
    }

    /// Department this series belongs to
    pub fn department(&self) -> &str {
        &self.department
    }

    /// Region this series belongs to
    pub fn region(&self) -> &str {
        &self.region
    }

    /// (year, headcount) points in ascending year order
    pub fn points(&self) -> &[(i32, f64)] {
        &self.points
    }

    /// Years of the series
    pub fn years(&self) -> Vec<i32> {
        self.points.iter().map(|(y, _)| *y).collect()
    }

    /// Headcount values of the series
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Most recent year, if any
    pub fn last_year(&self) -> Option<i32> {
        self.points.last().map(|(y, _)| *y)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observation dates, January 1 of each year
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        self.points.iter().map(|(y, _)| year_to_date(*y)).collect()
    }
}
