//! # Workforce Planning
//!
//! `workforce_planning` bundles the workspace's forecasting library under one
//! name. Everything lives in [`headcount_forecast`]; this crate re-exports it.
//!
//! ## Example
//!
//! ```
//! use workforce_planning::{HistoricalRecord, WorkforceData};
//!
//! let data = WorkforceData::from_records(vec![
//!     HistoricalRecord::new("Retail", "West", 2020, 105.0),
//!     HistoricalRecord::new("Retail", "West", 2019, 100.0),
//! ]);
//! let series = data.series("Retail", "West");
//! assert_eq!(series.years(), vec![2019, 2020]);
//! ```

pub use headcount_forecast::*;
