//! Column sums, group sums and per-column statistics over a row sequence.
//!
//! Every function consumes its rows once. [`summarize`] fans a single pass out
//! to all accumulators so a file is read only one time per report.

use crate::core::stats::{coerce_number, RunningStats};
use crate::domain::model::{AggregateResult, ColumnSchema, Record, StatsSnapshot};
use crate::utils::error::{EtlError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Columns a per-file report is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationPlan {
    pub value_column: String,
    pub group_column: String,
    pub stats_columns: Vec<String>,
}

impl Default for AggregationPlan {
    fn default() -> Self {
        Self {
            value_column: "TotalPrice".to_string(),
            group_column: "Country".to_string(),
            stats_columns: vec!["UnitPrice".to_string(), "TotalPrice".to_string()],
        }
    }
}

impl AggregationPlan {
    /// Value column, group column, then the statistics columns.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        [self.value_column.as_str(), self.group_column.as_str()]
            .into_iter()
            .chain(self.stats_columns.iter().map(String::as_str))
    }

    /// Fails on the first column this plan reads that the header lacks.
    ///
    /// The per-row lookups only see columns of rows that exist, so a
    /// header-only file needs this check to report a wrong column name.
    pub fn check_schema(&self, schema: &ColumnSchema) -> Result<()> {
        require_columns(schema, self.columns())
    }
}

pub fn require_columns<'a, I>(schema: &ColumnSchema, columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    match columns.into_iter().find(|column| !schema.contains(column)) {
        Some(column) => Err(EtlError::MissingColumn {
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

/// Result of one fused pass over a file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub rows: usize,
    pub total: f64,
    pub per_group: AggregateResult,
    pub stats: IndexMap<String, StatsSnapshot>,
}

fn field<'r>(record: &'r Record, column: &str) -> Result<&'r str> {
    record.get(column).ok_or_else(|| EtlError::MissingColumn {
        column: column.to_string(),
    })
}

pub fn sum_column<I>(rows: I, column: &str) -> Result<f64>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut total = 0.0;
    for row in rows {
        let record = row?;
        if let Some(value) = coerce_number(field(&record, column)?) {
            total += value;
        }
    }
    Ok(total)
}

pub fn group_sum<I>(rows: I, group_column: &str, value_column: &str) -> Result<AggregateResult>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut groups = AggregateResult::new();
    for row in rows {
        let record = row?;
        add_to_group(&mut groups, &record, group_column, value_column)?;
    }
    Ok(groups)
}

pub fn describe<I, S>(rows: I, columns: &[S]) -> Result<IndexMap<String, StatsSnapshot>>
where
    I: IntoIterator<Item = Result<Record>>,
    S: AsRef<str>,
{
    let mut trackers = trackers_for(columns);
    for row in rows {
        let record = row?;
        observe_stats(&mut trackers, &record)?;
    }
    Ok(snapshots(&trackers))
}

/// Total, group sums and statistics in one pass.
///
/// The group sums always add up to the total because both skip exactly the
/// rows whose value does not coerce. Columns are only looked up on rows that
/// are yielded; run [`AggregationPlan::check_schema`] against the header
/// first when a file may have no data rows.
pub fn summarize<I>(rows: I, plan: &AggregationPlan) -> Result<FileSummary>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut total = 0.0;
    let mut per_group = AggregateResult::new();
    let mut trackers = trackers_for(&plan.stats_columns);
    let mut count = 0;

    for row in rows {
        let record = row?;
        count += 1;

        if let Some(value) = add_to_group(
            &mut per_group,
            &record,
            &plan.group_column,
            &plan.value_column,
        )? {
            total += value;
        }
        observe_stats(&mut trackers, &record)?;
    }

    Ok(FileSummary {
        rows: count,
        total,
        per_group,
        stats: snapshots(&trackers),
    })
}

fn add_to_group(
    groups: &mut AggregateResult,
    record: &Record,
    group_column: &str,
    value_column: &str,
) -> Result<Option<f64>> {
    let key = field(record, group_column)?;
    let Some(value) = coerce_number(field(record, value_column)?) else {
        return Ok(None);
    };

    match groups.get_mut(key) {
        Some(bucket) => *bucket += value,
        None => {
            groups.insert(key.to_string(), value);
        }
    }
    Ok(Some(value))
}

fn trackers_for<S: AsRef<str>>(columns: &[S]) -> IndexMap<String, RunningStats> {
    columns
        .iter()
        .map(|column| (column.as_ref().to_string(), RunningStats::new()))
        .collect()
}

fn observe_stats(trackers: &mut IndexMap<String, RunningStats>, record: &Record) -> Result<()> {
    for (column, stats) in trackers.iter_mut() {
        stats.update(field(record, column)?);
    }
    Ok(())
}

fn snapshots(trackers: &IndexMap<String, RunningStats>) -> IndexMap<String, StatsSnapshot> {
    trackers
        .iter()
        .map(|(column, stats)| (column.clone(), stats.snapshot()))
        .collect()
}
