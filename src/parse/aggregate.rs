use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single cell in a statistics record.
///
/// Cells start life as the raw text the gateway sent and only become numbers
/// once a second row for the same identity forces accumulation. `Text("5")`
/// and `Number(5.0)` serialize differently, so callers doing arithmetic
/// should go through [`Value::as_f64`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    /// Numeric view of a cell. Non-numeric text coerces to zero, matching the
    /// source's implicit numeric context.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
            Value::Number(n) => *n,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}

/// One record per identity value, each mapping header name to cell value.
pub type StatsTable = BTreeMap<String, BTreeMap<String, Value>>;

/// A summary metric: count and percent, kept in their original textual form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetric {
    pub count: String,
    pub percent: String,
}

pub type SummaryTable = BTreeMap<String, SummaryMetric>;

/// Percent placeholder the gateway emits for "not applicable"; reads as 100%.
const PERCENT_PLACEHOLDER: &str = "--";

/// Columns merged by keeping the lexicographic maximum. The feed's timestamps
/// are zero-padded and sort correctly as text, so no datetime parsing is done.
const LATEST_COLUMNS: &[&str] = &["end_timestamp", "end_date"];

/// Columns merged by keeping the lexicographic minimum.
const EARLIEST_COLUMNS: &[&str] = &["begin_timestamp", "begin_date"];

/// Descriptive identity columns: last-seen value wins, never summed.
const OVERWRITE_COLUMNS: &[&str] = &["sender_domain", "orig_value", "internal_user"];

/// Merge statistics rows into one record per identity value.
///
/// Rows sharing an identity are rolled up column by column: begin/end
/// timestamp columns take the union window (earliest begin, latest end),
/// descriptive columns take the last-seen value, and everything else
/// accumulates numerically. The first row to touch a cell stores its raw
/// text verbatim, and the identity column itself always holds the key text.
///
/// Zero rows is a valid empty result. A missing identity column is a
/// configuration error, not a silent fallback.
pub fn aggregate_statistics(
    headers: &[String],
    rows: &[Vec<String>],
    identity_column: &str,
) -> Result<StatsTable> {
    let mut table = StatsTable::new();
    if rows.is_empty() {
        return Ok(table);
    }

    let identity_index = headers
        .iter()
        .position(|h| h == identity_column)
        .ok_or_else(|| {
            anyhow!(
                "identity column `{}` not found in report headers {:?}",
                identity_column,
                headers
            )
        })?;

    for row in rows {
        let key = row.get(identity_index).cloned().unwrap_or_default();
        let record = table.entry(key).or_default();
        for (index, (header, cell)) in headers.iter().zip(row.iter()).enumerate() {
            if index == identity_index {
                // The key cell is the record's identity, never an accumulator.
                record.insert(header.clone(), Value::Text(cell.clone()));
            } else {
                merge_cell(record, header, cell);
            }
        }
    }

    Ok(table)
}

fn merge_cell(record: &mut BTreeMap<String, Value>, header: &str, cell: &str) {
    let existing = match record.get(header) {
        None => {
            record.insert(header.to_string(), Value::Text(cell.to_string()));
            return;
        }
        Some(v) => v,
    };

    let merged = if LATEST_COLUMNS.contains(&header) {
        match existing.as_str() {
            Some(old) if old.as_bytes() >= cell.as_bytes() => return,
            _ => Value::Text(cell.to_string()),
        }
    } else if EARLIEST_COLUMNS.contains(&header) {
        match existing.as_str() {
            Some(old) if old.as_bytes() <= cell.as_bytes() => return,
            _ => Value::Text(cell.to_string()),
        }
    } else if OVERWRITE_COLUMNS.contains(&header) {
        Value::Text(cell.to_string())
    } else {
        Value::Number(existing.as_f64() + cell.trim().parse::<f64>().unwrap_or(0.0))
    };

    record.insert(header.to_string(), merged);
}

/// Flatten a summary report's fixed three-line layout into named metrics.
///
/// The caller has already validated the line count; this takes the percent
/// and count rows positionally. The `--` percent placeholder becomes the
/// literal `100`; every other token passes through unchanged.
pub fn aggregate_summary(
    headers: &[String],
    percent_row: &[String],
    count_row: &[String],
) -> SummaryTable {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let raw_percent = percent_row.get(i).map(String::as_str).unwrap_or_default();
            let percent = if raw_percent == PERCENT_PLACEHOLDER {
                "100".to_string()
            } else {
                raw_percent.to_string()
            };
            let count = count_row.get(i).cloned().unwrap_or_default();
            (header.clone(), SummaryMetric { count, percent })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::csv::tokenize;

    fn stats(payload: &str, identity: &str) -> Result<StatsTable> {
        let (headers, rows) = tokenize(payload);
        aggregate_statistics(&headers, &rows, identity)
    }

    #[test]
    fn distinct_identities_stay_separate() {
        let table = stats("a,b\n1,2\n3,4\n", "a").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["1"]["a"], Value::Text("1".into()));
        assert_eq!(table["1"]["b"].as_f64(), 2.0);
        assert_eq!(table["3"]["b"].as_f64(), 4.0);
    }

    #[test]
    fn shared_identity_sums_numeric_columns() {
        let table = stats("a,b\n1,2\n1,3\n", "a").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["1"]["b"], Value::Number(5.0));
        // The key column keeps its text value instead of summing itself.
        assert_eq!(table["1"]["a"], Value::Text("1".into()));
    }

    #[test]
    fn sum_is_conserved_across_many_rows() {
        let table = stats("a,n\nk,1\nk,2\nk,3\nk,4\n", "a").unwrap();
        assert_eq!(table["k"]["n"].as_f64(), 10.0);
    }

    #[test]
    fn begin_date_keeps_earliest() {
        let table = stats(
            "sender_domain,begin_date,count\nx.com,2020-01-02,1\nx.com,2020-01-01,1\n",
            "sender_domain",
        )
        .unwrap();
        assert_eq!(table["x.com"]["begin_date"], Value::Text("2020-01-01".into()));
    }

    #[test]
    fn end_timestamp_keeps_latest() {
        let table = stats(
            "sender_domain,begin_timestamp,end_timestamp\n\
             x.com,2020-01-01 00:00,2020-01-01 01:00\n\
             x.com,2020-01-01 02:00,2020-01-01 03:00\n",
            "sender_domain",
        )
        .unwrap();
        let record = &table["x.com"];
        assert_eq!(record["begin_timestamp"], Value::Text("2020-01-01 00:00".into()));
        assert_eq!(record["end_timestamp"], Value::Text("2020-01-01 03:00".into()));
    }

    #[test]
    fn descriptive_columns_overwrite_not_sum() {
        let table = stats(
            "internal_user,orig_value,hits\nu@x.com,first,1\nu@x.com,second,1\n",
            "internal_user",
        )
        .unwrap();
        let record = &table["u@x.com"];
        assert_eq!(record["orig_value"], Value::Text("second".into()));
        assert_eq!(record["hits"], Value::Number(2.0));
    }

    #[test]
    fn non_numeric_cells_coerce_to_zero_when_summed() {
        let table = stats("a,b\n1,n/a\n1,3\n", "a").unwrap();
        assert_eq!(table["1"]["b"], Value::Number(3.0));
    }

    #[test]
    fn empty_payload_is_an_empty_result() {
        let table = stats("", "sender_domain").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn missing_identity_column_is_an_error() {
        let err = stats("a,b\n1,2\n", "sender_domain").unwrap_err();
        assert!(err.to_string().contains("sender_domain"));
    }

    #[test]
    fn summary_substitutes_percent_placeholder() {
        let (headers, rows) = tokenize("x,y\n--,50\n10,20\n");
        let table = aggregate_summary(&headers, &rows[0], &rows[1]);
        assert_eq!(
            table["x"],
            SummaryMetric {
                count: "10".into(),
                percent: "100".into()
            }
        );
        assert_eq!(
            table["y"],
            SummaryMetric {
                count: "20".into(),
                percent: "50".into()
            }
        );
    }

    #[test]
    fn summary_passes_other_tokens_through() {
        let (headers, rows) = tokenize("clean,spam\n98.2,1.8\n4910,90\n");
        let table = aggregate_summary(&headers, &rows[0], &rows[1]);
        assert_eq!(table["clean"].percent, "98.2");
        assert_eq!(table["spam"].count, "90");
    }
}
