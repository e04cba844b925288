use crate::config::GatewayConfig;
use crate::fetch::{self, urls::build_report_url};
use crate::parse::aggregate::{aggregate_statistics, aggregate_summary, StatsTable, SummaryTable};
use crate::parse::csv::tokenize;
use crate::report::{DateRange, Registry, ReportKind};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

/// A report body exactly as the gateway sent it.
#[derive(Debug, Clone, Serialize)]
pub struct RawReport {
    pub name: String,
    pub csv: String,
    pub fetched_at: DateTime<Utc>,
}

/// A parsed report, shaped by the report's kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    Statistics(StatsTable),
    Summary(SummaryTable),
}

/// Client for the gateway's reporting endpoint.
///
/// Holds the connection settings, the report catalog, and a shared HTTP
/// client. Each fetch is independent; no state is carried between calls, so
/// callers may issue several report fetches concurrently.
pub struct ReportClient {
    client: Client,
    config: GatewayConfig,
    registry: Registry,
}

impl ReportClient {
    pub fn new(config: GatewayConfig, registry: Registry) -> Self {
        ReportClient {
            client: Client::new(),
            config,
            registry,
        }
    }

    /// Fetch a report's CSV body without parsing it.
    pub async fn fetch_raw(&self, name: &str, range: DateRange) -> Result<RawReport> {
        let entry = self.registry.get(name)?;
        let url = build_report_url(&self.config, entry, range)?;

        let start = Instant::now();
        let csv = fetch::fetch_csv(&self.client, &url)
            .await
            .with_context(|| format!("fetching report `{}`", name))?;
        info!(name = %name, bytes = csv.len(), elapsed = ?start.elapsed(), "fetched report");

        Ok(RawReport {
            name: name.to_string(),
            csv,
            fetched_at: Utc::now(),
        })
    }

    /// Fetch a report and run it through the aggregation path its catalog
    /// entry names: identity-keyed merge for statistics reports, the fixed
    /// three-line metric table for summary reports.
    pub async fn fetch_report(&self, name: &str, range: DateRange) -> Result<ReportData> {
        let raw = self.fetch_raw(name, range).await?;
        self.parse_report(name, &raw.csv)
    }

    fn parse_report(&self, name: &str, csv: &str) -> Result<ReportData> {
        let entry = self.registry.get(name)?;
        match &entry.kind {
            ReportKind::Statistics { identity_column } => {
                let (headers, rows) = tokenize(csv);
                let table = aggregate_statistics(&headers, &rows, identity_column)
                    .with_context(|| format!("aggregating report `{}`", name))?;
                Ok(ReportData::Statistics(table))
            }
            ReportKind::Summary => {
                let (headers, rows) = tokenize(csv);
                if rows.len() < 2 {
                    bail!(
                        "malformed summary report `{}`: expected 3 lines (header, percents, counts), payload was {} bytes",
                        name,
                        csv.len()
                    );
                }
                Ok(ReportData::Summary(aggregate_summary(
                    &headers, &rows[0], &rows[1],
                )))
            }
        }
    }
}
