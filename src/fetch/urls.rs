use crate::config::GatewayConfig;
use crate::report::{DateRange, ReportEntry};
use anyhow::{anyhow, Result};
use url::Url;

/// Path of the CSV report endpoint on the gateway.
const REPORT_PATH: &str = "/report";

/// Build the authenticated report URL: credentials in the userinfo section,
/// CSV format selector, report query/definition identifiers, and the
/// date-range selector as query parameters.
pub fn build_report_url(
    config: &GatewayConfig,
    entry: &ReportEntry,
    range: DateRange,
) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}://{}{}",
        config.protocol.scheme(),
        config.host,
        REPORT_PATH
    ))?;

    url.set_username(&config.username)
        .map_err(|_| anyhow!("cannot set username on {}", config.host))?;
    url.set_password(Some(&config.password))
        .map_err(|_| anyhow!("cannot set password on {}", config.host))?;
    if let Some(port) = config.port {
        url.set_port(Some(port))
            .map_err(|_| anyhow!("cannot set port on {}", config.host))?;
    }

    url.query_pairs_mut()
        .append_pair("format", "csv")
        .append_pair("date_range", range.as_query_value())
        .append_pair("report_query_id", entry.query_id)
        .append_pair("report_def_id", entry.definition_id);

    Ok(url)
}
