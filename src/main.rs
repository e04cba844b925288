use anyhow::{bail, Context, Result};
use mailgate_reports::{
    client::ReportClient,
    config::GatewayConfig,
    report::{DateRange, Registry},
};
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) parse args ───────────────────────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    let raw = args.iter().any(|a| a == "--raw");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let registry = Registry::builtin();
    let report_name = match positional.first() {
        Some(name) => name.as_str(),
        None => {
            let names: Vec<&str> = registry.names().collect();
            bail!(
                "usage: mailgate-reports <report> [current_hour|current_day] [--raw]\n\
                 reports: {}",
                names.join(", ")
            );
        }
    };
    let range = match positional.get(1) {
        Some(s) => s.parse::<DateRange>()?,
        None => DateRange::CurrentDay,
    };

    // ─── 3) build client from env config ─────────────────────────────
    let config = GatewayConfig::from_env().context("loading gateway config from MAILGATE_* env")?;
    let client = ReportClient::new(config, registry);

    // ─── 4) fetch and print ──────────────────────────────────────────
    info!(report = %report_name, range = %range, raw, "fetching");
    if raw {
        let report = client.fetch_raw(report_name, range).await?;
        print!("{}", report.csv);
    } else {
        let data = client.fetch_report(report_name, range).await?;
        println!("{}", serde_json::to_string_pretty(&data)?);
    }

    info!("done");
    Ok(())
}
