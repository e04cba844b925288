pub mod urls;

use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;
use url::Url;

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Fetch the CSV body at `url`, retrying transient failures.
///
/// A non-success status is surfaced as an error; the parser is never handed
/// an error body.
pub async fn fetch_csv(client: &Client, url: &Url) -> Result<String> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let resp = client.get(url.as_str()).send().await;
        match resp {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => return Ok(body),
                Err(_) if attempt < MAX_RETRIES => {
                    warn!(attempt, "failed to read report body; retrying");
                    sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            },
            Ok(resp) => return Err(anyhow!("HTTP error: {}", resp.status())),
            Err(_) if attempt < MAX_RETRIES => {
                warn!(attempt, "report request failed; retrying");
                sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
