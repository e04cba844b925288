use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Connection settings for the gateway's reporting interface.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

fn default_protocol() -> Protocol {
    Protocol::Https
}

impl GatewayConfig {
    /// Load settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load settings from `MAILGATE_*` environment variables.
    /// `MAILGATE_PORT` and `MAILGATE_PROTOCOL` are optional.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| env::var(name).with_context(|| format!("missing env var {}", name));

        let protocol = match env::var("MAILGATE_PROTOCOL") {
            Ok(s) if s.eq_ignore_ascii_case("http") => Protocol::Http,
            Ok(s) if s.eq_ignore_ascii_case("https") => Protocol::Https,
            Ok(s) => bail!("invalid MAILGATE_PROTOCOL `{}` (expected http or https)", s),
            Err(_) => Protocol::Https,
        };
        let port = match env::var("MAILGATE_PORT") {
            Ok(s) => Some(s.parse().context("parsing MAILGATE_PORT")?),
            Err(_) => None,
        };

        Ok(GatewayConfig {
            host: var("MAILGATE_HOST")?,
            port,
            protocol,
            username: var("MAILGATE_USERNAME")?,
            password: var("MAILGATE_PASSWORD")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_json_config() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"host": "mga.example.com", "username": "admin", "password": "s3cret"}}"#
        )?;
        let config = GatewayConfig::from_file(file.path())?;
        assert_eq!(config.host, "mga.example.com");
        assert_eq!(config.protocol, Protocol::Https);
        assert_eq!(config.port, None);
        Ok(())
    }

    #[test]
    fn explicit_protocol_and_port() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"host": "h", "port": 8080, "protocol": "http", "username": "u", "password": "p"}}"#
        )?;
        let config = GatewayConfig::from_file(file.path())?;
        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.port, Some(8080));
        Ok(())
    }

    #[test]
    fn rejects_misspelled_env_protocol() {
        env::set_var("MAILGATE_HOST", "mga.example.com");
        env::set_var("MAILGATE_USERNAME", "admin");
        env::set_var("MAILGATE_PASSWORD", "s3cret");
        env::set_var("MAILGATE_PROTOCOL", "htttps");
        let err = GatewayConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("MAILGATE_PROTOCOL"));
        env::remove_var("MAILGATE_PROTOCOL");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = GatewayConfig::from_file("/nonexistent/mailgate.json").unwrap_err();
        assert!(err.to_string().contains("mailgate.json"));
    }
}
