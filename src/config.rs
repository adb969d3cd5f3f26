use std::env;
use std::str::FromStr;

use crate::client::SitesClientConfig;
use crate::search::ElasticsearchConfig;

pub const DEFAULT_APPLICATION_NAME: &str = "patientServiceApp";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    /// Prefix of the `X-{name}-alert` response headers.
    pub application_name: String,
    /// Unset means the in-process search index.
    pub elasticsearch_url: Option<String>,
    pub elasticsearch_index_prefix: String,
    pub elasticsearch_username: Option<String>,
    pub elasticsearch_password: Option<String>,
    pub dms_name: String,
    pub dms_url: String,
    pub dms_username: Option<String>,
    pub dms_password: Option<String>,
    pub dms_timeout_secs: u64,
    pub dms_provision_sites: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or("DATABASE_URL must be set")?;

        Ok(Config {
            database_url,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&get, "SERVER_PORT", 8081)?,
            application_name: get("APPLICATION_NAME")
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string()),
            elasticsearch_url: get("ELASTICSEARCH_URL"),
            elasticsearch_index_prefix: get("ELASTICSEARCH_INDEX_PREFIX").unwrap_or_default(),
            elasticsearch_username: get("ELASTICSEARCH_USERNAME"),
            elasticsearch_password: get("ELASTICSEARCH_PASSWORD"),
            dms_name: get("DMS_CORE_NAME").unwrap_or_else(|| "dmsCore".to_string()),
            dms_url: get("DMS_CORE_URL").unwrap_or_else(|| {
                "http://localhost:8080/alfresco/api/-default-/public/alfresco/versions/1"
                    .to_string()
            }),
            dms_username: get("DMS_CORE_USERNAME"),
            dms_password: get("DMS_CORE_PASSWORD"),
            dms_timeout_secs: parse_or(&get, "DMS_CORE_TIMEOUT_SECS", 30)?,
            dms_provision_sites: parse_bool_or(&get, "DMS_PROVISION_SITES", false)?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn elasticsearch(&self) -> Option<ElasticsearchConfig> {
        self.elasticsearch_url.as_ref().map(|url| ElasticsearchConfig {
            url: url.clone(),
            index_prefix: self.elasticsearch_index_prefix.clone(),
            username: self.elasticsearch_username.clone(),
            password: self.elasticsearch_password.clone(),
            ..Default::default()
        })
    }

    pub fn sites_client(&self) -> SitesClientConfig {
        SitesClientConfig {
            name: self.dms_name.clone(),
            url: self.dms_url.clone(),
            username: self.dms_username.clone(),
            password: self.dms_password.clone(),
            timeout_secs: self.dms_timeout_secs,
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {}: {}", key, e)),
        None => Ok(default),
    }
}

fn parse_bool_or(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, String> {
    match get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no") => Ok(false),
        Some(v) => Err(format!("Invalid {}: expected a boolean, got '{}'", key, v)),
    }
}
