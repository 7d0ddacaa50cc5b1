use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Addresses of the hosted workflows.
///
/// Each workflow is a separate HTTP trigger with its own signed URL, so there
/// is no common base address. The URLs already carry a query string; request
/// parameters get appended to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub register: Url,
    pub login: Url,
    pub journal_create: Url,
    pub journal_list: Url,
    pub journal_get: Url,
    pub journal_update: Url,
    pub journal_delete: Url,
    pub media_upload: Url,
}

/// Client configuration: endpoints plus request deadlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub endpoints: Endpoints,
    /// Deadline for plain reads and writes.
    #[serde(default = "ApiConfig::default_request_timeout", with = "secs")]
    pub request_timeout: Duration,
    /// Deadline for calls carrying encoded media (create, update, upload).
    #[serde(default = "ApiConfig::default_upload_timeout", with = "secs")]
    pub upload_timeout: Duration,
}

impl ApiConfig {
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

    fn default_request_timeout() -> Duration {
        Self::DEFAULT_REQUEST_TIMEOUT
    }

    fn default_upload_timeout() -> Duration {
        Self::DEFAULT_UPLOAD_TIMEOUT
    }

    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: Self::DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `FLAVOR_API_REGISTER`, `FLAVOR_API_LOGIN`
    /// - `FLAVOR_API_JOURNAL_CREATE`, `FLAVOR_API_JOURNAL_LIST`, `FLAVOR_API_JOURNAL_GET`,
    ///   `FLAVOR_API_JOURNAL_UPDATE`, `FLAVOR_API_JOURNAL_DELETE`
    /// - `FLAVOR_API_MEDIA_UPLOAD`
    ///
    /// Optional env vars:
    /// - `FLAVOR_API_TIMEOUT_SECS`: request deadline (default: 60)
    /// - `FLAVOR_API_UPLOAD_TIMEOUT_SECS`: upload deadline (default: 300)
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoints = Endpoints {
            register: url_from_env("FLAVOR_API_REGISTER")?,
            login: url_from_env("FLAVOR_API_LOGIN")?,
            journal_create: url_from_env("FLAVOR_API_JOURNAL_CREATE")?,
            journal_list: url_from_env("FLAVOR_API_JOURNAL_LIST")?,
            journal_get: url_from_env("FLAVOR_API_JOURNAL_GET")?,
            journal_update: url_from_env("FLAVOR_API_JOURNAL_UPDATE")?,
            journal_delete: url_from_env("FLAVOR_API_JOURNAL_DELETE")?,
            media_upload: url_from_env("FLAVOR_API_MEDIA_UPLOAD")?,
        };

        let request_timeout = std::env::var("FLAVOR_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_REQUEST_TIMEOUT);

        let upload_timeout = std::env::var("FLAVOR_API_UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_UPLOAD_TIMEOUT);

        Ok(Self {
            endpoints,
            request_timeout,
            upload_timeout,
        })
    }

    /// Load configuration from a `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Default location of the config file: `<config dir>/flavor/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flavor").join("config.json"))
    }
}

fn url_from_env(var: &'static str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).map_err(|_| ConfigError::MissingEnv { var })?;
    Url::parse(&raw).map_err(|e| ConfigError::UrlParse {
        url: raw,
        message: e.to_string(),
    })
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_with_default_timeouts() {
        let config: ApiConfig = serde_json::from_value(json!({
            "endpoints": {
                "register": "https://flows.test/register?sig=a",
                "login": "https://flows.test/login?sig=b",
                "journalCreate": "https://flows.test/create?sig=c",
                "journalList": "https://flows.test/list?sig=d",
                "journalGet": "https://flows.test/get?sig=e",
                "journalUpdate": "https://flows.test/update?sig=f",
                "journalDelete": "https://flows.test/delete?sig=g",
                "mediaUpload": "https://flows.test/upload?sig=h"
            }
        }))
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.upload_timeout, Duration::from_secs(300));
        assert_eq!(config.endpoints.login.path(), "/login");
    }

    #[test]
    fn rejects_non_json_files() {
        let err = ApiConfig::from_file("config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }
}
