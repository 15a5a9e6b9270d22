use crate::core::proxy::DEFAULT_MAX_BODY_BYTES;
use crate::core::resolver::build_time_default;
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::{
    validate_listen_addr, validate_path, validate_proxy_prefix, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Routes served next to the proxy; the prefix may not shadow them.
const RESERVED_PATHS: [&str; 2] = ["/api/settings", "/healthz"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub proxy_prefix: String,
    /// Largest request body the proxy buffers.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            proxy_prefix: "/api/proxy".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub default_url: Option<String>,
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./.console-proxy/settings.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `compact` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "compact".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConsoleError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConsoleError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads `path`; a missing file is only an error when it was asked for explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// 替換環境變數 (例如 ${API_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConsoleError::ConfigError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_listen_addr("server.listen", &self.server.listen)?;
        validate_proxy_prefix("server.proxy_prefix", &self.server.proxy_prefix)?;
        let prefix = self.server.proxy_prefix.as_str();
        if RESERVED_PATHS
            .iter()
            .any(|reserved| prefix == *reserved || prefix.starts_with(&format!("{}/", reserved)))
        {
            return Err(ConsoleError::ConfigError {
                field: "server.proxy_prefix".to_string(),
                message: format!("'{}' collides with a built-in route", prefix),
            });
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConsoleError::ConfigError {
                field: "server.max_body_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        validate_path("storage.path", &self.storage.path)?;

        if let Some(url) = self.api.default_url.as_deref().filter(|u| !u.is_empty()) {
            validate_url("api.default_url", url).map_err(|e| ConsoleError::ConfigError {
                field: "api.default_url".to_string(),
                message: e.to_string(),
            })?;
        }

        match self.logging.format.as_str() {
            "compact" | "json" => Ok(()),
            other => Err(ConsoleError::ConfigError {
                field: "logging.format".to_string(),
                message: format!("Unsupported format '{}'. Valid formats: compact, json", other),
            }),
        }
    }

    /// Deploy-time default from the file, else the one compiled into the binary.
    pub fn default_url(&self) -> Option<String> {
        self.api
            .default_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(build_time_default)
    }

    pub fn environment(&self) -> String {
        self.api.environment.clone().unwrap_or_else(|| {
            if cfg!(debug_assertions) {
                "development".to_string()
            } else {
                "production".to_string()
            }
        })
    }
}

impl Validate for ConsoleConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
