use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub converter: ConverterConfig,
    pub upload: UploadConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Which conversion engine sits behind the converter adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// External `markitdown` program (plugins disabled)
    MarkItDown,
    /// In-process PDF and spreadsheet extraction
    Native,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markitdown" => Ok(BackendKind::MarkItDown),
            "native" => Ok(BackendKind::Native),
            other => Err(anyhow!(
                "unknown converter backend '{}', expected 'markitdown' or 'native'",
                other
            )),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::MarkItDown => write!(f, "markitdown"),
            BackendKind::Native => write!(f, "native"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub backend: BackendKind,
    pub markitdown_bin: String,
    pub timeout_secs: u64,
    /// Directory for the per-call temporary files; `None` means the system default.
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            converter: ConverterConfig {
                backend: BackendKind::MarkItDown,
                markitdown_bin: "markitdown".to_string(),
                timeout_secs: 120,
                temp_dir: None,
            },
            upload: UploadConfig {
                max_upload_bytes: 200 * 1024 * 1024,
            },
            session: SessionConfig {
                idle_timeout_secs: 86_400,
                sweep_interval_secs: 300,
            },
        }
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid value for {}: '{}' ({})", name, raw, e))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", "3000")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            converter: ConverterConfig {
                backend: parse_var("CONVERTER_BACKEND", "markitdown")?,
                markitdown_bin: env::var("MARKITDOWN_BIN")
                    .unwrap_or_else(|_| "markitdown".to_string()),
                timeout_secs: parse_var("CONVERSION_TIMEOUT_SECS", "120")?,
                temp_dir: env::var("TEMP_DIR")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
            },
            upload: UploadConfig {
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "209715200")?,
            },
            session: SessionConfig {
                idle_timeout_secs: parse_var("SESSION_IDLE_TIMEOUT_SECS", "86400")?,
                sweep_interval_secs: parse_var("SESSION_SWEEP_INTERVAL_SECS", "300")?,
            },
        })
    }
}
