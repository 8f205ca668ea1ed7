//! Configuration management for the prediction API

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable that overrides the configuration file location
pub const CONFIG_PATH_ENV: &str = "OBESITY_API_CONFIG";

/// Prefix for per-key environment overrides (`OBESITY_API__SERVER__PORT`)
const ENV_PREFIX: &str = "OBESITY_API";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (all interfaces by default)
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ServerConfig {
    /// Resolve the bind address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Trained artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory containing the exported artifacts
    pub dir: String,
    /// Classifier file (`.json` export or `.onnx` graph)
    pub classifier: String,
    /// Fitted feature scaler
    pub scaler: String,
    /// Per-column categorical encoders
    pub label_encoders: String,
    /// Target label encoder
    pub target_encoder: String,
    /// Model metadata document
    pub metadata: String,
    /// Number of intra-op threads for the ONNX backend
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

impl ArtifactsConfig {
    /// Artifacts rooted at `dir` with the default file names
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().display().to_string(),
            ..Self::default()
        }
    }

    pub fn classifier_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.classifier)
    }

    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.scaler)
    }

    pub fn label_encoders_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.label_encoders)
    }

    pub fn target_encoder_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.target_encoder)
    }

    pub fn metadata_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.metadata)
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "models".to_string(),
            classifier: "obesity_model.json".to_string(),
            scaler: "scaler.json".to_string(),
            label_encoders: "label_encoders.json".to_string(),
            target_encoder: "target_encoder.json".to_string(),
            metadata: "model_metadata.json".to_string(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between periodic summaries (0 disables the reporter)
    pub report_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default location, honoring `OBESITY_API_CONFIG`
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// Layers, lowest precedence first: built-in defaults, the file (optional),
    /// `OBESITY_API__*` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = AppConfig::default();
        let config = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("artifacts.dir", defaults.artifacts.dir)?
            .set_default("artifacts.classifier", defaults.artifacts.classifier)?
            .set_default("artifacts.scaler", defaults.artifacts.scaler)?
            .set_default("artifacts.label_encoders", defaults.artifacts.label_encoders)?
            .set_default("artifacts.target_encoder", defaults.artifacts.target_encoder)?
            .set_default("artifacts.metadata", defaults.artifacts.metadata)?
            .set_default("artifacts.onnx_threads", defaults.artifacts.onnx_threads as i64)?
            .set_default(
                "metrics.report_interval_secs",
                defaults.metrics.report_interval_secs as i64,
            )?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            artifacts: ArtifactsConfig::default(),
            metrics: MetricsConfig {
                report_interval_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.artifacts.dir, "models");
        assert_eq!(
            config.artifacts.metadata_path(),
            Path::new("models").join("model_metadata.json")
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.artifacts.onnx_threads, 1);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[artifacts]\ndir = \"/srv/models\"\nclassifier = \"model.onnx\""
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.artifacts.classifier_path(),
            Path::new("/srv/models").join("model.onnx")
        );
        assert_eq!(config.artifacts.scaler, "scaler.json");
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig::default();
        assert_eq!(config.server.socket_addr().unwrap().port(), 5000);
    }
}
