//! Layered settings: built-in defaults, then an optional config file, then
//! `RANKBOARD_*` environment variables (`__` separates nested keys, e.g.
//! `RANKBOARD_PARSER__SCRIPT`). `PORT` is honored last for compatibility
//! with existing launch scripts.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{BoardError, Result};
use crate::ingest::DEFAULT_MAX_UPLOAD_BYTES;
use crate::producer::ParserConfig;
use crate::resolve::RoleCandidates;
use crate::rules::ThresholdConfig;

pub const ENV_PREFIX: &str = "RANKBOARD";
pub const DEFAULT_CONFIG_NAME: &str = "rankboard";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: PathBuf,
    /// Scanned at boot for a spreadsheet when storage holds none.
    pub adopt_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Built dashboard bundle, served for unknown paths when present.
    pub client_dist: PathBuf,
    pub parser: ParserConfig,
    pub roles: RoleCandidates,
    pub thresholds: ThresholdConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5179,
            storage_dir: PathBuf::from("storage"),
            adopt_dir: PathBuf::from("."),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            client_dist: PathBuf::from("client/dist"),
            parser: ParserConfig::default(),
            roles: RoleCandidates::default(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl BoardConfig {
    /// Loads from `file` (required when given) or from an optional
    /// `rankboard.{toml,json,yaml}` in the working directory.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_port(file, std::env::var("PORT").ok())
    }

    /// Like [`BoardConfig::load`] with an explicit `PORT` value.
    pub fn load_with_port(file: Option<&Path>, port: Option<String>) -> Result<Self> {
        let source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let mut loaded: BoardConfig = Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()?;
        if let Some(port) = port {
            loaded.port = port
                .trim()
                .parse()
                .map_err(|_| BoardError::Config(format!("PORT is not a port number: {port}")))?;
        }
        Ok(loaded)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| BoardError::Config(format!("invalid listen address: {e}")))
    }
}
