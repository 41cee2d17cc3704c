//! Resolver configuration: lookup endpoints, catalog parameters and timeouts.
//!
//! Defaults reproduce the production endpoints. A JSON file may override any
//! subset of fields; CLI flags override the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://itunes.apple.com/search";
pub const DEFAULT_LINK_LOOKUP_URL: &str = "https://findspot-xi.vercel.app/api";
pub const DEFAULT_VIDEO_LOOKUP_URL: &str = "https://ayushvid.vercel.app/api";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub catalog_url: String,
    pub country: String,
    pub media: String,
    pub entity: String,
    pub limit: u32,
    pub link_lookup_url: String,
    pub video_lookup_url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            country: "IN".to_string(),
            media: "music".to_string(),
            entity: "song".to_string(),
            limit: 10,
            link_lookup_url: DEFAULT_LINK_LOOKUP_URL.to_string(),
            video_lookup_url: DEFAULT_VIDEO_LOOKUP_URL.to_string(),
            connect_timeout_secs: 5,
            read_timeout_secs: 15,
        }
    }
}

impl ResolverConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, or the file's values when a path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Blocking HTTP agent shared by all lookups built from this config.
    pub fn http_agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout_connect(self.connect_timeout())
            .timeout_read(self.read_timeout())
            .timeout_write(self.read_timeout())
            .build()
    }
}
