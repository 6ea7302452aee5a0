//! `virtime.toml` loading.
//!
//! ```toml
//! jobs = 4
//! strict = false
//! format = "go"
//!
//! [virtual_time]
//! path = "github.com/petar/vitamix/vtime"
//! name = "vtime"
//!
//! [wall_clock]
//! path = "time"
//! ```
//!
//! Every key is optional. Command-line flags override what is read here.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::domain::imports::{Facilities, Facility};

pub const CONFIG_FILE: &str = "virtime.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Go,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "go" => Ok(OutputFormat::Go),
            other => bail!("unknown output format {:?} (expected json or go)", other),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Go => f.write_str("go"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    jobs: Option<usize>,
    strict: Option<bool>,
    format: Option<String>,
    virtual_time: Option<RawFacility>,
    wall_clock: Option<RawFacility>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFacility {
    path: Option<String>,
    name: Option<String>,
}

impl RawFacility {
    /// Overlays the configured keys on `default`. A new path without a name
    /// binds the path's last segment.
    fn resolve(self, default: Facility) -> Facility {
        match (self.path, self.name) {
            (None, None) => default,
            (None, Some(name)) => Facility {
                path: default.path,
                name,
            },
            (Some(path), name) => Facility::new(path, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RewriteConfig {
    pub jobs: Option<usize>,
    pub strict: bool,
    pub format: OutputFormat,
    pub facilities: Facilities,
}

impl RewriteConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).context("Invalid virtime configuration")?;
        let defaults = Facilities::default();
        let format = match raw.format {
            Some(format) => format.parse()?,
            None => OutputFormat::default(),
        };
        if raw.jobs == Some(0) {
            bail!("jobs must be at least 1");
        }
        Ok(Self {
            jobs: raw.jobs,
            strict: raw.strict.unwrap_or(false),
            format,
            facilities: Facilities {
                virtual_time: raw.virtual_time.unwrap_or_default().resolve(defaults.virtual_time),
                wall_clock: raw.wall_clock.unwrap_or_default().resolve(defaults.wall_clock),
            },
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to load config {}", path.display()))
    }

    /// Loads `path` when given, else `virtime.toml` in the working directory
    /// if present, else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::load(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }
}
