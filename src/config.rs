use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::header::{HeaderCatalog, SemanticField};
use crate::sheet::{LoadOptions, DEFAULT_HEADER_SEARCH_ROWS};

/// Config file picked up from the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "flightlog.yaml";
/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "FLIGHTLOG_CONFIG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Settings read from `flightlog.yaml`. Every key is optional; CLI flags win
/// over anything set here.
///
/// ```yaml
/// sheet: Logbook
/// header_search_rows: 10
/// preferred_pilot: Rafael Ascanio
/// format: json
/// extra_variants:
///   PIC: ["P1 Time", "Captain Time"]
///   PILOT_NAME: ["Aviator"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sheet: Option<String>,
    pub header_search_rows: Option<usize>,
    pub preferred_pilot: Option<String>,
    pub format: Option<OutputFormat>,
    /// Extra header spellings per field, tried after the built-in ones.
    pub extra_variants: BTreeMap<SemanticField, Vec<String>>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg: Config =
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// An explicit path must exist. Otherwise `$FLIGHTLOG_CONFIG`, then
    /// `./flightlog.yaml` if present, then defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::discover_from(explicit, from_env.as_deref(), Path::new(DEFAULT_CONFIG_FILE))
    }

    fn discover_from(explicit: Option<&Path>, from_env: Option<&Path>, fallback: &Path) -> Result<Self> {
        if let Some(path) = explicit.or(from_env) {
            return Self::load(path);
        }
        if fallback.is_file() {
            return Self::load(fallback);
        }
        debug!("no config file; using defaults");
        Ok(Self::default())
    }

    pub fn catalog(&self) -> HeaderCatalog {
        HeaderCatalog::with_extras(&self.extra_variants)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            sheet: self.sheet.clone(),
            header_search_rows: self
                .header_search_rows
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_HEADER_SEARCH_ROWS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_parse_full_config() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(
            tmp,
            "sheet: Logbook\n\
             header_search_rows: 5\n\
             preferred_pilot: Alice\n\
             format: yaml\n\
             extra_variants:\n  PIC: [\"P1 Time\"]\n"
        )?;
        let cfg = Config::load(tmp.path())?;
        assert_eq!(cfg.sheet.as_deref(), Some("Logbook"));
        assert_eq!(cfg.format, Some(OutputFormat::Yaml));
        assert_eq!(cfg.preferred_pilot.as_deref(), Some("Alice"));

        let opts = cfg.load_options();
        assert_eq!(opts.header_search_rows, 5);
        assert_eq!(opts.sheet.as_deref(), Some("Logbook"));

        let catalog = cfg.catalog();
        assert_eq!(
            catalog.get(SemanticField::Pic).variants.last().map(String::as_str),
            Some("P1 Time")
        );
        Ok(())
    }

    #[test]
    fn test_unknown_keys_are_rejected() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, "shet: Logbook\n")?;
        assert!(Config::load(tmp.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_discovery_order() -> Result<()> {
        let dir = tempdir()?;
        let fallback = dir.path().join(DEFAULT_CONFIG_FILE);

        let cfg = Config::discover_from(None, None, &fallback)?;
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.load_options().header_search_rows, DEFAULT_HEADER_SEARCH_ROWS);

        fs::write(&fallback, "preferred_pilot: Bob\n")?;
        let cfg = Config::discover_from(None, None, &fallback)?;
        assert_eq!(cfg.preferred_pilot.as_deref(), Some("Bob"));

        let env_file = dir.path().join("env.yaml");
        fs::write(&env_file, "preferred_pilot: Carol\n")?;
        let cfg = Config::discover_from(None, Some(&env_file), &fallback)?;
        assert_eq!(cfg.preferred_pilot.as_deref(), Some("Carol"));

        let missing = dir.path().join("missing.yaml");
        assert!(Config::discover_from(Some(&missing), Some(&env_file), &fallback).is_err());
        Ok(())
    }
}
