use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use miette::Diagnostic;
use serde::Deserialize;
use tracing::debug;

/// Overrides where configuration and the stored token live.
pub(crate) const CONFIG_DIR_VAR: &str = "RELEASE_TRIGGER_CONFIG_DIR";
/// A token here is used for the session instead of the stored one, and never written to disk.
pub(crate) const TOKEN_VAR: &str = "GITHUB_TOKEN";
const APP_DIR_NAME: &str = "release-trigger";
const CONFIG_FILE_NAME: &str = "config.toml";

pub(crate) const DEFAULT_API_URL: &str = "https://api.github.com";
pub(crate) const DEFAULT_WORKFLOW: &str = "changeset-release.yml";
pub(crate) const DEFAULT_REFERENCE: &str = "develop";
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

/// Settings for talking to GitHub, loaded from `config.toml` in the config directory.
///
/// Every field is optional in the file, anything left out falls back to the defaults.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the GitHub REST API.
    pub api_url: String,
    /// File name of the workflow to dispatch, also used to decide which repos are eligible.
    pub workflow: String,
    /// The branch the workflow is dispatched against.
    pub reference: String,
    /// How long organization and repository lookups stay fresh.
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            workflow: DEFAULT_WORKFLOW.to_string(),
            reference: DEFAULT_REFERENCE.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl AppConfig {
    /// Load the config from `dir`, using defaults if there is no config file.
    ///
    /// ## Errors
    /// 1. The file exists but can't be read
    /// 2. The file isn't valid TOML for this struct
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(CONFIG_FILE_NAME);
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} found, using default config", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(Error::Read { path, source }),
        };
        toml::from_str(&source).map_err(|source| Error::Parse {
            path,
            source: Box::new(source),
        })
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// The repository path whose presence marks a repo as able to run the release workflow.
    #[must_use]
    pub fn workflow_path(&self) -> String {
        format!(".github/workflows/{}", self.workflow)
    }
}

/// The directory holding `config.toml` and the stored token.
///
/// ## Errors
/// The platform has no config directory and none was set explicitly.
pub fn config_dir() -> Result<PathBuf, Error> {
    if let Some(dir) = env::var_os(CONFIG_DIR_VAR).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(Error::NoConfigDir)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Could not find a configuration directory")]
    #[diagnostic(
        code(app_config::no_config_dir),
        help("Set the RELEASE_TRIGGER_CONFIG_DIR environment variable to choose one.")
    )]
    NoConfigDir,
    #[error("Could not read {path}")]
    #[diagnostic(code(app_config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse {path}")]
    #[diagnostic(
        code(app_config::parse),
        help(
            "The allowed keys are api_url, workflow, reference and cache_ttl_secs, all optional."
        )
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}
