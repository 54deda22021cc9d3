//! Configuration for the bibformat tools.
//!
//! Layers, later ones winning:
//!
//! 1. built-in defaults,
//! 2. one configuration file: the path given explicitly, or else the first
//!    `bibformat.{toml,yaml,yml,json}` found in the working directory or
//!    the platform configuration directory,
//! 3. `BIBFORMAT_*` environment variables, with `__` separating nested
//!    keys (`BIBFORMAT_INSTITUTIONAL__NAME=DESY`).

pub mod error;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use bibformat_elements::{Categorizer, InstitutionalRules};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "BIBFORMAT_";
pub const FILE_STEM: &str = "bibformat";
const EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the site; links starting with it point at managed files.
    pub site_url: String,
    /// Where named XSLT templates are looked up.
    pub templates_path: PathBuf,
    /// Sort institutional links into their own list.
    pub institutional_site: bool,
    pub institutional: Institutional,
    /// Description of full texts that have none.
    pub fulltext_label: String,
}

impl Default for Config {
    fn default() -> Self {
        let templates_path = match ProjectDirs::from("ch", "cern", FILE_STEM) {
            Some(dirs) => dirs.data_dir().join("templates"),
            None => PathBuf::from("templates"),
        };
        Self {
            site_url: "http://localhost".to_string(),
            templates_path,
            institutional_site: false,
            institutional: Institutional::default(),
            fulltext_label: "Fulltext".to_string(),
        }
    }
}

/// See [`InstitutionalRules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Institutional {
    pub name: String,
    pub domain_marker: String,
    pub exempt_host_markers: Vec<String>,
    pub exempt_url_markers: Vec<String>,
}

impl Default for Institutional {
    fn default() -> Self {
        InstitutionalRules::default().into()
    }
}
impl From<InstitutionalRules> for Institutional {
    fn from(rules: InstitutionalRules) -> Self {
        Self {
            name: rules.name,
            domain_marker: rules.domain_marker,
            exempt_host_markers: rules.exempt_host_markers,
            exempt_url_markers: rules.exempt_url_markers,
        }
    }
}
impl From<&Institutional> for InstitutionalRules {
    fn from(config: &Institutional) -> Self {
        Self {
            name: config.name.clone(),
            domain_marker: config.domain_marker.clone(),
            exempt_host_markers: config.exempt_host_markers.clone(),
            exempt_url_markers: config.exempt_url_markers.clone(),
        }
    }
}

impl Config {
    /// Loads and validates the layered configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// The layered providers, without extracting them.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match explicit {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.display().to_string())),
            Some(path) => Some(path.to_path_buf()),
            None => candidate_files().into_iter().find(|path| path.is_file()),
        };
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "using configuration file");
            figment = merge_file(figment, &path)?;
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Invalid("could not read configuration".into()))?;
        config.validated()
    }

    /// Checks the site URL and strips its trailing slash.
    pub fn validated(mut self) -> Result<Self> {
        let site_url = self.site_url.trim().trim_end_matches('/');
        if site_url.is_empty() {
            exn::bail!(ErrorKind::Invalid("site_url must not be empty".into()));
        }
        let parsed = url::Url::parse(site_url)
            .or_raise(|| ErrorKind::Invalid(format!("site_url is not an absolute URL: {site_url}")))?;
        if parsed.cannot_be_a_base() {
            exn::bail!(ErrorKind::Invalid(format!("site_url must be a hierarchical URL: {site_url}")));
        }
        self.site_url = site_url.to_string();
        if self.fulltext_label.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("fulltext_label must not be empty".into()));
        }
        Ok(self)
    }

    /// A categorizer for this site.
    pub fn categorizer(&self) -> Categorizer {
        Categorizer::new(&self.site_url)
            .with_fulltext_label(&self.fulltext_label)
            .with_institutional_rules((&self.institutional).into())
    }
}

fn candidate_files() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(project) = ProjectDirs::from("ch", "cern", FILE_STEM) {
        dirs.push(project.config_dir().to_path_buf());
    }
    dirs.iter()
        .flat_map(|dir| EXTENSIONS.map(|extension| dir.join(format!("{FILE_STEM}.{extension}"))))
        .collect()
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    Ok(match path.extension().and_then(OsStr::to_str) {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
    })
}
