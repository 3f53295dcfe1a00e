use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const ENV_DATABASE: &str = "PICOCMS_DATABASE";
pub const ENV_SOURCE_PAGES: &str = "PICOCMS_SOURCE_PAGES";
pub const ENV_SOURCE_DATA: &str = "PICOCMS_SOURCE_DATA";

/// Fully resolved settings needed to open a [`crate::Cms`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmsConfig {
    /// SQLite database file
    pub database: PathBuf,
    /// Root of the page (front-matter) tree
    pub pages: PathBuf,
    /// Root of the JSON document tree
    pub data: PathBuf,
}

impl CmsConfig {
    pub fn new(
        database: impl Into<PathBuf>,
        pages: impl Into<PathBuf>,
        data: impl Into<PathBuf>,
    ) -> Self {
        Self {
            database: database.into(),
            pages: pages.into(),
            data: data.into(),
        }
    }
}

/// One layer of configuration: `picocms.toml`, the environment or CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub database: Option<PathBuf>,
    pub pages: Option<PathBuf>,
    pub data: Option<PathBuf>,
}

impl ConfigFile {
    /// Read the `PICOCMS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            database: get(ENV_DATABASE),
            pages: get(ENV_SOURCE_PAGES),
            data: get(ENV_SOURCE_DATA),
        }
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: ConfigFile) -> ConfigFile {
        ConfigFile {
            database: other.database.or(self.database),
            pages: other.pages.or(self.pages),
            data: other.data.or(self.data),
        }
    }

    pub fn resolve(self) -> anyhow::Result<CmsConfig> {
        let pages = self.pages.ok_or_else(|| {
            anyhow::anyhow!("pages source root is not configured (set `pages` or {})", ENV_SOURCE_PAGES)
        })?;
        let data = self.data.ok_or_else(|| {
            anyhow::anyhow!("data source root is not configured (set `data` or {})", ENV_SOURCE_DATA)
        })?;

        Ok(CmsConfig {
            database: self.database.unwrap_or_else(default_database_path),
            pages,
            data,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("picocms.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("picocms.db")
}

/// Load `picocms.toml`. A missing default file is not an error; a missing
/// explicitly requested one is.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ConfigFile>> {
    let explicit = path.is_some();
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        if explicit {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ConfigFile, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
