//! Settings file and per-data-root files.
//!
//! `settings.toml` lives in the platform config dir and points at the data
//! root; everything else (records, templates, PDFs, `company.toml`) lives
//! under that root.

use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, StoreError};
use crate::model::CompanyProfile;
use crate::store::{FirebaseStore, LocalStore, QuoteStore};

pub const DEFAULT_DATA_ROOT: &str = "~/Documents/Orcamentos";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreSettings {
    #[default]
    Local,
    Firebase {
        database_url: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub data_root: String,
    #[serde(default = "default_typst")]
    pub typst: String,
    #[serde(default = "default_reveal")]
    pub reveal: bool,
    #[serde(default)]
    pub store: StoreSettings,
}

fn default_typst() -> String {
    "typst".to_string()
}

fn default_reveal() -> bool {
    true
}

impl AppSettings {
    pub fn new(data_root: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
            typst: default_typst(),
            reveal: default_reveal(),
            store: StoreSettings::default(),
        }
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("output")
    }

    pub fn template_dir(&self) -> PathBuf {
        self.root().join("templates")
    }

    pub fn company_path(&self) -> PathBuf {
        self.root().join("company.toml")
    }

    pub fn open_store(&self) -> Result<Box<dyn QuoteStore>, StoreError> {
        let store: Box<dyn QuoteStore> = match &self.store {
            StoreSettings::Local => Box::new(LocalStore::new(self.data_dir())),
            StoreSettings::Firebase { database_url } => Box::new(FirebaseStore::new(database_url)?),
        };
        Ok(store)
    }
}

pub fn config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "quote-maker", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no file");
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(value))
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let toml_str = toml::to_string_pretty(value)?;
    fs::write(path, toml_str).map_err(io_err)
}

pub fn load_settings_from(path: &Path) -> Result<Option<AppSettings>, ConfigError> {
    read_toml(path)
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<(), ConfigError> {
    write_toml(path, settings)
}

/// The operator's default company block, if one was saved.
pub fn load_company_profile(path: &Path) -> Result<Option<CompanyProfile>, ConfigError> {
    read_toml(path)
}

pub fn save_company_profile(path: &Path, company: &CompanyProfile) -> Result<(), ConfigError> {
    write_toml(path, company)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_with_firebase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        let mut settings = AppSettings::new("/srv/quotes");
        settings.store = StoreSettings::Firebase {
            database_url: "https://ekiphelp-default-rtdb.firebaseio.com".into(),
        };

        save_settings_to(&path, &settings).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("backend = \"firebase\""));
        assert_eq!(load_settings_from(&path).unwrap(), Some(settings));
    }

    #[test]
    fn minimal_settings_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "data_root = \"/srv/quotes\"\n").unwrap();

        let settings = load_settings_from(&path).unwrap().unwrap();
        assert_eq!(settings, AppSettings::new("/srv/quotes"));
        assert_eq!(settings.output_dir(), PathBuf::from("/srv/quotes/output"));
        assert_eq!(settings.company_path(), PathBuf::from("/srv/quotes/company.toml"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings_from(&dir.path().join("nope.toml")).unwrap(), None);
        assert_eq!(load_company_profile(&dir.path().join("company.toml")).unwrap(), None);
    }

    #[test]
    fn broken_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company.toml");
        fs::write(&path, "name = ").unwrap();

        let err = load_company_profile(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path.ends_with("company.toml")));
    }

    #[test]
    fn company_profile_uses_cnpj_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company.toml");
        let company = CompanyProfile {
            name: "EkipHelp".into(),
            phone: "(11) 3333-4444".into(),
            address: "Rua das Flores, 10".into(),
            tax_id: "00.000.000/0001-00".into(),
        };

        save_company_profile(&path, &company).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("cnpj = \"00.000.000/0001-00\""));
        assert_eq!(load_company_profile(&path).unwrap(), Some(company));
    }

    #[test]
    fn home_is_expanded() {
        let expanded = expand_home_dir("~/Documents/Orcamentos");
        if BaseDirs::new().is_some() {
            assert!(!expanded.starts_with('~'));
            assert!(expanded.ends_with("/Documents/Orcamentos"));
        }
        assert_eq!(expand_home_dir("/abs/path"), "/abs/path");
    }
}
