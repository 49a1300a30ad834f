use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;

use crate::{
    error::PolicyError,
    query::{NetifconCriteria, SensitivityCriteria},
};

const SECTIONS: &[&str] = &["sensitivity", "netifcon"];

/// Query criteria read from a TOML file, one section per query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub sensitivity: SensitivityCriteria,
    pub netifcon: NetifconCriteria,
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let content = fs::read_to_string(path)?;
        let mut table: toml::Table =
            toml::from_str(&content).map_err(|source| PolicyError::ConfigParse {
                path: PathBuf::from(path),
                source,
            })?;

        let config = Self {
            sensitivity: take_section(&mut table, "sensitivity")?,
            netifcon: take_section(&mut table, "netifcon")?,
        };

        if let Some(section) = table.keys().next() {
            return Err(PolicyError::InvalidOption {
                section: section.clone(),
                source: serde::de::Error::custom(format!(
                    "unknown section, expected one of {}",
                    SECTIONS.join(", ")
                )),
            });
        }

        Ok(config)
    }
}

/// Convert one section into its criteria type; a missing section yields defaults
fn take_section<T>(table: &mut toml::Table, section: &str) -> Result<T, PolicyError>
where
    T: DeserializeOwned + Default,
{
    match table.remove(section) {
        None => Ok(T::default()),
        Some(value) => value.try_into().map_err(|source| PolicyError::InvalidOption {
            section: section.to_string(),
            source,
        }),
    }
}
