use std::path::{Path, PathBuf};

use anoncreds::types::RevocationRegistryDefinition;

use crate::error::AnoncredsLedgerError;

/// Locates a registry's tails file from the base directory of its published tails location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailsReaderConfig {
    pub base_dir: PathBuf,
    pub file_name: String,
}

impl TailsReaderConfig {
    pub fn from_tails_location(tails_location: &str) -> Result<Self, AnoncredsLedgerError> {
        let location = Path::new(tails_location);
        let file_name = location
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AnoncredsLedgerError::TailsNotFound(tails_location.to_owned()))?;
        let base_dir = location
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self {
            base_dir,
            file_name: file_name.to_owned(),
        })
    }

    pub fn for_rev_reg_def(
        rev_reg_def: &RevocationRegistryDefinition,
    ) -> Result<Self, AnoncredsLedgerError> {
        Self::from_tails_location(&rev_reg_def.value.tails_location)
    }

    /// Path of the tails file, checked to exist.
    pub fn open(&self) -> Result<String, AnoncredsLedgerError> {
        let path = self.base_dir.join(&self.file_name);
        if !path.is_file() {
            return Err(AnoncredsLedgerError::TailsNotFound(path.display().to_string()));
        }
        Ok(path.to_string_lossy().into_owned())
    }
}
