use std::path::{Path, PathBuf};

use burn::prelude::*;

use crate::error::PrepError;

/// How many benign rows the balanced loader reads.
#[derive(Config, Debug, PartialEq)]
pub enum BenignSizing {
    /// As many benign rows as attack rows were actually read.
    Matched,
    /// A static `multiple * sample_size`, read before the attack classes.
    /// Only useful to reproduce older dataset snapshots.
    Fixed { multiple: usize },
}

#[derive(Config, Debug)]
pub struct LoaderConfig {
    /// Directory holding one cleaned CSV per class.
    pub dataset_dir: String,
    #[config(default = 1000)]
    pub sample_size: usize,
    #[config(default = "BenignSizing::Matched")]
    pub benign_sizing: BenignSizing,
    /// Benign source file name; `<dir name>_Benign.csv` when unset.
    #[config(default = "None")]
    pub benign_file: Option<String>,
}

impl LoaderConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let path = path.as_ref();
        Self::load(path).map_err(|e| PrepError::Config(format!("{}: {:?}", path.display(), e)))
    }

    pub fn dataset_path(&self) -> &Path {
        Path::new(&self.dataset_dir)
    }

    pub fn benign_file_name(&self) -> String {
        match &self.benign_file {
            Some(name) => name.clone(),
            None => {
                let dir = self
                    .dataset_path()
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{dir}_Benign.csv")
            }
        }
    }

    pub fn benign_path(&self) -> PathBuf {
        self.dataset_path().join(self.benign_file_name())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = LoaderConfig::new("Datasets/Final".to_string());
        assert_eq!(config.sample_size, 1000);
        assert_eq!(config.benign_sizing, BenignSizing::Matched);
        assert_eq!(config.benign_path(), PathBuf::from("Datasets/Final/Final_Benign.csv"));
    }

    #[test]
    fn trailing_separator_still_names_benign_file() {
        let config = LoaderConfig::new("Datasets/DDoS2019/".to_string());
        assert_eq!(config.benign_file_name(), "DDoS2019_Benign.csv");
    }

    #[test]
    fn explicit_benign_file() {
        let config = LoaderConfig::new("data".to_string()).with_benign_file(Some("normal.csv".to_string()));
        assert_eq!(config.benign_path(), PathBuf::from("data/normal.csv"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.json");
        LoaderConfig::new("Datasets/Final".to_string())
            .with_sample_size(250)
            .with_benign_sizing(BenignSizing::Fixed { multiple: 11 })
            .save(&path)
            .unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.sample_size, 250);
        assert_eq!(config.benign_sizing, BenignSizing::Fixed { multiple: 11 });
        assert_eq!(config.benign_file, None);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = LoaderConfig::from_file("/nonexistent/loader.json").unwrap_err();
        assert!(matches!(err, PrepError::Config(_)));
    }
}
