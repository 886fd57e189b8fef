use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{BenignSizing, LoaderConfig};
use crate::error::{PrepError, Result};
use crate::table::{FlowTable, ReadOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Loaded { rows: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub file: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// What each attack-class source contributed to a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadManifest {
    pub sources: Vec<SourceReport>,
    pub benign_rows: usize,
}

impl LoadManifest {
    pub fn attack_rows(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s.outcome {
                SourceOutcome::Loaded { rows } => rows,
                SourceOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceOutcome::Skipped { .. }))
    }
}

#[derive(Debug)]
pub struct LoadedDataset {
    pub table: FlowTable,
    pub manifest: LoadManifest,
}

/// Reads up to `sample_size` rows of the benign source.
pub fn load_benign(config: &LoaderConfig) -> Result<FlowTable> {
    let path = config.benign_path();
    let mut table = FlowTable::read_csv(&path, ReadOptions::sample(config.sample_size))?;
    table.reset_index();
    info!("loaded {} benign rows from {}", table.len(), path.display());
    Ok(table)
}

/// Reads a sample of every attack-class source, without any benign rows.
pub fn load_malicious(config: &LoaderConfig) -> Result<LoadedDataset> {
    let mut table = FlowTable::default();
    let mut manifest = LoadManifest::default();
    read_attack_sources(config, &mut table, &mut manifest)?;
    table.reset_index();

    info!(
        "loaded {} attack rows from {} sources",
        manifest.attack_rows(),
        manifest.sources.len()
    );
    Ok(LoadedDataset { table, manifest })
}

/// Assembles attack samples and a benign partition sized per [`BenignSizing`].
///
/// Unreadable attack sources are skipped and recorded in the manifest. The
/// benign source is required: failing to read it, or it holding fewer rows
/// than a matched load needs, fails the whole load.
pub fn load_balanced(config: &LoaderConfig) -> Result<LoadedDataset> {
    let benign_path = config.benign_path();
    let mut manifest = LoadManifest::default();

    let mut table = match config.benign_sizing {
        BenignSizing::Matched => {
            // Header only, so the benign column order leads.
            let mut table = FlowTable::read_csv(&benign_path, ReadOptions::sample(0))?;
            read_attack_sources(config, &mut table, &mut manifest)?;

            let needed = manifest.attack_rows();
            let benign = FlowTable::read_csv(&benign_path, ReadOptions::sample(needed))?;
            if benign.len() < needed {
                return Err(PrepError::InsufficientRows {
                    path: benign_path,
                    requested: needed,
                    available: benign.len(),
                });
            }
            manifest.benign_rows = benign.len();
            table.append(benign)?;
            table
        }
        BenignSizing::Fixed { multiple } => {
            let nrows = multiple.saturating_mul(config.sample_size);
            let mut table = FlowTable::read_csv(&benign_path, ReadOptions::sample(nrows))?;
            manifest.benign_rows = table.len();
            read_attack_sources(config, &mut table, &mut manifest)?;
            table
        }
    };
    table.reset_index();

    info!(
        "loaded {} attack rows and {} benign rows from {}",
        manifest.attack_rows(),
        manifest.benign_rows,
        config.dataset_dir
    );
    Ok(LoadedDataset { table, manifest })
}

/// Attack-class sources: every entry of the dataset directory except hidden
/// files and the benign source, in file-name order.
pub fn attack_sources(config: &LoaderConfig) -> Result<Vec<PathBuf>> {
    let dir = config.dataset_path();
    let benign = config.benign_file_name();
    let io_err = |source| PrepError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name == benign {
            continue;
        }
        sources.push(entry.path());
    }
    sources.sort();
    Ok(sources)
}

fn read_attack_sources(
    config: &LoaderConfig,
    table: &mut FlowTable,
    manifest: &mut LoadManifest,
) -> Result<()> {
    for path in attack_sources(config)? {
        let outcome = match FlowTable::read_csv(&path, ReadOptions::sample(config.sample_size)) {
            Ok(sample) => {
                let rows = sample.len();
                debug!("read {} rows from {}", rows, path.display());
                table.append(sample)?;
                SourceOutcome::Loaded { rows }
            }
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                SourceOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };
        manifest.sources.push(SourceReport {
            file: file_name(&path),
            outcome,
        });
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
