use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use ids_dataset::config::{BenignSizing, LoaderConfig};
use ids_dataset::confusion::{plot_confusion_matrix, read_predictions, ConfusionMatrix};
use ids_dataset::loader::{load_balanced, load_benign, load_malicious, LoadManifest};
use ids_dataset::normalize::clean_columns;
use ids_dataset::table::{FlowTable, ReadOptions};

#[derive(Debug, Parser)]
#[command(about = "Prepare flow-record CSVs for intrusion detection training")]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize one raw flow export into the canonical schema.
    Clean {
        input: PathBuf,
        output: PathBuf,
        /// The raw export starts with an index column.
        #[arg(long)]
        index_col: bool,
    },
    /// Attack samples plus a matching benign partition.
    Balanced(BalancedArgs),
    /// Benign rows only.
    Benign(BenignArgs),
    /// Attack samples only.
    Malicious(MaliciousArgs),
    /// Render a confusion matrix from a CSV of `actual,predicted` pairs.
    Confusion {
        predictions: PathBuf,
        #[arg(long)]
        normalize: bool,
        #[arg(long, default_value = "Confusion matrix")]
        title: String,
        /// Class order; first-seen order when omitted.
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Directory with one cleaned CSV per class.
    #[arg(short, long)]
    dir: Option<String>,
    /// JSON loader config; flags given alongside override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    sample_size: Option<usize>,
    #[arg(long)]
    benign_file: Option<String>,
}

impl SourceArgs {
    fn loader_config(&self) -> anyhow::Result<LoaderConfig> {
        let mut config = match (&self.config, &self.dir) {
            (Some(path), _) => LoaderConfig::from_file(path)?,
            (None, Some(dir)) => LoaderConfig::new(dir.clone()),
            (None, None) => anyhow::bail!("either --dir or --config is required"),
        };
        if let Some(dir) = &self.dir {
            config.dataset_dir = dir.clone();
        }
        if let Some(sample_size) = self.sample_size {
            config.sample_size = sample_size;
        }
        if let Some(benign_file) = &self.benign_file {
            config.benign_file = Some(benign_file.clone());
        }
        Ok(config)
    }
}

#[derive(Debug, Args)]
struct BalancedArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Read `N * sample_size` benign rows instead of matching the attack rows.
    #[arg(long, value_name = "N")]
    fixed_multiple: Option<usize>,
    #[arg(short, long)]
    output: PathBuf,
    /// Where to write the per-source load manifest as JSON.
    #[arg(long)]
    manifest: Option<PathBuf>,
}

impl BalancedArgs {
    fn loader_config(&self) -> anyhow::Result<LoaderConfig> {
        let mut config = self.source.loader_config()?;
        if let Some(multiple) = self.fixed_multiple {
            config.benign_sizing = BenignSizing::Fixed { multiple };
        }
        Ok(config)
    }
}

#[derive(Debug, Args)]
struct MaliciousArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(short, long)]
    output: PathBuf,
    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct BenignArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(short, long)]
    output: PathBuf,
}

fn write_manifest(path: &Path, manifest: &LoadManifest) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, manifest).context("writing load manifest")?;
    Ok(())
}

fn report(manifest: &LoadManifest) {
    for source in manifest.skipped() {
        warn!("{} was not loaded", source.file);
    }
}

fn main() -> Result<(), anyhow::Error> {
    let opt = Opt::parse();

    env_logger::init();

    match opt.command {
        Command::Clean {
            input,
            output,
            index_col,
        } => {
            let raw = FlowTable::read_csv(
                &input,
                ReadOptions {
                    index_col,
                    nrows: None,
                },
            )?;
            let table = clean_columns(raw)
                .with_context(|| format!("normalizing {}", input.display()))?;
            table.write_csv(&output)?;
            info!("wrote {} rows to {}", table.len(), output.display());
        }
        Command::Balanced(args) => {
            let config = args.loader_config()?;
            let loaded = load_balanced(&config)
                .with_context(|| format!("loading {}", config.dataset_dir))?;
            report(&loaded.manifest);
            loaded.table.write_csv(&args.output)?;
            if let Some(path) = &args.manifest {
                write_manifest(path, &loaded.manifest)?;
            }
        }
        Command::Malicious(args) => {
            let config = args.source.loader_config()?;
            let loaded = load_malicious(&config)
                .with_context(|| format!("loading {}", config.dataset_dir))?;
            report(&loaded.manifest);
            loaded.table.write_csv(&args.output)?;
            if let Some(path) = &args.manifest {
                write_manifest(path, &loaded.manifest)?;
            }
        }
        Command::Benign(args) => {
            let config = args.source.loader_config()?;
            let table = load_benign(&config)
                .with_context(|| format!("loading {}", config.benign_path().display()))?;
            table.write_csv(&args.output)?;
        }
        Command::Confusion {
            predictions,
            normalize,
            title,
            labels,
        } => {
            let records = read_predictions(&predictions)?;
            let matrix = if labels.is_empty() {
                ConfusionMatrix::from_records(&records)?
            } else {
                ConfusionMatrix::from_records_with_labels(&records, &labels)?
            };
            plot_confusion_matrix(&matrix, normalize, &title);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Opt, clap::Error> {
        Opt::try_parse_from(std::iter::once("ids-dataset").chain(args.iter().copied()))
    }

    #[test]
    fn balanced_takes_fixed_multiple() {
        let opt = parse(&["balanced", "-d", "Final", "-o", "out.csv", "--fixed-multiple", "3"])
            .unwrap();
        let Command::Balanced(args) = opt.command else {
            panic!("expected balanced");
        };
        let config = args.loader_config().unwrap();
        assert_eq!(config.benign_sizing, BenignSizing::Fixed { multiple: 3 });
    }

    #[test]
    fn benign_rejects_balanced_only_flags() {
        assert!(parse(&["benign", "-d", "Final", "-o", "out.csv", "--fixed-multiple", "3"]).is_err());
        assert!(parse(&["benign", "-d", "Final", "-o", "out.csv", "--manifest", "m.json"]).is_err());
    }

    #[test]
    fn malicious_rejects_fixed_multiple() {
        assert!(parse(&["malicious", "-d", "Final", "-o", "out.csv", "--fixed-multiple", "3"]).is_err());
        assert!(parse(&["malicious", "-d", "Final", "-o", "out.csv", "--manifest", "m.json"]).is_ok());
    }
}
