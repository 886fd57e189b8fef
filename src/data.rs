use std::path::Path;

use burn::data::dataset::{Dataset, InMemDataset};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::error::{PrepError, Result};
use crate::schema::{LABEL, MALICIOUS};
use crate::table::{FlowTable, ReadOptions};

/// One normalized flow: numeric features plus its binary target.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowItem {
    pub features: Vec<f32>,
    pub malicious: u8,
    pub label: String,
}

#[derive(Clone)]
pub struct FlowBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> FlowBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

#[derive(Clone, Debug)]
pub struct FlowBatch<B: Backend> {
    pub flows: Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Batcher<FlowItem, FlowBatch<B>> for FlowBatcher<B> {
    fn batch(&self, items: Vec<FlowItem>) -> FlowBatch<B> {
        let flows = items
            .iter()
            .map(|item| Data::new(item.features.clone(), Shape::new([1, item.features.len()])))
            .map(|data| Tensor::<B, 2>::from_data(data.convert(), &self.device))
            .collect();

        let targets = items
            .iter()
            .map(|item| {
                Tensor::<B, 1, Int>::from_data(
                    Data::from([(item.malicious as i64).elem()]),
                    &self.device,
                )
            })
            .collect();

        let flows = Tensor::cat(flows, 0).to_device(&self.device);
        let targets = Tensor::cat(targets, 0).to_device(&self.device);

        FlowBatch { flows, targets }
    }
}

/// Training view over a normalized table: every column except `Label` and
/// `Malicious` is a feature.
pub struct FlowDataset {
    feature_names: Vec<String>,
    dataset: InMemDataset<FlowItem>,
}

impl FlowDataset {
    pub fn from_table(table: &FlowTable) -> Result<Self> {
        let labels = table.column(LABEL)?;
        let targets = table
            .column(MALICIOUS)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                "0" => Ok(0),
                "1" => Ok(1),
                other => Err(PrepError::InvalidValue {
                    row,
                    column: MALICIOUS.to_string(),
                    value: other.to_string(),
                }),
            })
            .collect::<Result<Vec<u8>>>()?;

        let feature_names: Vec<String> = table
            .headers()
            .into_iter()
            .filter(|h| h != LABEL && h != MALICIOUS)
            .collect();

        // Parsed column by column, then transposed into rows.
        let mut columns = Vec::with_capacity(feature_names.len());
        for name in &feature_names {
            let values = table
                .column(name)?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    parse_feature(value).ok_or_else(|| PrepError::InvalidValue {
                        row,
                        column: name.clone(),
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<f32>>>()?;
            columns.push(values);
        }

        let items = labels
            .into_iter()
            .zip(targets)
            .enumerate()
            .map(|(row, (label, malicious))| FlowItem {
                features: columns.iter().map(|column| column[row]).collect(),
                malicious,
                label: label.to_string(),
            })
            .collect();

        Ok(FlowDataset {
            feature_names,
            dataset: InMemDataset::new(items),
        })
    }

    /// Loads a table previously written by the loaders or the normalizer.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let table = FlowTable::read_csv(
            path,
            ReadOptions {
                index_col: true,
                nrows: None,
            },
        )?;
        Self::from_table(&table)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

// Empty cells are missing measurements, not zeros.
fn parse_feature(value: &str) -> Option<f32> {
    let value = value.trim();
    if value.is_empty() {
        return Some(f32::NAN);
    }
    value.parse().ok()
}

impl Dataset<FlowItem> for FlowDataset {
    fn get(&self, index: usize) -> Option<FlowItem> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}
