use std::path::Path;

use colored::Colorize;
use csv::ReaderBuilder;
use serde::Deserialize;

use crate::error::{PrepError, Result};

/// One evaluated flow: its true class and the class the model predicted.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PredictionRecord {
    pub actual: String,
    pub predicted: String,
}

pub fn read_predictions<P: AsRef<Path>>(path: P) -> Result<Vec<PredictionRecord>> {
    let path = path.as_ref();
    let csv_err = |source| PrepError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_err)?;
    rdr.deserialize()
        .collect::<std::result::Result<Vec<PredictionRecord>, csv::Error>>()
        .map_err(csv_err)
}

/// Rows are true classes, columns predicted classes, both in `labels` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn new(counts: Vec<Vec<u64>>, labels: Vec<String>) -> Result<Self> {
        if counts.iter().any(|row| row.len() != counts.len()) {
            return Err(PrepError::InvalidMatrix(format!(
                "expected a square matrix, got {} rows",
                counts.len()
            )));
        }
        if labels.len() != counts.len() {
            return Err(PrepError::InvalidMatrix(format!(
                "{} labels for a {}x{} matrix",
                labels.len(),
                counts.len(),
                counts.len()
            )));
        }
        Ok(ConfusionMatrix { labels, counts })
    }

    pub fn from_predictions<S: AsRef<str>>(
        actual: &[S],
        predicted: &[S],
        labels: &[String],
    ) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(PrepError::InvalidMatrix(format!(
                "{} true labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }

        let position = |label: &str| {
            labels
                .iter()
                .position(|l| l == label)
                .ok_or_else(|| PrepError::InvalidMatrix(format!("unknown class {label:?}")))
        };

        let mut counts = vec![vec![0u64; labels.len()]; labels.len()];
        for (a, p) in actual.iter().zip(predicted) {
            counts[position(a.as_ref())?][position(p.as_ref())?] += 1;
        }
        Self::new(counts, labels.to_vec())
    }

    /// Builds the matrix from prediction records, with classes in first-seen order.
    pub fn from_records(records: &[PredictionRecord]) -> Result<Self> {
        let mut labels: Vec<String> = Vec::new();
        for record in records {
            for label in [&record.actual, &record.predicted] {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }
        Self::from_records_with_labels(records, &labels)
    }

    pub fn from_records_with_labels(records: &[PredictionRecord], labels: &[String]) -> Result<Self> {
        let actual: Vec<&str> = records.iter().map(|r| r.actual.as_str()).collect();
        let predicted: Vec<&str> = records.iter().map(|r| r.predicted.as_str()).collect();
        Self::from_predictions(&actual, &predicted, labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Each row divided by its sum. Rows without any samples stay at zero.
    pub fn normalized(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total: u64 = row.iter().sum();
                row.iter()
                    .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
                    .collect()
            })
            .collect()
    }

    /// Renders the matrix as a shaded text grid.
    pub fn render(&self, normalize: bool, title: &str) -> String {
        let values: Vec<Vec<f64>> = if normalize {
            self.normalized()
        } else {
            self.counts
                .iter()
                .map(|row| row.iter().map(|&c| c as f64).collect())
                .collect()
        };
        let cells: Vec<Vec<String>> = values
            .iter()
            .map(|row| row.iter().map(|&v| cell_text(v, normalize)).collect())
            .collect();

        let max = values.iter().flatten().copied().fold(0.0, f64::max);
        let thresh = max / 2.0;

        let label_width = self
            .labels
            .iter()
            .map(String::len)
            .chain(["True Label".len()])
            .max()
            .unwrap_or_default();
        let cell_width = self
            .labels
            .iter()
            .map(String::len)
            .chain(cells.iter().flatten().map(String::len))
            .max()
            .unwrap_or_default()
            + 2;

        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(&" ".repeat(label_width + 3));
        out.push_str("Predicted Label\n");

        out.push_str(&format!("{:<label_width$} | ", "True Label"));
        for label in &self.labels {
            out.push_str(&format!("{label:^cell_width$}"));
        }
        out.push('\n');

        for ((label, row), texts) in self.labels.iter().zip(&values).zip(&cells) {
            out.push_str(&format!("{label:<label_width$} | "));
            for (&value, text) in row.iter().zip(texts) {
                let (r, g, b) = shade(if max > 0.0 { value / max } else { 0.0 });
                let cell = format!("{text:^cell_width$}");
                let cell = if value > thresh {
                    cell.truecolor(255, 255, 255)
                } else {
                    cell.truecolor(0, 0, 0)
                };
                out.push_str(&cell.on_truecolor(r, g, b).to_string());
            }
            out.push('\n');
        }
        out
    }
}

/// Prints the matrix to stdout, preceded by which variant is shown.
pub fn plot_confusion_matrix(matrix: &ConfusionMatrix, normalize: bool, title: &str) {
    if normalize {
        println!("Normalized confusion matrix");
    } else {
        println!("Confusion Matrix, without normalization");
    }
    print!("{}", matrix.render(normalize, title));
}

fn cell_text(value: f64, normalize: bool) -> String {
    if normalize {
        format!("{value:.2}")
    } else {
        format!("{}", value as u64)
    }
}

// Linear blend from near-white to deep blue.
fn shade(intensity: f64) -> (u8, u8, u8) {
    const LOW: (f64, f64, f64) = (247.0, 251.0, 255.0);
    const HIGH: (f64, f64, f64) = (8.0, 48.0, 107.0);
    let t = intensity.clamp(0.0, 1.0);
    let mix = |lo: f64, hi: f64| (lo + (hi - lo) * t).round() as u8;
    (mix(LOW.0, HIGH.0), mix(LOW.1, HIGH.1), mix(LOW.2, HIGH.2))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn counts_predictions() {
        let cm = ConfusionMatrix::from_predictions(
            &["Benign", "Benign", "DDoS", "DDoS", "DDoS"],
            &["Benign", "DDoS", "DDoS", "DDoS", "Benign"],
            &labels(&["Benign", "DDoS"]),
        )
        .unwrap();
        assert_eq!(cm.counts(), &[vec![1, 1], vec![1, 2]]);
    }

    #[test]
    fn unknown_class_is_an_error() {
        let err = ConfusionMatrix::from_predictions(&["Syn"], &["Syn"], &labels(&["DDoS"]));
        assert!(matches!(err, Err(PrepError::InvalidMatrix(_))));
    }

    #[test]
    fn rejects_non_square_matrix() {
        let err = ConfusionMatrix::new(vec![vec![1, 2, 3], vec![4, 5, 6]], labels(&["a", "b"]));
        assert!(err.is_err());
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let err = ConfusionMatrix::new(vec![vec![1, 2], vec![3, 4]], labels(&["a"]));
        assert!(err.is_err());
    }

    #[test]
    fn normalizes_rows() {
        let cm = ConfusionMatrix::new(vec![vec![3, 1], vec![0, 0]], labels(&["a", "b"])).unwrap();
        assert_eq!(cm.normalized(), vec![vec![0.75, 0.25], vec![0.0, 0.0]]);
    }

    #[test]
    fn renders_labels_and_values() {
        let cm = ConfusionMatrix::new(vec![vec![3, 1], vec![2, 6]], labels(&["Benign", "Syn"])).unwrap();

        let raw = cm.render(false, "Confusion matrix");
        assert!(raw.starts_with("Confusion matrix\n"));
        assert!(raw.contains("Predicted Label"));
        assert!(raw.contains("True Label"));
        assert!(raw.contains("Benign"));
        assert!(raw.contains(" 6 "));

        let normalized = cm.render(true, "Normalized");
        assert!(normalized.contains("0.75"));
        assert!(normalized.contains("0.25"));
        assert_eq!(normalized.lines().count(), 5);
    }

    #[test]
    fn shade_spans_blues() {
        assert_eq!(shade(0.0), (247, 251, 255));
        assert_eq!(shade(1.0), (8, 48, 107));
    }

    #[test]
    fn labels_in_first_seen_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "actual,predicted\nSyn,Benign_Unknown\nBenign_Unknown,Benign_Unknown\nSyn,Syn\n").unwrap();

        let records = read_predictions(file.path()).unwrap();
        let cm = ConfusionMatrix::from_records(&records).unwrap();
        assert_eq!(cm.labels(), labels(&["Syn", "Benign_Unknown"]).as_slice());
        assert_eq!(cm.counts(), &[vec![1, 1], vec![0, 1]]);
    }
}
