use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use polars::prelude::*;

use crate::error::{PrepError, Result};

/// How a CSV source is turned into a [`FlowTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Treat the first column as the row identifier rather than data.
    pub index_col: bool,
    /// Read at most this many data rows.
    pub nrows: Option<usize>,
}

impl ReadOptions {
    /// Options for the cleaned per-class exports: leading index column, bounded row count.
    pub fn sample(nrows: usize) -> Self {
        ReadOptions {
            index_col: true,
            nrows: Some(nrows),
        }
    }
}

/// Flow records held as a string-typed polars frame.
///
/// The row index is carried next to the frame and only becomes dense again
/// through [`FlowTable::reset_index`]. Empty cells are nulls in the frame and
/// read back as `""`.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    frame: DataFrame,
    index: Vec<String>,
}

fn dense_index(len: usize) -> Vec<String> {
    (0..len).map(|i| i.to_string()).collect()
}

/// Makes repeated column names unique as `name.1`, `name.2`, ... in order of appearance.
fn unique_headers<I: IntoIterator<Item = String>>(names: I) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let mut candidate = name.clone();
        let mut n = 0;
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{name}.{n}");
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

impl FlowTable {
    /// Builds a table from raw rows; each row must be as wide as `headers`.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != headers.len()) {
            return Err(PrepError::Shape(format!(
                "row of {} values for {} columns",
                row.len(),
                headers.len()
            )));
        }
        let columns = unique_headers(headers)
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<&str> = rows.iter().map(|row| row[i].as_str()).collect();
                Series::new(name, values)
            })
            .collect();
        let frame = DataFrame::new(columns)?;
        Ok(FlowTable {
            index: dense_index(frame.height()),
            frame,
        })
    }

    pub fn read_csv<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| PrepError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes, options, path)
    }

    /// Reads CSV from any reader; `origin` only names the source in errors.
    pub fn from_reader<R: Read>(mut reader: R, options: ReadOptions, origin: &Path) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| PrepError::Io {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_bytes(bytes, options, origin)
    }

    fn from_bytes(bytes: Vec<u8>, options: ReadOptions, origin: &Path) -> Result<Self> {
        let empty = || PrepError::EmptySource {
            path: origin.to_path_buf(),
        };
        let frame_err = |source| PrepError::Frame {
            path: origin.to_path_buf(),
            source,
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(empty());
        }

        // The header is read as the first data row so repeated names can be
        // made unique here instead of by the reader.
        let raw = CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(Some(0))
            .with_n_rows(options.nrows.map(|n| n.saturating_add(1)))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(frame_err)?;
        if raw.height() == 0 || raw.width() == 0 {
            return Err(empty());
        }

        let names = raw
            .get_columns()
            .iter()
            .map(|s| Ok::<_, PolarsError>(s.str()?.get(0).unwrap_or_default().to_string()))
            .collect::<PolarsResult<Vec<_>>>()
            .map_err(frame_err)?;

        let mut columns: Vec<Series> = raw.slice(1, usize::MAX).get_columns().to_vec();
        for (series, name) in columns.iter_mut().zip(unique_headers(names)) {
            series.rename(&name);
        }

        let ids = if options.index_col {
            Some(columns.remove(0))
        } else {
            None
        };
        let frame = DataFrame::new(columns).map_err(frame_err)?;
        let index = match ids {
            Some(ids) => ids
                .str()
                .map_err(frame_err)?
                .into_iter()
                .map(|id| id.unwrap_or_default().to_string())
                .collect(),
            None => dense_index(frame.height()),
        };

        Ok(FlowTable { frame, index })
    }

    /// Writes the table with its row index as an unnamed first column.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = fs::File::create(path).map_err(|source| PrepError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.to_writer(file).map_err(|e| match e {
            PrepError::Polars(source) => PrepError::Frame {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut frame = self.frame.clone();
        frame.insert_column(0, Series::new("", self.index.clone()))?;
        CsvWriter::new(writer)
            .include_header(true)
            .finish(&mut frame)?;
        Ok(())
    }

    pub fn headers(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    fn strings(&self, name: &str) -> Result<&StringChunked> {
        if !self.has_column(name) {
            return Err(PrepError::MissingColumn {
                column: name.to_string(),
            });
        }
        Ok(self.frame.column(name)?.str()?)
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        Ok(self
            .strings(name)?
            .into_iter()
            .map(|v| v.unwrap_or_default())
            .collect())
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        let values = self.strings(name).ok()?;
        if row >= values.len() {
            return None;
        }
        Some(values.get(row).unwrap_or_default())
    }

    /// Renames every column through `f`. Fails if two columns end up with the same name.
    pub fn rename_columns<F: FnMut(&str) -> String>(&mut self, mut f: F) -> Result<()> {
        let names: Vec<String> = self.frame.get_column_names().into_iter().map(&mut f).collect();
        self.frame.set_column_names(&names)?;
        Ok(())
    }

    /// Renames `from` to `to` in place, keeping its position.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        self.strings(from)?;
        self.frame.rename(from, to)?;
        Ok(())
    }

    /// Replaces an existing column's values, or appends a new column at the end.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.len() {
            return Err(PrepError::Shape(format!(
                "{} values for column {name} in a table of {} rows",
                values.len(),
                self.len()
            )));
        }
        self.frame.with_column(Series::new(name, values))?;
        Ok(())
    }

    pub fn map_column<F: FnMut(&str) -> String>(&mut self, name: &str, f: F) -> Result<()> {
        let values = self.column(name)?.into_iter().map(f).collect();
        self.set_column(name, values)
    }

    /// Drops every listed column. Fails without touching the table if any is absent.
    pub fn drop_columns(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            self.strings(name)?;
        }
        self.frame = self.frame.drop_many(names);
        Ok(())
    }

    /// Concatenates `other` below this table.
    ///
    /// Columns are matched by name; columns only one side has are kept and
    /// left empty for the rows of the other side. Row identifiers are carried
    /// over unchanged.
    pub fn append(&mut self, other: FlowTable) -> Result<()> {
        if self.frame.width() == 0 {
            self.frame = other.frame;
        } else if other.frame.width() > 0 {
            self.frame = concat(
                [self.frame.clone().lazy(), other.frame.lazy()],
                UnionArgs {
                    diagonal: true,
                    ..Default::default()
                },
            )?
            .collect()?;
        }
        self.index.extend(other.index);
        Ok(())
    }

    /// Renumbers the row index to `0..len`, discarding the previous identifiers.
    pub fn reset_index(&mut self) {
        self.index = dense_index(self.len());
    }

    pub fn has_dense_index(&self) -> bool {
        self.index.len() == self.len()
            && self
                .index
                .iter()
                .enumerate()
                .all(|(i, id)| id.parse::<usize>() == Ok(i))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn read(text: &str, options: ReadOptions) -> FlowTable {
        FlowTable::from_reader(text.as_bytes(), options, Path::new("test.csv")).unwrap()
    }

    #[test]
    fn reads_index_column_and_caps_rows() {
        let table = read(",a,b\n7,1,2\n9,3,4\n11,5,6\n", ReadOptions::sample(2));
        assert_eq!(table.headers(), strings(&["a", "b"]));
        assert_eq!(table.index(), strings(&["7", "9"]).as_slice());
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, "b"), Some("4"));
        assert!(!table.has_dense_index());
    }

    #[test]
    fn reads_without_index_column() {
        let table = read("a,b\n1,2\n3,4\n", ReadOptions::default());
        assert_eq!(table.headers().len(), 2);
        assert!(table.has_dense_index());
        assert_eq!(table.value(1, "b"), Some("4"));
    }

    #[test]
    fn zero_rows_keeps_header() {
        let table = read(",a\n0,1\n", ReadOptions::sample(0));
        assert_eq!(table.headers(), strings(&["a"]));
        assert!(table.is_empty());
    }

    #[test]
    fn repeated_headers_are_numbered() {
        let table = read(
            ",Fwd Header Length,Label,Fwd Header Length,Fwd Header Length\n0,40,Syn,99,7\n",
            ReadOptions::sample(10),
        );
        assert_eq!(
            table.headers(),
            strings(&[
                "Fwd Header Length",
                "Label",
                "Fwd Header Length.1",
                "Fwd Header Length.2"
            ])
        );
        assert_eq!(table.value(0, "Fwd Header Length"), Some("40"));
        assert_eq!(table.value(0, "Fwd Header Length.1"), Some("99"));
        assert_eq!(table.value(0, "Fwd Header Length.2"), Some("7"));
    }

    #[test]
    fn empty_source_is_an_error() {
        let err = FlowTable::from_reader("".as_bytes(), ReadOptions::default(), Path::new("x.csv"));
        assert!(matches!(err, Err(PrepError::EmptySource { .. })));
    }

    #[test]
    fn overlong_rows_are_an_error() {
        let err = FlowTable::from_reader(
            "a,b\n1,2\n3,4,5\n".as_bytes(),
            ReadOptions::default(),
            Path::new("x.csv"),
        );
        assert!(matches!(err, Err(PrepError::Frame { .. })));
    }

    #[test]
    fn drop_is_all_or_nothing() {
        let mut table =
            FlowTable::from_rows(strings(&["a", "b", "c"]), vec![strings(&["1", "2", "3"])]).unwrap();
        let err = table.drop_columns(&["a", "missing"]);
        assert!(matches!(err, Err(PrepError::MissingColumn { column }) if column == "missing"));
        assert_eq!(table.headers().len(), 3);

        table.drop_columns(&["a", "c"]).unwrap();
        assert_eq!(table.headers(), strings(&["b"]));
        assert_eq!(table.value(0, "b"), Some("2"));
    }

    #[test]
    fn set_column_replaces_in_place() {
        let mut table = FlowTable::from_rows(strings(&["a", "b"]), vec![strings(&["1", "2"])]).unwrap();
        table.set_column("a", strings(&["9"])).unwrap();
        table.set_column("c", strings(&["3"])).unwrap();
        assert_eq!(table.headers(), strings(&["a", "b", "c"]));
        assert_eq!(table.column("a").unwrap(), vec!["9"]);
        assert_eq!(table.column("c").unwrap(), vec!["3"]);
    }

    #[test]
    fn set_column_rejects_wrong_length() {
        let mut table = FlowTable::from_rows(
            strings(&["a"]),
            vec![strings(&["1"]), strings(&["2"]), strings(&["3"])],
        )
        .unwrap();
        assert!(matches!(table.set_column("b", strings(&["x"])), Err(PrepError::Shape(_))));
        assert!(matches!(table.set_column("a", strings(&[])), Err(PrepError::Shape(_))));
        assert_eq!(table.headers(), strings(&["a"]));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = FlowTable::from_rows(strings(&["a", "b"]), vec![strings(&["1"])]);
        assert!(matches!(err, Err(PrepError::Shape(_))));
    }

    #[test]
    fn rename_collision_is_an_error() {
        let mut table = FlowTable::from_rows(strings(&["a", "b"]), vec![strings(&["1", "2"])]).unwrap();
        assert!(table.rename_columns(|_| "same".to_string()).is_err());
    }

    #[test]
    fn append_unions_columns() {
        let mut left = FlowTable::from_rows(strings(&["a", "b"]), vec![strings(&["1", "2"])]).unwrap();
        let right = FlowTable::from_rows(strings(&["b", "c"]), vec![strings(&["3", "4"])]).unwrap();
        left.append(right).unwrap();

        assert_eq!(left.headers(), strings(&["a", "b", "c"]));
        assert_eq!(left.column("a").unwrap(), vec!["1", ""]);
        assert_eq!(left.column("b").unwrap(), vec!["2", "3"]);
        assert_eq!(left.column("c").unwrap(), vec!["", "4"]);
        assert_eq!(left.index(), strings(&["0", "0"]).as_slice());

        left.reset_index();
        assert!(left.has_dense_index());
    }

    #[test]
    fn append_keeps_numbered_duplicates_apart() {
        let text = ",x,x\n0,40,99\n";
        let mut left = read(text, ReadOptions::sample(5));
        left.append(read(",x,x\n0,7,8\n", ReadOptions::sample(5))).unwrap();
        assert_eq!(left.column("x").unwrap(), vec!["40", "7"]);
        assert_eq!(left.column("x.1").unwrap(), vec!["99", "8"]);
    }

    #[test]
    fn written_csv_reads_back() {
        let table =
            FlowTable::from_rows(strings(&["a", "b"]), vec![strings(&["x", ""]), strings(&["y", "2"])])
                .unwrap();
        let mut out = Vec::new();
        table.to_writer(&mut out).unwrap();

        let back = read(&String::from_utf8(out).unwrap(), ReadOptions {
            index_col: true,
            nrows: None,
        });
        assert_eq!(back.headers(), strings(&["a", "b"]));
        assert_eq!(back.index(), strings(&["0", "1"]).as_slice());
        assert_eq!(back.column("a").unwrap(), vec!["x", "y"]);
        assert_eq!(back.column("b").unwrap(), vec!["", "2"]);
    }
}
