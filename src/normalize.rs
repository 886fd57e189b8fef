//! Canonical schema for raw flow-record exports.

use log::debug;

use crate::error::Result;
use crate::schema::{
    canonical_name, BENIGN_ONLY_DROPPED, BENIGN_PREFIX, BENIGN_UNKNOWN, IDENTIFYING_COLUMNS, LABEL,
    MALICIOUS, MIXED_DROPPED, PROTOCOL, PROTOCOL_FLAGS, PROTOCOL_NAME, RAW_BENIGN,
};
use crate::table::FlowTable;

/// The two raw export shapes the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSchema {
    /// Benign-only capture: carries `ProtocolName` and `L7Protocol`, labels are meaningless.
    BenignOnly,
    /// Attack capture mixing `BENIGN` rows with attack labels.
    Mixed,
}

impl RawSchema {
    pub fn detect(table: &FlowTable) -> Self {
        if table.has_column(PROTOCOL_NAME) {
            RawSchema::BenignOnly
        } else {
            RawSchema::Mixed
        }
    }
}

/// Cleans one column name: strips a single leading space, replaces spaces,
/// periods and slashes with underscores, then maps legacy names to canonical ones.
pub fn normalize_column_name(name: &str) -> String {
    let name = name.strip_prefix(' ').unwrap_or(name);
    let name: String = name
        .chars()
        .map(|c| match c {
            ' ' | '.' | '/' => '_',
            c => c,
        })
        .collect();
    match canonical_name(&name) {
        Some(canonical) => canonical.to_string(),
        None => name,
    }
}

pub fn rename_columns(table: &mut FlowTable) -> Result<()> {
    table.rename_columns(normalize_column_name)
}

/// Adds the `HOPOPT`, `TCP` and `UDP` indicator columns derived from `Protocol`.
pub fn add_protocol_flags(table: &mut FlowTable) -> Result<()> {
    let protocols: Vec<Option<f64>> = table
        .column(PROTOCOL)?
        .into_iter()
        .map(|value| value.trim().parse().ok())
        .collect();

    for (flag, code) in PROTOCOL_FLAGS {
        let values = protocols
            .iter()
            .map(|p| if *p == Some(f64::from(code)) { "1" } else { "0" })
            .map(str::to_string)
            .collect();
        table.set_column(flag, values)?;
    }
    Ok(())
}

/// Normalizes a raw export into the canonical training schema.
///
/// Consumes the table so a schema violation never hands back a half-transformed one.
pub fn clean_columns(mut table: FlowTable) -> Result<FlowTable> {
    table.reset_index();
    rename_columns(&mut table)?;
    add_protocol_flags(&mut table)?;
    table.drop_columns(&IDENTIFYING_COLUMNS)?;

    let schema = RawSchema::detect(&table);
    debug!("normalizing {} rows as {:?}", table.len(), schema);
    match schema {
        RawSchema::BenignOnly => label_benign_only(&mut table)?,
        RawSchema::Mixed => label_mixed(&mut table)?,
    }
    Ok(table)
}

fn label_benign_only(table: &mut FlowTable) -> Result<()> {
    table.set_column(MALICIOUS, vec!["0".to_string(); table.len()])?;
    table.drop_columns(&BENIGN_ONLY_DROPPED)?;
    table.rename_column(PROTOCOL_NAME, LABEL)?;
    table.map_column(LABEL, |name| format!("{BENIGN_PREFIX}{name}"))
}

fn label_mixed(table: &mut FlowTable) -> Result<()> {
    let (malicious, labels): (Vec<String>, Vec<String>) = table
        .column(LABEL)?
        .into_iter()
        .map(|label| {
            if label == RAW_BENIGN {
                ("0".to_string(), BENIGN_UNKNOWN.to_string())
            } else {
                ("1".to_string(), label.to_string())
            }
        })
        .unzip();

    table.set_column(MALICIOUS, malicious)?;
    table.set_column(LABEL, labels)?;
    table.drop_columns(&MIXED_DROPPED)
}
