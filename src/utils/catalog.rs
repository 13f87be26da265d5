// src/utils/catalog.rs

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// A row of the reference file: display name and exchange ticker
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SymbolEntry {
    pub snome: String,
    pub symbol: String,
}

/// Static list of selectable cryptocurrencies, loaded once per session
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    entries: Vec<SymbolEntry>,
}

impl SymbolCatalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            DashboardError::Catalog(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    /// Reads a CSV with at least `snome` and `symbol` columns; other columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries = Vec::new();

        for (line, row) in csv_reader.deserialize::<SymbolEntry>().enumerate() {
            let entry = row?;
            if entry.snome.is_empty() || entry.symbol.is_empty() {
                return Err(DashboardError::Catalog(format!(
                    "row {} has an empty name or symbol",
                    line + 1
                )));
            }
            entries.push(entry);
        }

        if entries.is_empty() {
            return Err(DashboardError::Catalog("symbol catalog is empty".to_string()));
        }
        Ok(SymbolCatalog { entries })
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn find_by_name(&self, snome: &str) -> Option<&SymbolEntry> {
        self.entries.iter().find(|e| e.snome == snome.trim())
    }

    pub fn find_by_symbol(&self, symbol: &str) -> Option<&SymbolEntry> {
        self.entries
            .iter()
            .find(|e| e.symbol.eq_ignore_ascii_case(symbol.trim()))
    }
}
