//! Readers for the tab separated reference tables and per model compound tables
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

pub const FORMULA_TABLE: &str = "newFormulaDict.txt";
pub const CHARGE_TABLE: &str = "newChargeDict.txt";
pub const CURRENCY_PAIRS: &str = "currencyRemovePairs.txt";
pub const AMINO_PAIRS: &str = "currencyAminoPairs.txt";
pub const CURRENCY_SINGLETONS: &str = "currencyRemoveSingletons.txt";

/// Reference data shared by every model of a batch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceTables {
    /// Metabolite id to corrected formula
    pub formulas: IndexMap<String, String>,
    /// Metabolite id to corrected charge
    pub charges: IndexMap<String, i32>,
    /// Currency metabolite pairs removed from every reaction containing both
    pub currency_pairs: Vec<(String, String)>,
    /// Amino group transfer pairs, removed unless the reaction also involves ammonia
    pub amino_pairs: Vec<(String, String)>,
    /// Currency metabolites removed from the model outright
    pub singletons: Vec<String>,
}

impl ReferenceTables {
    /// Load the five reference tables from `dir` using their standard file names
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, TableError> {
        let dir = dir.as_ref();
        let charges = read_value_table(dir.join(CHARGE_TABLE))?
            .into_iter()
            .map(|(id, value)| match value.parse::<i32>() {
                Ok(charge) => Ok((id, charge)),
                Err(_) => Err(TableError::Malformed {
                    path: dir.join(CHARGE_TABLE),
                    line: 0,
                    reason: format!("charge '{}' of {} is not an integer", value, id),
                }),
            })
            .collect::<Result<IndexMap<String, i32>, TableError>>()?;
        Ok(ReferenceTables {
            formulas: read_value_table(dir.join(FORMULA_TABLE))?,
            charges,
            currency_pairs: read_pair_list(dir.join(CURRENCY_PAIRS))?,
            amino_pairs: read_pair_list(dir.join(AMINO_PAIRS))?,
            singletons: read_id_list(dir.join(CURRENCY_SINGLETONS))?,
        })
    }
}

fn read_lines(path: &Path) -> Result<String, TableError> {
    fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Iterate over the non blank lines of a table along with their 1-based line numbers
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Read a two column `id<TAB>value` table
pub fn read_value_table<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, String>, TableError> {
    let path = path.as_ref();
    let text = read_lines(path)?;
    let mut table = IndexMap::new();
    for (line_num, line) in data_lines(&text) {
        let (key, value) = line.split_once('\t').ok_or_else(|| TableError::Malformed {
            path: path.to_path_buf(),
            line: line_num,
            reason: "expected two tab separated columns".to_string(),
        })?;
        table.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(table)
}

/// Read a list of tab separated metabolite id pairs
pub fn read_pair_list<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>, TableError> {
    let path = path.as_ref();
    let text = read_lines(path)?;
    data_lines(&text)
        .map(|(line_num, line)| {
            let fields: Vec<&str> = line.trim().split('\t').map(str::trim).collect();
            match fields.as_slice() {
                [first, second] => Ok((first.to_string(), second.to_string())),
                _ => Err(TableError::Malformed {
                    path: path.to_path_buf(),
                    line: line_num,
                    reason: format!("expected a pair of ids, found {} fields", fields.len()),
                }),
            }
        })
        .collect()
}

/// Read a list of ids, one per line
pub fn read_id_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>, TableError> {
    let text = read_lines(path.as_ref())?;
    Ok(data_lines(&text)
        .map(|(_, line)| line.trim().to_string())
        .collect())
}

/// Formulas of the compounds of one model, keyed by compound id without compartment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompoundTable {
    formulas: IndexMap<String, Option<String>>,
}

impl CompoundTable {
    /// Read a tab separated compound table with a header row
    ///
    /// The id column is the one named `id`, or the first column. The formula column is
    /// the one named `formula`. Empty formulas are kept as `None`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let text = read_lines(path)?;
        let mut lines = data_lines(&text);
        let (_, header) = lines.next().ok_or_else(|| TableError::Malformed {
            path: path.to_path_buf(),
            line: 1,
            reason: "compound table is empty".to_string(),
        })?;
        let (id_col, formula_col) = compound_columns(header, path)?;
        let mut formulas = IndexMap::new();
        for (line_num, line) in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            let id = fields.get(id_col).map(|s| s.trim()).unwrap_or_default();
            if id.is_empty() {
                return Err(TableError::Malformed {
                    path: path.to_path_buf(),
                    line: line_num,
                    reason: "missing compound id".to_string(),
                });
            }
            let formula = fields
                .get(formula_col)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from);
            formulas.insert(id.to_string(), formula);
        }
        Ok(CompoundTable { formulas })
    }

    /// Check that the table can be opened and its header names the required columns
    pub fn validate<P: AsRef<Path>>(path: P) -> Result<(), TableError> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut header = String::new();
        BufReader::new(file)
            .read_line(&mut header)
            .map_err(|source| TableError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        compound_columns(header.trim_end(), path).map(|_| ())
    }

    /// Formula of a compound; `None` if the compound is absent, `Some(None)` if it has no formula
    pub fn formula(&self, compound_id: &str) -> Option<Option<&str>> {
        self.formulas.get(compound_id).map(|f| f.as_deref())
    }
}

impl FromIterator<(String, Option<String>)> for CompoundTable {
    fn from_iter<T: IntoIterator<Item = (String, Option<String>)>>(iter: T) -> Self {
        CompoundTable {
            formulas: iter.into_iter().collect(),
        }
    }
}

fn compound_columns(header: &str, path: &Path) -> Result<(usize, usize), TableError> {
    let columns: Vec<String> = header
        .split('\t')
        .map(|c| c.trim().to_lowercase())
        .collect();
    let id_col = columns.iter().position(|c| c == "id").unwrap_or(0);
    let formula_col = columns
        .iter()
        .position(|c| c == "formula")
        .ok_or_else(|| TableError::MissingColumn {
            path: path.to_path_buf(),
            column: "formula".to_string(),
        })?;
    Ok((id_col, formula_col))
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Unable to read {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed table {path} at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("Table {path} has no {column} column")]
    MissingColumn { path: PathBuf, column: String },
}
