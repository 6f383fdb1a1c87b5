//! Postal city tables loaded from tab-separated files.
//!
//! Each row maps a postal code id to one locality:
//!
//! ```text
//! postalcode_id <TAB> locality_id <TAB> locality_name [<TAB> locality_abbr]
//! ```
//!
//! Rows for the same postal code keep their file order, so the first row is
//! the preferred city. Blank lines and lines starting with `#` are skipped.

use std::io::{self, BufRead, BufReader};

use admin_lookup_core::{PostalCity, PostalCityTable};
use admin_lookup_fs::open_utf8_file;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use thiserror::Error;

/// Errors raised while loading a postal city table.
#[derive(Debug, Error)]
pub enum PostalCityTableError {
    /// The table file could not be opened.
    #[error("failed to open postal city table at {path}: {source}")]
    Open {
        /// Path as supplied.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A line could not be read.
    #[error("failed to read postal city table at line {line}: {source}")]
    Read {
        /// One-based line number.
        line: usize,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A row did not have three or four fields.
    #[error("line {line}: expected 3 or 4 tab-separated fields, found {found}")]
    FieldCount {
        /// One-based line number.
        line: usize,
        /// Number of fields present.
        found: usize,
    },
    /// A mandatory field was blank.
    #[error("line {line}: {field} must not be empty")]
    EmptyField {
        /// One-based line number.
        line: usize,
        /// Name of the blank column.
        field: &'static str,
    },
}

/// Parse a postal city table from `reader`.
///
/// # Errors
///
/// Returns [`PostalCityTableError`] on the first unreadable or malformed row.
///
/// # Examples
/// ```
/// use admin_lookup_data::parse_postal_cities;
///
/// let tsv = "# postal code\tid\tname\tabbr\n554784671\t85922583\tSan Francisco\tSF\n";
/// let table = parse_postal_cities(tsv.as_bytes())?;
/// assert_eq!(table.get("554784671")[0].name, "San Francisco");
/// # Ok::<(), admin_lookup_data::PostalCityTableError>(())
/// ```
pub fn parse_postal_cities<R: BufRead>(reader: R) -> Result<PostalCityTable, PostalCityTableError> {
    let mut table = PostalCityTable::new();
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|source| PostalCityTableError::Read {
            line: line_number,
            source,
        })?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let (postalcode_id, city) = parse_row(&line, line_number)?;
        table.insert(postalcode_id, city);
    }
    debug!("loaded postal cities for {} postal codes", table.len());
    Ok(table)
}

/// Load a postal city table from `path`.
///
/// # Errors
///
/// Returns [`PostalCityTableError::Open`] when the file cannot be opened and
/// the errors of [`parse_postal_cities`] otherwise.
pub fn load_postal_cities(path: &Utf8Path) -> Result<PostalCityTable, PostalCityTableError> {
    let file = open_utf8_file(path).map_err(|source| PostalCityTableError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_postal_cities(BufReader::new(file.into_std()))
}

fn parse_row(line: &str, line_number: usize) -> Result<(String, PostalCity), PostalCityTableError> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').map(str::trim).collect();
    let (postalcode_id, id, name, abbr) = match fields.as_slice() {
        [postalcode_id, id, name] => (*postalcode_id, *id, *name, None),
        [postalcode_id, id, name, abbr] => (*postalcode_id, *id, *name, Some(*abbr)),
        other => {
            return Err(PostalCityTableError::FieldCount {
                line: line_number,
                found: other.len(),
            });
        }
    };
    for (field, value) in [
        ("postalcode_id", postalcode_id),
        ("locality_id", id),
        ("locality_name", name),
    ] {
        if value.is_empty() {
            return Err(PostalCityTableError::EmptyField {
                line: line_number,
                field,
            });
        }
    }
    let city = PostalCity {
        id: id.to_owned(),
        name: name.to_owned(),
        abbr: abbr.filter(|abbr| !abbr.is_empty()).map(str::to_owned),
    };
    Ok((postalcode_id.to_owned(), city))
}
