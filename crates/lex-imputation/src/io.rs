//! CSV loading and writing.

use crate::error::{ImputationError, Result, ResultExt};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

/// How to parse an input CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Field values read as null, in addition to empty fields.
    pub null_markers: Vec<String>,
    /// Rows used for schema inference. `None` scans the whole file.
    pub infer_schema_length: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            null_markers: vec!["NA".to_string()],
            infer_schema_length: Some(10_000),
        }
    }
}

/// Load a header-having, comma-separated file.
pub fn load_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImputationError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", path.display()),
        )));
    }

    let null_values = (!options.null_markers.is_empty()).then(|| {
        NullValues::AllColumns(
            options
                .null_markers
                .iter()
                .map(|marker| PlSmallStr::from(marker.as_str()))
                .collect(),
        )
    });

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_length)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_null_values(null_values),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("reading {}", path.display()))?
        .finish()
        .context(format!("parsing {}", path.display()))?;

    info!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Write `df` with a header row, creating parent directories as needed.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)
        .context(format!("writing {}", path.display()))?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
