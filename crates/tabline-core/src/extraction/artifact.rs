use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::error::TablineError;
use crate::extraction::{ArtifactFormat, TableMatrix};

/// JSON shapes the engine may write: a plain matrix of strings, its list of
/// tables, or a single table. Tried in that order; a table can itself be read
/// from a sequence, so the plain matrix must come first.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonArtifact {
    Plain(Vec<Vec<String>>),
    Tables(Vec<JsonTable>),
    Table(JsonTable),
}

#[derive(Deserialize)]
struct JsonTable {
    #[serde(default)]
    data: Vec<Vec<JsonCell>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonCell {
    Cell {
        #[serde(default)]
        text: String,
    },
    Bare(String),
}

impl JsonCell {
    fn into_text(self) -> String {
        match self {
            JsonCell::Cell { text } => text,
            JsonCell::Bare(text) => text,
        }
    }
}

/// Read an engine artifact into a matrix.
pub fn read_matrix(path: &Path, format: ArtifactFormat) -> Result<TableMatrix, TablineError> {
    let file = std::fs::File::open(path).map_err(|e| {
        TablineError::OutputParseFailed(format!("cannot open {}: {e}", path.display()))
    })?;
    match format {
        ArtifactFormat::Csv => parse_csv_matrix(file),
        ArtifactFormat::Json => parse_json_matrix(file),
    }
}

/// Parse CSV with no header row; rows may have differing lengths.
pub fn parse_csv_matrix<R: Read>(reader: R) -> Result<TableMatrix, TablineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| TablineError::OutputParseFailed(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(TableMatrix { rows })
}

/// Parse a JSON artifact. Rows of consecutive tables are concatenated.
pub fn parse_json_matrix<R: Read>(reader: R) -> Result<TableMatrix, TablineError> {
    let artifact: JsonArtifact = serde_json::from_reader(reader)
        .map_err(|e| TablineError::OutputParseFailed(e.to_string()))?;

    let rows = match artifact {
        JsonArtifact::Plain(rows) => rows,
        JsonArtifact::Table(table) => table_rows(table),
        JsonArtifact::Tables(tables) => tables.into_iter().flat_map(table_rows).collect(),
    };
    Ok(TableMatrix { rows })
}

fn table_rows(table: JsonTable) -> Vec<Vec<String>> {
    table
        .data
        .into_iter()
        .map(|row| row.into_iter().map(JsonCell::into_text).collect())
        .collect()
}
