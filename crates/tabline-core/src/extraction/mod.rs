pub mod artifact;
pub mod engine;
pub mod orchestrator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::TablineError;

/// Table segmentation strategy of the external engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Segment cells along detected ruling lines.
    #[default]
    Lattice,
    /// Segment cells on whitespace gaps.
    Stream,
}

impl ExtractionMode {
    pub fn flag(&self) -> &'static str {
        match self {
            ExtractionMode::Lattice => "--lattice",
            ExtractionMode::Stream => "--stream",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Lattice => write!(f, "lattice"),
            ExtractionMode::Stream => write!(f, "stream"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = TablineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lattice" => Ok(ExtractionMode::Lattice),
            "stream" => Ok(ExtractionMode::Stream),
            other => Err(TablineError::InvalidRequest(format!(
                "unknown mode '{other}' (expected 'lattice' or 'stream')"
            ))),
        }
    }
}

/// Validated page range expression: `all`, `N`, `N-M` or a comma list of those.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageSelector(String);

impl PageSelector {
    pub fn all() -> Self {
        PageSelector("all".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PageSelector {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for PageSelector {
    type Err = TablineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }

        let invalid = |reason: &str| {
            TablineError::InvalidRequest(format!("invalid page selector '{trimmed}': {reason}"))
        };
        let page = |p: &str| -> Result<u32, TablineError> {
            match p.trim().parse::<u32>() {
                Ok(0) => Err(invalid("pages start at 1")),
                Ok(n) => Ok(n),
                Err(_) => Err(invalid("expected a page number")),
            }
        };

        let mut items = Vec::new();
        for item in trimmed.split(',') {
            let item = item.trim();
            if item.is_empty() {
                return Err(invalid("empty item"));
            }
            match item.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (page(start)?, page(end)?);
                    if start > end {
                        return Err(invalid("range start is after its end"));
                    }
                    items.push(format!("{start}-{end}"));
                }
                None => items.push(page(item)?.to_string()),
            }
        }
        Ok(PageSelector(items.join(",")))
    }
}

impl TryFrom<String> for PageSelector {
    type Error = TablineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PageSelector> for String {
    fn from(p: PageSelector) -> String {
        p.0
    }
}

impl fmt::Display for PageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page region, in points, that extraction is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropArea {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl CropArea {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Result<Self, TablineError> {
        if ![top, left, bottom, right].iter().all(|v| v.is_finite()) {
            return Err(TablineError::InvalidRequest(
                "crop area coordinates must be finite numbers".into(),
            ));
        }
        if top > bottom || left > right {
            return Err(TablineError::InvalidRequest(format!(
                "crop area {top},{left},{bottom},{right} has top > bottom or left > right"
            )));
        }
        Ok(CropArea {
            top,
            left,
            bottom,
            right,
        })
    }

    /// The engine's `top,left,bottom,right` token.
    pub fn to_token(&self) -> String {
        format!("{},{},{},{}", self.top, self.left, self.bottom, self.right)
    }
}

impl FromStr for CropArea {
    type Err = TablineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| {
                TablineError::InvalidRequest(format!(
                    "invalid crop area '{s}' (expected top,left,bottom,right)"
                ))
            })?;
        match values.as_slice() {
            [top, left, bottom, right] => CropArea::new(*top, *left, *bottom, *right),
            _ => Err(TablineError::InvalidRequest(format!(
                "invalid crop area '{s}' (expected exactly 4 numbers)"
            ))),
        }
    }
}

/// What the caller wants back from an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    /// Write a CSV file at the given destination.
    CsvFile(PathBuf),
    /// Return the rows in memory.
    InMemoryMatrix,
}

/// Artifact format requested from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Csv,
    #[default]
    Json,
}

impl ArtifactFormat {
    pub fn engine_token(&self) -> &'static str {
        match self {
            ArtifactFormat::Csv => "CSV",
            ArtifactFormat::Json => "JSON",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Csv => "csv",
            ArtifactFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub document: PathBuf,
    pub pages: PageSelector,
    pub mode: ExtractionMode,
    pub area: Option<CropArea>,
    pub output: OutputKind,
}

impl ExtractionRequest {
    /// All pages, lattice mode, whole page, in-memory matrix.
    pub fn new(document: impl Into<PathBuf>) -> Self {
        ExtractionRequest {
            document: document.into(),
            pages: PageSelector::all(),
            mode: ExtractionMode::default(),
            area: None,
            output: OutputKind::InMemoryMatrix,
        }
    }

    pub fn pages(mut self, pages: PageSelector) -> Self {
        self.pages = pages;
        self
    }

    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn area(mut self, area: CropArea) -> Self {
        self.area = Some(area);
        self
    }

    pub fn write_csv_to(mut self, destination: impl Into<PathBuf>) -> Self {
        self.output = OutputKind::CsvFile(destination.into());
        self
    }
}

/// Rows of string cells, in the engine's order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMatrix {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    CsvFile(PathBuf),
    Matrix(TableMatrix),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_selector_forms() {
        let ok = |s: &str| s.parse::<PageSelector>().unwrap().to_string();
        assert_eq!(ok("all"), "all");
        assert_eq!(ok(" ALL "), "all");
        assert_eq!(ok("3"), "3");
        assert_eq!(ok("1-2"), "1-2");
        assert_eq!(ok("1, 3-5 ,9"), "1,3-5,9");
    }

    #[test]
    fn test_page_selector_rejects_garbage() {
        for bad in ["", "0", "2-1", "1,,2", "a-b", "1-", "-3", "first"] {
            let err = bad.parse::<PageSelector>().unwrap_err();
            assert!(matches!(err, TablineError::InvalidRequest(_)), "{bad}");
        }
    }

    #[test]
    fn test_mode_flags_are_distinct() {
        assert_eq!("stream".parse::<ExtractionMode>().unwrap().flag(), "--stream");
        assert_eq!("Lattice".parse::<ExtractionMode>().unwrap().flag(), "--lattice");
        assert!("both".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn test_crop_area_token() {
        let area: CropArea = "10, 20.5,300,400".parse().unwrap();
        assert_eq!(area.to_token(), "10,20.5,300,400");
        assert!("10,20,5".parse::<CropArea>().is_err());
        assert!("300,0,10,400".parse::<CropArea>().is_err());
        assert!("1,2,x,4".parse::<CropArea>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let req = ExtractionRequest::new("/tmp/doc.pdf");
        assert_eq!(req.pages.as_str(), "all");
        assert_eq!(req.mode, ExtractionMode::Lattice);
        assert!(req.area.is_none());
        assert_eq!(req.output, OutputKind::InMemoryMatrix);
    }
}
