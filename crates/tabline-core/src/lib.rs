pub mod config;
pub mod error;
pub mod extraction;
pub mod geometry;
pub mod layout;

use config::EngineConfig;
use error::TablineError;
use extraction::orchestrator::Orchestrator;
use extraction::{ExtractionRequest, ExtractionResult};
use layout::PageLines;
use tracing::info;

/// Main API entry point for layout markup: parse, reconstruct every page,
/// and return each page's lines in reading order.
pub fn reconstruct_markup(markup: &str) -> Result<Vec<PageLines>, TablineError> {
    let doc = layout::markup::parse_markup(markup)?;
    let pages = layout::reconstruct::reconstruct_document(&doc);

    info!(
        pages = pages.len(),
        lines = pages.iter().map(|p| p.lines.len()).sum::<usize>(),
        "reconstructed layout lines"
    );
    Ok(pages)
}

/// Same as [`reconstruct_markup`] for raw bytes from a layout backend.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn reconstruct_markup_bytes(markup: &[u8]) -> Result<Vec<PageLines>, TablineError> {
    reconstruct_markup(&String::from_utf8_lossy(markup))
}

/// One-shot table extraction with a fresh [`Orchestrator`].
pub fn extract_tables(
    request: &ExtractionRequest,
    config: EngineConfig,
) -> Result<ExtractionResult, TablineError> {
    Orchestrator::new(config)?.extract(request)
}
