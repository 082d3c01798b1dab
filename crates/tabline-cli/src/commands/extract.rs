use std::path::PathBuf;
use tabline_core::error::TablineError;
use tabline_core::extraction::orchestrator::Orchestrator;
use tabline_core::extraction::{CropArea, ExtractionMode, ExtractionRequest, ExtractionResult};

use super::EngineOverrides;
use crate::output;

pub struct ExtractArgs {
    pub document: PathBuf,
    pub out: Option<PathBuf>,
    pub pages: String,
    pub mode: String,
    pub area: Option<String>,
    pub engine: EngineOverrides,
    pub output_format: String,
}

pub fn run(args: ExtractArgs) -> Result<(), TablineError> {
    let mut request = ExtractionRequest::new(args.document)
        .pages(args.pages.parse()?)
        .mode(args.mode.parse::<ExtractionMode>()?);
    if let Some(area) = &args.area {
        request = request.area(area.parse::<CropArea>()?);
    }
    if let Some(out) = args.out {
        request = request.write_csv_to(out);
    }

    let orchestrator = Orchestrator::new(args.engine.resolve()?)?;

    match orchestrator.extract(&request)? {
        ExtractionResult::CsvFile(path) => {
            eprintln!("Tables written to {}", path.display());
        }
        ExtractionResult::Matrix(matrix) => match args.output_format.as_str() {
            "json" => output::json::print(&matrix)?,
            _ => print!("{}", output::table::format_matrix(&matrix)),
        },
    }

    Ok(())
}
