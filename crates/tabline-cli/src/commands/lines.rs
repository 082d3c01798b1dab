use std::path::PathBuf;
use tabline_core::error::TablineError;

use crate::output;

pub fn run(
    markup_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), TablineError> {
    let markup = std::fs::read(&markup_file)?;
    let pages = tabline_core::reconstruct_markup_bytes(&markup)?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&pages)?;
            std::fs::write(&path, json)?;
            let total: usize = pages.iter().map(|p| p.lines.len()).sum();
            eprintln!(
                "Reconstructed {} line(s) on {} page(s), written to {}",
                total,
                pages.len(),
                path.display()
            );
        }
        None => match output_format {
            "json" => output::json::print(&pages)?,
            _ => print!("{}", output::table::format_lines(&pages)),
        },
    }

    Ok(())
}
