use tabline_core::error::TablineError;
use tabline_core::extraction::orchestrator::Orchestrator;

use super::EngineOverrides;

pub fn run(engine: EngineOverrides) -> Result<(), TablineError> {
    let orchestrator = Orchestrator::new(engine.resolve()?)?;
    let config = orchestrator.config();
    let command = std::iter::once(config.program.display().to_string())
        .chain(config.args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");

    if !orchestrator.engine_available() {
        return Err(TablineError::EngineNotFound { program: command });
    }

    println!("Engine '{command}' is available.");
    println!("  Timeout: {}s", config.timeout().as_secs_f64());
    println!("  Matrix artifact format: {}", config.matrix_format.engine_token());
    Ok(())
}
