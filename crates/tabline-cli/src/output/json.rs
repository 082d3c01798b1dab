use serde::Serialize;
use tabline_core::error::TablineError;

pub fn print<T: Serialize>(value: &T) -> Result<(), TablineError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
