pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Read a command's input document from `--input` or piped stdin.
pub fn load_value(path: Option<&str>, command: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        debug!(path, command, "reading input file");
        file::read_value(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {command}").into())
    }
}

pub fn load<T: DeserializeOwned>(path: Option<&str>, command: &str) -> Result<T, Box<dyn std::error::Error>> {
    let value = load_value(path, command)?;
    Ok(serde_json::from_value(value)?)
}
