use std::fs;
use std::path::Path;

use cw_core::settings::{missing_first_run_values, Settings};
use serde_json::{Map, Value};

/// Raw key-value settings as stored on disk.
pub fn read_values(path: &Path) -> Result<Map<String, Value>, String> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    match serde_json::from_str(&content) {
        Ok(Value::Object(values)) => Ok(values),
        Ok(_) => Err(format!("'{}' must contain a JSON object", path.display())),
        Err(e) => Err(format!("Invalid JSON in '{}': {}", path.display(), e)),
    }
}

pub fn write_values(path: &Path, values: &Map<String, Value>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(values)
        .map_err(|e| format!("Failed to encode settings: {}", e))?;
    fs::write(path, json + "\n")
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
}

pub fn load(path: &Path) -> Result<Settings, String> {
    Ok(Settings::from_values(&read_values(path)?))
}

/// Write settings, keeping unknown keys already in the file.
pub fn save(path: &Path, settings: &Settings) -> Result<(), String> {
    let mut values = read_values(path)?;
    values.extend(settings.to_values());
    write_values(path, &values)
}

/// Fill in first-run defaults. Returns the keys that were added.
pub fn init(path: &Path, force: bool) -> Result<Vec<String>, String> {
    let mut values = if force { Map::new() } else { read_values(path)? };
    let missing = missing_first_run_values(&values);
    let added: Vec<String> = missing.keys().cloned().collect();
    values.extend(missing);
    write_values(path, &values)?;
    Ok(added)
}
