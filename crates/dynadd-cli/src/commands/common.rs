//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use dynadd_compile::BackendProperties;
use dynadd_ir::CircuitRecord;

/// Load a circuit record from a JSON file.
pub fn load_record(path: &str) -> Result<CircuitRecord> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid circuit record: {path}"))
}

/// Load backend properties; `.json` files are JSON, anything else YAML.
pub fn load_backend(path: &str) -> Result<BackendProperties> {
    if !Path::new(path).exists() {
        anyhow::bail!("Backend file not found: {path}");
    }
    BackendProperties::load(Path::new(path))
        .with_context(|| format!("Failed to load backend: {path}"))
}

/// Write a circuit record as pretty-printed JSON.
pub fn save_record(record: &CircuitRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// `<dir>/<stem>_dd.json` next to `input`.
pub fn default_output(input: &str) -> PathBuf {
    let path = Path::new(input);
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!("{stem}_dd.json"))
}
