use rate_truth_core::EnginePolicy;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = read(&canonical)?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Load the engine policy from `path`, or the defaults when none is given.
///
/// `.yaml` / `.yml` files are read as YAML, anything else as JSON. Missing
/// fields take their default values; the merged policy must pass validation.
pub fn load_policy(path: Option<&str>) -> Result<EnginePolicy, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(EnginePolicy::default());
    };
    let canonical = resolve_path(path)?;
    let contents = read(&canonical)?;

    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let policy = if is_yaml {
        let policy: EnginePolicy = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse policy '{}': {}", canonical.display(), e))?;
        policy.validate()?;
        policy
    } else {
        EnginePolicy::from_json(&contents)
            .map_err(|e| format!("Policy '{}': {}", canonical.display(), e))?
    };

    tracing::debug!(path = %canonical.display(), "engine policy loaded");
    Ok(policy)
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    Ok(fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?)
}

/// Resolve the path against the working directory and check it names a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
