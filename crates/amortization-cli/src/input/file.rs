use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk encodings accepted for input and configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            _ => FileFormat::Json,
        }
    }
}

/// Read a loan input file (always JSON) into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (canonical, contents) = load(path)?;
    parse(&canonical, &contents, FileFormat::Json)
}

/// Read a JSON input file as a generic serde_json::Value so flags can patch it.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    read_json(path)
}

/// Read a configuration file, YAML when the extension says so, JSON otherwise.
pub fn read_config<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (canonical, contents) = load(path)?;
    parse(&canonical, &contents, FileFormat::from_path(&canonical))
}

fn load(path: &str) -> Result<(PathBuf, String), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    Ok((canonical, contents))
}

fn parse<T: DeserializeOwned>(
    path: &Path,
    contents: &str,
    format: FileFormat,
) -> Result<T, Box<dyn std::error::Error>> {
    let parsed: Result<T, String> = match format {
        FileFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        FileFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| format!("Failed to parse '{}': {}", path.display(), e).into())
}

/// Resolve the path against the working directory and require a regular file.
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
