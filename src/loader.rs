//! Document loading from files and strings.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;

/// Load a JSON document (a Swagger spec or a payload) from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_json_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_json(&dir.path().join("swagger.json")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn load_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("swagger.json");
        fs::write(&path, r#"{"basePath": "/api", "paths": {}}"#).unwrap();

        let doc = load_json(&path).unwrap();
        assert_eq!(doc["basePath"], "/api");
    }

    #[test]
    fn load_invalid_json() {
        let err = load_json_str("{ not json").unwrap_err();
        assert!(matches!(err, LoadError::InvalidJson { .. }));
    }
}
