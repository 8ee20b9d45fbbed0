//! Metadata configuration
//!
//! Header values come from an optional JSON file (`--config`) overlaid with
//! command-line flags. Flags win over file values.

use std::fs;
use std::path::Path;

use us_compiler::metadata::DEFAULT_NAMESPACE;
use us_compiler::ScriptMetadata;

/// Metadata flags as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct MetadataFlags {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub author: Option<String>,
    pub homepage: Option<String>,
}

pub fn load_metadata(
    config: Option<&Path>,
    flags: MetadataFlags,
) -> Result<ScriptMetadata, String> {
    let base = match config {
        Some(path) => read_config(path)?,
        None => ScriptMetadata::default(),
    };
    Ok(base.merge(ScriptMetadata {
        name: flags.name,
        namespace: flags.namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        author: flags.author,
        homepage: flags.homepage,
    }))
}

fn read_config(path: &Path) -> Result<ScriptMetadata, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Invalid config '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = std::env::temp_dir().join(format!("us-cli-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("meta.json");
        fs::write(
            &path,
            r#"{ "name": "From file", "author": "file", "namespace": "file.ns" }"#,
        )
        .unwrap();

        let flags = MetadataFlags {
            name: Some("From flag".to_string()),
            ..MetadataFlags::default()
        };
        let metadata = load_metadata(Some(&path), flags).unwrap();
        assert_eq!(metadata.name.as_deref(), Some("From flag"));
        assert_eq!(metadata.author.as_deref(), Some("file"));
        assert_eq!(metadata.namespace, "file.ns");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_config_is_an_error() {
        let err = load_metadata(Some(Path::new("/nonexistent/meta.json")), MetadataFlags::default())
            .unwrap_err();
        assert!(err.starts_with("Failed to read"));
    }

    #[test]
    fn defaults_without_config() {
        let metadata = load_metadata(None, MetadataFlags::default()).unwrap();
        assert_eq!(metadata, ScriptMetadata::default());
    }
}
