use std::{fs, io, path::Path};

use tracing::debug;

use crate::{error::AppError, profile::Registry};

/// Loads the registry from `path`.
///
/// A missing or blank file yields an empty registry. Anything else that does
/// not parse as a registry is `CorruptConfig`.
pub fn load_registry(path: &Path) -> Result<Registry, AppError> {
    let file_contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no registry file, starting empty");
            return Ok(Registry::default());
        }
        Err(err) => return Err(err.into()),
    };

    if file_contents.trim().is_empty() {
        return Ok(Registry::default());
    }

    serde_json::from_str(&file_contents).map_err(|err| AppError::CorruptConfig {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Saves the whole registry to `path`, replacing the previous file
///
/// # Arguments
/// * `registry` - Registry to save
pub fn save_registry(path: &Path, registry: &Registry) -> Result<(), AppError> {
    let mut json: String = serde_json::to_string_pretty(registry)?;
    json.push('\n');
    atomic_write(path, json.as_bytes())?;
    debug!(path = %path.display(), users = registry.users.len(), "registry saved");
    Ok(())
}

/// Writes to a sibling temp file, then renames it over `path`
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    fs::write(temp_path, data)?;
    fs::rename(temp_path, path)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::profile::{GlobalConfig, Identity};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = load_registry(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(registry, Registry::default());
    }

    #[test]
    fn test_load_blank_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blank.json");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(load_registry(&path).unwrap(), Registry::default());
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corrupt.json");
        fs::write(&path, "{ users: not json").unwrap();
        let err = load_registry(&path).unwrap_err();
        assert!(matches!(err, AppError::CorruptConfig { .. }));
    }

    #[test]
    fn test_load_wrong_shape_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shape.json");
        fs::write(&path, r#"{"users": 5}"#).unwrap();
        assert!(matches!(load_registry(&path), Err(AppError::CorruptConfig { .. })));
    }

    #[test]
    fn test_load_is_permissive_about_missing_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.json");
        fs::write(
            &path,
            r#"{"users":[{"id":1,"name":"Jane","email":"jane@x.com","alias":"jane","sshKeyPath":"/k"}],"extra":true}"#,
        )
        .unwrap();
        let registry = load_registry(&path).unwrap();
        assert_eq!(registry.users.len(), 1);
        assert_eq!(registry.active_user, None);
        assert!(!registry.git_applied);
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("registry.json");
        let registry = Registry {
            users: vec![Identity {
                id: 1,
                name: "Jane Doe".to_string(),
                email: "jane@x.com".to_string(),
                alias: "jane".to_string(),
                ssh_key_path: PathBuf::from("/home/jane/.ssh/id_rsa_jane"),
            }],
            active_user: Some(1),
            global_config: Some(GlobalConfig {
                name: "Jane".to_string(),
                email: "old@x.com".to_string(),
            }),
            git_applied: true,
        };

        save_registry(&path, &registry).unwrap();
        assert_eq!(load_registry(&path).unwrap(), registry);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"users\": ["));
        assert!(raw.ends_with("}\n"));
        assert!(!temp_dir.path().join("nested").join("registry.json.tmp").exists());
    }
}
