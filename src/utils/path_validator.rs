use crate::error::{CopilotError, Result};
use std::path::{Path, PathBuf};

const FORBIDDEN: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

/// Provides safe path validation helpers to keep runs out of system directories.
pub struct PathValidator;

impl PathValidator {
    /// Validates and canonicalises the target root, a project directory or a
    /// descriptor file.
    pub fn validate_target(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            CopilotError::ProjectValidation(format!("Invalid path '{}': {e}", path.display()))
        })?;

        for forbidden in FORBIDDEN {
            let forbidden_path = Path::new(forbidden);

            if path.starts_with(forbidden_path) || canonical.starts_with(forbidden_path) {
                return Err(Self::forbidden(forbidden));
            }

            if let Ok(canonical_forbidden) = forbidden_path.canonicalize() {
                if canonical.starts_with(&canonical_forbidden) {
                    return Err(Self::forbidden(forbidden));
                }
            }
        }

        if canonical.is_dir() && !canonical.join("pom.xml").is_file() {
            return Err(CopilotError::ProjectValidation(format!(
                "No pom.xml found in '{}'",
                canonical.display()
            )));
        }

        Ok(canonical)
    }

    fn forbidden(dir: &str) -> CopilotError {
        CopilotError::ProjectValidation(format!(
            "Access to system directory '{dir}' is not allowed"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn accepts_project_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        let validated = PathValidator::validate_target(dir.path()).unwrap();
        assert!(validated.is_absolute());
    }

    #[test]
    fn accepts_descriptor_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("service.xml");
        fs::write(&file, "<project/>").unwrap();
        assert!(PathValidator::validate_target(&file).is_ok());
    }

    #[test]
    fn rejects_directory_without_pom() {
        let dir = tempdir().unwrap();
        let err = PathValidator::validate_target(dir.path()).unwrap_err();
        assert!(matches!(err, CopilotError::ProjectValidation(_)));
    }

    #[test]
    fn rejects_missing_path() {
        assert!(PathValidator::validate_target("/nonexistent/co-pilot/project").is_err());
    }

    #[test]
    fn rejects_system_directory() {
        assert!(PathValidator::validate_target("/etc").is_err());
    }
}
