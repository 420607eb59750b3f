use crate::maven::pom::PomModel;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const DESCRIPTOR_NAME: &str = "pom.xml";

/// ProjectScannerAgent finds the descriptors a run should process
pub struct ProjectScannerAgent {
    root: PathBuf,
}

impl ProjectScannerAgent {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The root descriptor: `pom.xml` inside a directory, or the file itself.
    pub fn root_descriptor(&self) -> PathBuf {
        descriptor_path(&self.root)
    }

    /// Ordered descriptor paths. Recursive mode walks `<modules>` depth-first
    /// in declaration order, listing each descriptor once. A module that
    /// cannot be read is still listed; its own modules stay undiscovered.
    pub fn discover(&self, recursive: bool) -> Vec<PathBuf> {
        let root = self.root_descriptor();
        if !recursive {
            return vec![root];
        }

        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        Self::visit(root, &mut ordered, &mut visited);
        ordered
    }

    fn visit(path: PathBuf, ordered: &mut Vec<PathBuf>, visited: &mut HashSet<PathBuf>) {
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !visited.insert(key) {
            return;
        }
        ordered.push(path.clone());

        let modules = match PomModel::load(&path) {
            Ok(model) => model.modules(),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot read modules");
                return;
            }
        };

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for module in modules {
            Self::visit(descriptor_path(&base.join(module)), ordered, visited);
        }
    }
}

fn descriptor_path(path: &Path) -> PathBuf {
    let is_descriptor_file = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    if is_descriptor_file && !path.is_dir() {
        path.to_path_buf()
    } else {
        path.join(DESCRIPTOR_NAME)
    }
}
