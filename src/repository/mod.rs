use crate::error::Result;
use crate::maven::version::VersionComparator;
use std::fmt;
use std::sync::Arc;

pub mod factory;
pub use factory::RepositoryFactory;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
}

impl Coordinate {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

/// Source of published versions for a single coordinate.
pub trait RepositoryClient: Send + Sync {
    fn fetch_available_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>>;
}

/// Source of the versions of a platform release train.
pub trait PlatformClient: Send + Sync {
    fn fetch_platform_versions(&self) -> Result<Vec<String>>;
}

pub trait VersionStrategy: Send + Sync {
    /// Newest candidate `current` may move to.
    fn select_latest(&self, current: &str, versions: &[String], stable_only: bool) -> Option<String>;
    fn is_upgrade(&self, current: &str, candidate: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct DefaultVersionStrategy;

impl VersionStrategy for DefaultVersionStrategy {
    fn select_latest(&self, current: &str, versions: &[String], stable_only: bool) -> Option<String> {
        VersionComparator::get_latest_for(current, versions, stable_only)
    }

    fn is_upgrade(&self, current: &str, candidate: &str) -> bool {
        VersionComparator::is_newer(candidate, current)
    }
}

impl DefaultVersionStrategy {
    pub fn shared() -> Arc<dyn VersionStrategy> {
        Arc::new(Self)
    }
}
