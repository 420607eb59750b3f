use crate::maven::version::Version;
use crate::repository::{Coordinate, PlatformClient, RepositoryClient, VersionStrategy};
use std::sync::Arc;

/// Where the target version of an entry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Newest stable release of the coordinate itself
    Stable,
    /// Newest release including pre-releases
    Latest,
    /// Newest stable release of another coordinate's line
    Track(Coordinate),
    /// The Spring Boot platform release train
    SpringBoot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Upgrade(String),
    UpToDate,
    Unresolved(String),
}

pub struct VersionResolver {
    library_client: Arc<dyn RepositoryClient>,
    platform_client: Arc<dyn PlatformClient>,
    version_strategy: Arc<dyn VersionStrategy>,
    include_prereleases: bool,
}

impl VersionResolver {
    pub fn new(
        library_client: Arc<dyn RepositoryClient>,
        platform_client: Arc<dyn PlatformClient>,
        version_strategy: Arc<dyn VersionStrategy>,
        include_prereleases: bool,
    ) -> Self {
        Self {
            library_client,
            platform_client,
            version_strategy,
            include_prereleases,
        }
    }

    pub fn is_upgrade(&self, current: &str, candidate: &str) -> bool {
        self.version_strategy.is_upgrade(current, candidate)
    }

    /// Picks the version `current` should move to. Never proposes a version
    /// that is not strictly newer than `current`. An entry already on a
    /// pre-release follows the `Latest` channel.
    pub fn resolve(&self, coordinate: &Coordinate, current: &str, channel: &Channel) -> Resolution {
        let parsed = Version::parse(current);
        if !parsed.is_comparable() {
            return Resolution::Unresolved(format!("current version '{current}' is not comparable"));
        }

        let channel = match channel {
            Channel::Stable if !parsed.is_stable() => &Channel::Latest,
            other => other,
        };

        let (versions, stable_only) = match channel {
            Channel::Stable => (
                self.library_client.fetch_available_versions(coordinate),
                !self.include_prereleases,
            ),
            Channel::Latest => (self.library_client.fetch_available_versions(coordinate), false),
            Channel::Track(target) => (
                self.library_client.fetch_available_versions(target),
                !self.include_prereleases,
            ),
            Channel::SpringBoot => (
                self.platform_client.fetch_platform_versions(),
                !self.include_prereleases,
            ),
        };

        let versions = match versions {
            Ok(versions) => versions,
            Err(e) => {
                tracing::debug!(%coordinate, error = %e, "version lookup failed");
                return Resolution::Unresolved(e.to_string());
            }
        };

        if versions.is_empty() {
            return Resolution::Unresolved("no published versions found".into());
        }

        match self.version_strategy.select_latest(current, &versions, stable_only) {
            Some(candidate) if self.version_strategy.is_upgrade(current, &candidate) => {
                Resolution::Upgrade(candidate)
            }
            Some(_) => Resolution::UpToDate,
            None => Resolution::Unresolved("no eligible release found".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::StaticRepository;
    use crate::repository::DefaultVersionStrategy;

    fn resolver(repo: StaticRepository, include_prereleases: bool) -> VersionResolver {
        let repo = Arc::new(repo);
        VersionResolver::new(
            repo.clone(),
            repo,
            DefaultVersionStrategy::shared(),
            include_prereleases,
        )
    }

    fn widget() -> Coordinate {
        Coordinate::new("org.acme", "widget")
    }

    #[test]
    fn stable_channel_skips_prereleases() {
        let repo = StaticRepository::new().with("org.acme", "widget", &["1.2.0", "1.3.0", "1.4.0-RC1"]);
        assert_eq!(
            resolver(repo, false).resolve(&widget(), "1.2.0", &Channel::Stable),
            Resolution::Upgrade("1.3.0".into())
        );
    }

    #[test]
    fn latest_channel_accepts_prereleases() {
        let repo = StaticRepository::new().with("org.acme", "widget", &["1.2.0", "1.3.0", "1.4.0-RC1"]);
        assert_eq!(
            resolver(repo, false).resolve(&widget(), "1.2.0", &Channel::Latest),
            Resolution::Upgrade("1.4.0-RC1".into())
        );
    }

    #[test]
    fn prerelease_current_follows_latest() {
        let repo = StaticRepository::new().with("org.acme", "widget", &["1.3.0", "2.0.0-M1", "2.0.0-RC1"]);
        assert_eq!(
            resolver(repo, false).resolve(&widget(), "2.0.0-M1", &Channel::Stable),
            Resolution::Upgrade("2.0.0-RC1".into())
        );
    }

    #[test]
    fn include_prereleases_widens_stable_channel() {
        let repo = StaticRepository::new().with("org.acme", "widget", &["1.3.0", "1.4.0-M2"]);
        assert_eq!(
            resolver(repo, true).resolve(&widget(), "1.3.0", &Channel::Stable),
            Resolution::Upgrade("1.4.0-M2".into())
        );
    }

    #[test]
    fn never_downgrades() {
        let repo = StaticRepository::new().with("org.acme", "widget", &["1.0.0", "1.1.0"]);
        let resolver = resolver(repo, false);
        assert_eq!(resolver.resolve(&widget(), "1.1.0", &Channel::Stable), Resolution::UpToDate);
        assert_eq!(resolver.resolve(&widget(), "2.0.0", &Channel::Stable), Resolution::UpToDate);
    }

    #[test]
    fn tracks_another_coordinate() {
        let repo = StaticRepository::new()
            .with("org.jetbrains.kotlin", "kotlin-stdlib", &["1.9.20", "2.0.0", "2.1.0-Beta1"])
            .with("org.jetbrains.kotlin", "kotlin-maven-plugin", &["1.9.25"]);
        let plugin = Coordinate::new("org.jetbrains.kotlin", "kotlin-maven-plugin");
        let channel = Channel::Track(Coordinate::new("org.jetbrains.kotlin", "kotlin-stdlib"));
        assert_eq!(
            resolver(repo, false).resolve(&plugin, "1.9.20", &channel),
            Resolution::Upgrade("2.0.0".into())
        );
    }

    #[test]
    fn spring_boot_channel_reads_platform_train() {
        let repo = StaticRepository::new().with_platform(&["3.3.5", "3.4.0-SNAPSHOT", "3.2.11"]);
        let parent = Coordinate::new("org.springframework.boot", "spring-boot-starter-parent");
        assert_eq!(
            resolver(repo, false).resolve(&parent, "3.2.0", &Channel::SpringBoot),
            Resolution::Upgrade("3.3.5".into())
        );
    }

    #[test]
    fn failures_are_unresolved() {
        let offline = resolver(StaticRepository::unreachable(), false);
        assert!(matches!(
            offline.resolve(&widget(), "1.0.0", &Channel::Stable),
            Resolution::Unresolved(_)
        ));

        let empty = resolver(StaticRepository::new(), false);
        assert!(matches!(
            empty.resolve(&widget(), "1.0.0", &Channel::Stable),
            Resolution::Unresolved(_)
        ));
    }

    #[test]
    fn non_comparable_current_is_unresolved() {
        let repo = StaticRepository::new().with("org.acme", "widget", &["1.3.0"]);
        assert!(matches!(
            resolver(repo, false).resolve(&widget(), "LATEST", &Channel::Stable),
            Resolution::Unresolved(_)
        ));
    }

    #[test]
    fn keeps_the_release_flavour() {
        let repo = StaticRepository::new().with(
            "com.google.guava",
            "guava",
            &["31.1-android", "33.0.0-android", "33.0.0-jre"],
        );
        let guava = Coordinate::new("com.google.guava", "guava");
        assert_eq!(
            resolver(repo, false).resolve(&guava, "31.1-android", &Channel::Stable),
            Resolution::Upgrade("33.0.0-android".into())
        );
    }

    #[test]
    fn unparseable_candidates_are_discarded() {
        let repo = StaticRepository::new().with("org.acme", "widget", &["nightly", "1.2.1"]);
        assert_eq!(
            resolver(repo, false).resolve(&widget(), "1.2.0", &Channel::Stable),
            Resolution::Upgrade("1.2.1".into())
        );
    }
}
