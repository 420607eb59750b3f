use crate::agents::property_rewriter::PropertyName;
use crate::agents::resolver::Channel;
use crate::agents::upgrade::context::UpgradeContext;
use crate::agents::upgrade::report::{Location, UpgradeOutcome, UpgradeReport, UpgradeResult};
use crate::maven::pom::{Artifact, EntryKind, PomModel};
use crate::repository::Coordinate;
use colored::Colorize;

pub const KOTLIN_PROPERTY: &str = "kotlin.version";
const KOTLIN_GROUP: &str = "org.jetbrains.kotlin";

/// Handles the Kotlin toolchain version, tracked against kotlin-stdlib
pub struct KotlinHandler<'a, 'r> {
    context: &'a mut UpgradeContext<'r>,
}

impl<'a, 'r> KotlinHandler<'a, 'r> {
    pub fn new(context: &'a mut UpgradeContext<'r>) -> Self {
        Self { context }
    }

    pub fn stdlib() -> Coordinate {
        Coordinate::new(KOTLIN_GROUP, "kotlin-stdlib")
    }

    pub fn maven_plugin() -> Coordinate {
        Coordinate::new(KOTLIN_GROUP, "kotlin-maven-plugin")
    }

    pub fn upgrade(&mut self, model: &mut PomModel) -> UpgradeReport {
        println!("\n{}", "Checking Kotlin version...".cyan());

        let channel = Channel::Track(Self::stdlib());
        let mut report = UpgradeReport::new();

        if model.property(KOTLIN_PROPERTY).is_some() {
            if let Some(result) =
                self.context
                    .upgrade_property(model, KOTLIN_PROPERTY, &Self::stdlib(), &channel)
            {
                report.push(result);
            }
            return report;
        }

        let plugins: Vec<Artifact> = [EntryKind::Plugin, EntryKind::ManagedPlugin]
            .iter()
            .filter_map(|kind| model.find_artifact(*kind, &Self::maven_plugin()))
            .collect();

        if plugins.is_empty() {
            report.push(UpgradeResult::new(
                Self::maven_plugin(),
                Location::Entry(EntryKind::Plugin),
                UpgradeOutcome::NotFound,
            ));
            return report;
        }

        let naming = PropertyName::Explicit(KOTLIN_PROPERTY.to_string());
        for plugin in plugins {
            if let Some(result) = self
                .context
                .upgrade_artifact(model, &plugin, &channel, &naming)
            {
                report.push(result);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::classifier::OwnershipClassifier;
    use crate::agents::resolver::VersionResolver;
    use crate::maven::pom::tests::DEMO_POM;
    use crate::repository::testing::StaticRepository;
    use crate::repository::DefaultVersionStrategy;
    use std::sync::Arc;

    fn resolver() -> VersionResolver {
        let repo = Arc::new(
            StaticRepository::new()
                .with(KOTLIN_GROUP, "kotlin-stdlib", &["1.9.22", "2.0.21", "2.1.0-RC2"])
                .with(KOTLIN_GROUP, "kotlin-maven-plugin", &["1.9.22", "1.9.25"]),
        );
        VersionResolver::new(repo.clone(), repo, DefaultVersionStrategy::shared(), false)
    }

    #[test]
    fn updates_existing_property() {
        let pom = r#"<project>
    <properties><kotlin.version>1.9.22</kotlin.version></properties>
    <build><plugins><plugin>
        <groupId>org.jetbrains.kotlin</groupId>
        <artifactId>kotlin-maven-plugin</artifactId>
        <version>${kotlin.version}</version>
    </plugin></plugins></build>
</project>"#;
        let resolver = resolver();
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(pom).unwrap();

        let report = KotlinHandler::new(&mut context).upgrade(&mut model);

        assert_eq!(report.results.len(), 1);
        assert_eq!(
            report.results[0].location,
            Location::Property(KOTLIN_PROPERTY.into())
        );
        assert_eq!(model.property(KOTLIN_PROPERTY), Some("2.0.21"));
        assert!(context.session.is_property_touched(KOTLIN_PROPERTY));
    }

    #[test]
    fn literal_plugin_version_becomes_kotlin_property() {
        let pom = r#"<project>
    <build><plugins><plugin>
        <groupId>org.jetbrains.kotlin</groupId>
        <artifactId>kotlin-maven-plugin</artifactId>
        <version>1.9.22</version>
    </plugin></plugins></build>
</project>"#;
        let resolver = resolver();
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(pom).unwrap();

        let report = KotlinHandler::new(&mut context).upgrade(&mut model);

        assert_eq!(
            report.results[0].outcome,
            UpgradeOutcome::Upgraded {
                from: "1.9.22".into(),
                to: "2.0.21".into(),
                property: Some(KOTLIN_PROPERTY.into()),
            }
        );
        let plugin = model
            .find_artifact(EntryKind::Plugin, &KotlinHandler::maven_plugin())
            .unwrap();
        assert_eq!(plugin.version.as_deref(), Some("${kotlin.version}"));
    }

    #[test]
    fn missing_kotlin_is_not_found() {
        let resolver = resolver();
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(DEMO_POM).unwrap();
        let before = model.to_xml().unwrap();

        let report = KotlinHandler::new(&mut context).upgrade(&mut model);

        assert_eq!(report.results[0].outcome, UpgradeOutcome::NotFound);
        assert_eq!(model.to_xml().unwrap(), before);
    }
}
