use crate::agents::property_rewriter::PropertyName;
use crate::agents::resolver::Channel;
use crate::agents::upgrade::context::UpgradeContext;
use crate::agents::upgrade::report::UpgradeReport;
use crate::maven::pom::{Artifact, EntryKind, PomModel};
use colored::Colorize;

/// Handles the build plugins and pluginManagement lists
///
/// Plugins are upgraded regardless of ownership.
pub struct PluginHandler<'a, 'r> {
    context: &'a mut UpgradeContext<'r>,
}

impl<'a, 'r> PluginHandler<'a, 'r> {
    pub fn new(context: &'a mut UpgradeContext<'r>) -> Self {
        Self { context }
    }

    pub fn upgrade(&mut self, model: &mut PomModel) -> UpgradeReport {
        let plugins: Vec<Artifact> = [EntryKind::Plugin, EntryKind::ManagedPlugin]
            .iter()
            .flat_map(|kind| model.artifacts(*kind))
            .filter(|a| !self.context.session.is_entry_touched(a.kind, &a.coordinate))
            .collect();

        println!(
            "\n{}",
            format!("Checking {} plugins...", plugins.len()).cyan()
        );

        let mut report = UpgradeReport::new();
        let pb = self.context.progress_bar(plugins.len(), "plugins");
        for plugin in plugins {
            pb.set_message(format!("Checking {}", plugin.coordinate));
            if let Some(result) = self.context.upgrade_artifact(
                model,
                &plugin,
                &Channel::Stable,
                &PropertyName::Derived,
            ) {
                report.push(result);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::classifier::OwnershipClassifier;
    use crate::agents::resolver::VersionResolver;
    use crate::agents::upgrade::report::UpgradeOutcome;
    use crate::repository::testing::StaticRepository;
    use crate::repository::{Coordinate, DefaultVersionStrategy};
    use std::sync::Arc;

    const PLUGINS_POM: &str = r#"<project>
    <build>
        <pluginManagement>
            <plugins>
                <plugin>
                    <groupId>org.apache.maven.plugins</groupId>
                    <artifactId>maven-compiler-plugin</artifactId>
                    <version>3.11.0</version>
                </plugin>
            </plugins>
        </pluginManagement>
        <plugins>
            <plugin>
                <artifactId>maven-surefire-plugin</artifactId>
                <version>3.0.0</version>
            </plugin>
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-compiler-plugin</artifactId>
            </plugin>
        </plugins>
    </build>
</project>"#;

    #[test]
    fn upgrades_plugins_and_managed_plugins() {
        let repo = Arc::new(
            StaticRepository::new()
                .with("org.apache.maven.plugins", "maven-surefire-plugin", &["3.0.0", "3.2.5"])
                .with("org.apache.maven.plugins", "maven-compiler-plugin", &["3.11.0", "3.13.0"]),
        );
        let resolver =
            VersionResolver::new(repo.clone(), repo, DefaultVersionStrategy::shared(), false);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(PLUGINS_POM).unwrap();

        let report = PluginHandler::new(&mut context).upgrade(&mut model);

        assert_eq!(report.counts().upgraded, 2);
        assert_eq!(report.counts().managed, 1);
        assert_eq!(model.property("maven-surefire-plugin.version"), Some("3.2.5"));
        assert_eq!(model.property("maven-compiler-plugin.version"), Some("3.13.0"));

        let surefire = Coordinate::new("org.apache.maven.plugins", "maven-surefire-plugin");
        assert!(matches!(
            report.outcome_for(&surefire),
            Some(UpgradeOutcome::Upgraded { .. })
        ));
    }
}
