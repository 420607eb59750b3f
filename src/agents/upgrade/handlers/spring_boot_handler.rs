use crate::agents::property_rewriter::{rewrite_as_property, PropertyName};
use crate::agents::resolver::{Channel, Resolution};
use crate::agents::upgrade::context::UpgradeContext;
use crate::agents::upgrade::report::{Location, UpgradeOutcome, UpgradeReport, UpgradeResult};
use crate::error::CopilotError;
use crate::maven::pom::{is_builtin_property, placeholder, Artifact, EntryKind, PomModel};
use crate::repository::Coordinate;
use colored::Colorize;

pub const SPRING_BOOT_PROPERTY: &str = "spring-boot.version";
pub const SPRING_BOOT_GROUP: &str = "org.springframework.boot";

/// What the descriptor says about the platform after this run.
enum Platform {
    Absent,
    Unresolved,
    Version(String),
}

impl Platform {
    fn from_outcome(outcome: &UpgradeOutcome) -> Self {
        match outcome {
            UpgradeOutcome::Upgraded { to, .. } => Platform::Version(to.clone()),
            UpgradeOutcome::UpToDate { version } => Platform::Version(version.clone()),
            _ => Platform::Unresolved,
        }
    }
}

/// Handles the Spring Boot platform version and the entries that follow it
pub struct SpringBootHandler<'a, 'r> {
    context: &'a mut UpgradeContext<'r>,
}

impl<'a, 'r> SpringBootHandler<'a, 'r> {
    pub fn new(context: &'a mut UpgradeContext<'r>) -> Self {
        Self { context }
    }

    pub fn starter_parent() -> Coordinate {
        Coordinate::new(SPRING_BOOT_GROUP, "spring-boot-starter-parent")
    }

    pub fn dependencies_bom() -> Coordinate {
        Coordinate::new(SPRING_BOOT_GROUP, "spring-boot-dependencies")
    }

    pub fn upgrade(&mut self, model: &mut PomModel) -> UpgradeReport {
        println!("\n{}", "Checking Spring Boot version...".cyan());

        let mut report = UpgradeReport::new();
        let platform = self.upgrade_platform(model, &mut report);
        if matches!(platform, Platform::Absent) {
            return report;
        }

        // Boot entries belong to the platform whether or not it moved, so no
        // later operation of the run resolves them on their own.
        self.claim_plugins(model, &platform, &mut report);
        self.context.session.touch_property(SPRING_BOOT_PROPERTY);
        self.report_platform_managed(model, &mut report);

        report
    }

    /// Source order: starter parent, imported BOM, then the bare property.
    fn upgrade_platform(&mut self, model: &mut PomModel, report: &mut UpgradeReport) -> Platform {
        if let Some(parent) = model.parent().filter(|p| p.coordinate == Self::starter_parent()) {
            return self.upgrade_parent(model, parent.version, report);
        }

        if let Some(bom) = model.find_artifact(EntryKind::ManagedDependency, &Self::dependencies_bom()) {
            let naming = PropertyName::Explicit(SPRING_BOOT_PROPERTY.to_string());
            return match self.context.upgrade_artifact(model, &bom, &Channel::SpringBoot, &naming) {
                Some(result) => {
                    let platform = Platform::from_outcome(&result.outcome);
                    report.push(result);
                    platform
                }
                None => Platform::Unresolved,
            };
        }

        if model.property(SPRING_BOOT_PROPERTY).is_some() {
            return match self.context.upgrade_property(
                model,
                SPRING_BOOT_PROPERTY,
                &Self::dependencies_bom(),
                &Channel::SpringBoot,
            ) {
                Some(result) => {
                    let platform = Platform::from_outcome(&result.outcome);
                    report.push(result);
                    platform
                }
                None => Platform::Unresolved,
            };
        }

        report.push(UpgradeResult::new(
            Self::starter_parent(),
            Location::Parent,
            UpgradeOutcome::NotFound,
        ));
        Platform::Absent
    }

    fn upgrade_parent(
        &mut self,
        model: &mut PomModel,
        current: Option<String>,
        report: &mut UpgradeReport,
    ) -> Platform {
        let coordinate = Self::starter_parent();
        let Some(current) = current else {
            report.push(UpgradeResult::new(
                coordinate,
                Location::Parent,
                UpgradeOutcome::Unresolved {
                    reason: "parent declares no version".into(),
                },
            ));
            return Platform::Unresolved;
        };

        let outcome = match self.context.resolver.resolve(&coordinate, &current, &Channel::SpringBoot) {
            Resolution::Upgrade(target) => match model.set_parent_version(&target) {
                Ok(()) => UpgradeOutcome::Upgraded {
                    from: current,
                    to: target,
                    property: None,
                },
                Err(e) => UpgradeOutcome::Failed {
                    reason: e.to_string(),
                },
            },
            Resolution::UpToDate => UpgradeOutcome::UpToDate { version: current },
            Resolution::Unresolved(reason) => UpgradeOutcome::Unresolved { reason },
        };

        let platform = Platform::from_outcome(&outcome);
        report.push(UpgradeResult::new(coordinate, Location::Parent, outcome));
        platform
    }

    /// Boot plugins follow the platform: stale explicit versions move to
    /// `${spring-boot.version}`, everything else is left as is.
    fn claim_plugins(&mut self, model: &mut PomModel, platform: &Platform, report: &mut UpgradeReport) {
        let plugins: Vec<Artifact> = [EntryKind::Plugin, EntryKind::ManagedPlugin]
            .iter()
            .flat_map(|kind| model.artifacts(*kind))
            .filter(|a| a.coordinate.group == SPRING_BOOT_GROUP)
            .collect();

        for plugin in plugins {
            if !self.context.session.touch_entry(plugin.kind, &plugin.coordinate) {
                continue;
            }
            let outcome = match platform {
                Platform::Version(version) => self.align_plugin(model, &plugin, version),
                _ => UpgradeOutcome::Managed {
                    reason: "follows the Spring Boot platform, which is unresolved".into(),
                },
            };
            report.push(UpgradeResult::new(
                plugin.coordinate.clone(),
                Location::Entry(plugin.kind),
                outcome,
            ));
        }
    }

    fn align_plugin(&mut self, model: &mut PomModel, plugin: &Artifact, version: &str) -> UpgradeOutcome {
        let Some(declared) = plugin.version.as_deref() else {
            return UpgradeOutcome::Managed {
                reason: "version managed by the Spring Boot platform".into(),
            };
        };

        let current = match plugin.version_ref() {
            Some(property) if self.context.session.is_property_touched(property) => {
                return UpgradeOutcome::Managed {
                    reason: format!("follows {}, already handled", placeholder(property)),
                };
            }
            Some(property) => match model.property(property) {
                Some(value) => value.to_string(),
                None if is_builtin_property(property) => {
                    return UpgradeOutcome::Managed {
                        reason: format!("follows {}", placeholder(property)),
                    };
                }
                None => {
                    return UpgradeOutcome::Failed {
                        reason: CopilotError::UndefinedProperty(property.to_string()).to_string(),
                    };
                }
            },
            None => declared.to_string(),
        };

        if !self.context.resolver.is_upgrade(&current, version) {
            if let Some(property) = plugin.version_ref() {
                self.context.session.touch_property(property);
            }
            return UpgradeOutcome::UpToDate { version: current };
        }

        let naming = PropertyName::Explicit(SPRING_BOOT_PROPERTY.to_string());
        match rewrite_as_property(model, plugin, version, &naming) {
            Ok(property) => {
                self.context.session.touch_property(&property);
                UpgradeOutcome::Upgraded {
                    from: current,
                    to: version.to_string(),
                    property: Some(property),
                }
            }
            Err(e) => UpgradeOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Versionless Boot dependencies track the platform and need no change.
    fn report_platform_managed(&mut self, model: &PomModel, report: &mut UpgradeReport) {
        let managed: Vec<Artifact> = [EntryKind::Dependency, EntryKind::ManagedDependency]
            .iter()
            .flat_map(|kind| model.artifacts(*kind))
            .filter(|a| a.coordinate.group == SPRING_BOOT_GROUP && a.version.is_none())
            .collect();

        for artifact in managed {
            if self.context.session.touch_entry(artifact.kind, &artifact.coordinate) {
                report.push(UpgradeResult::new(
                    artifact.coordinate.clone(),
                    Location::Entry(artifact.kind),
                    UpgradeOutcome::Managed {
                        reason: "version managed by the Spring Boot platform".into(),
                    },
                ));
            }
        }
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

    fn resolver(platform: &[&str]) -> VersionResolver {
        let repo = Arc::new(StaticRepository::new().with_platform(platform));
        VersionResolver::new(repo.clone(), repo, DefaultVersionStrategy::shared(), false)
    }

    const BOM_POM: &str = r#"<project>
    <groupId>org.acme</groupId>
    <artifactId>service</artifactId>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.springframework.boot</groupId>
                <artifactId>spring-boot-dependencies</artifactId>
                <version>3.1.5</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
        </dependencies>
    </dependencyManagement>
    <dependencies>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-actuator</artifactId>
        </dependency>
        <dependency>
            <groupId>com.external</groupId>
            <artifactId>lib</artifactId>
            <version>1.0.0</version>
        </dependency>
    </dependencies>
    <build>
        <plugins>
            <plugin>
                <groupId>org.springframework.boot</groupId>
                <artifactId>spring-boot-maven-plugin</artifactId>
                <version>3.1.5</version>
            </plugin>
        </plugins>
    </build>
</project>"#;

    #[test]
    fn upgrades_starter_parent_literally() {
        let resolver = resolver(&["3.2.0", "3.3.5", "3.4.0-M1"]);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(DEMO_POM).unwrap();

        let report = SpringBootHandler::new(&mut context).upgrade(&mut model);

        assert_eq!(
            report.outcome_for(&SpringBootHandler::starter_parent()),
            Some(&UpgradeOutcome::Upgraded {
                from: "3.2.0".into(),
                to: "3.3.5".into(),
                property: None,
            })
        );
        assert_eq!(model.parent().unwrap().version.as_deref(), Some("3.3.5"));
        assert_eq!(model.property(SPRING_BOOT_PROPERTY), None);

        let web = Coordinate::new(SPRING_BOOT_GROUP, "spring-boot-starter-web");
        assert!(matches!(
            report.outcome_for(&web),
            Some(UpgradeOutcome::Managed { .. })
        ));
    }

    #[test]
    fn bom_import_moves_to_property_and_aligns_plugins() {
        let resolver = resolver(&["3.1.5", "3.3.5"]);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(BOM_POM).unwrap();

        let report = SpringBootHandler::new(&mut context).upgrade(&mut model);

        assert_eq!(model.property(SPRING_BOOT_PROPERTY), Some("3.3.5"));
        let bom = model
            .find_artifact(EntryKind::ManagedDependency, &SpringBootHandler::dependencies_bom())
            .unwrap();
        assert_eq!(bom.version.as_deref(), Some("${spring-boot.version}"));

        let plugin = model
            .find_artifact(
                EntryKind::Plugin,
                &Coordinate::new(SPRING_BOOT_GROUP, "spring-boot-maven-plugin"),
            )
            .unwrap();
        assert_eq!(plugin.version.as_deref(), Some("${spring-boot.version}"));
        assert_eq!(model.count_placeholder_uses(SPRING_BOOT_PROPERTY), 2);

        let lib = Coordinate::new("com.external", "lib");
        assert_eq!(report.outcome_for(&lib), None);
        assert_eq!(
            model.find_artifact(EntryKind::Dependency, &lib).unwrap().version.as_deref(),
            Some("1.0.0")
        );
    }

    #[test]
    fn up_to_date_platform_leaves_plugins_alone() {
        let resolver = resolver(&["3.1.5"]);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(BOM_POM).unwrap();
        let before = model.to_xml().unwrap();

        let report = SpringBootHandler::new(&mut context).upgrade(&mut model);

        assert!(!report.has_changes());
        assert_eq!(model.to_xml().unwrap(), before);
    }

    #[test]
    fn current_platform_still_aligns_stale_plugins() {
        let pom = r#"<project>
    <parent>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-starter-parent</artifactId>
        <version>3.3.5</version>
    </parent>
    <build>
        <plugins>
            <plugin>
                <groupId>org.springframework.boot</groupId>
                <artifactId>spring-boot-maven-plugin</artifactId>
                <version>3.2.0</version>
            </plugin>
        </plugins>
    </build>
</project>"#;
        let resolver = resolver(&["3.2.0", "3.3.5"]);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(pom).unwrap();

        let report = SpringBootHandler::new(&mut context).upgrade(&mut model);

        let plugin = Coordinate::new(SPRING_BOOT_GROUP, "spring-boot-maven-plugin");
        assert_eq!(
            report.outcome_for(&plugin),
            Some(&UpgradeOutcome::Upgraded {
                from: "3.2.0".into(),
                to: "3.3.5".into(),
                property: Some(SPRING_BOOT_PROPERTY.into()),
            })
        );
        assert_eq!(model.property(SPRING_BOOT_PROPERTY), Some("3.3.5"));
        assert!(context.session.is_entry_touched(EntryKind::Plugin, &plugin));
        assert!(context.session.is_property_touched(SPRING_BOOT_PROPERTY));
    }

    #[test]
    fn bare_property_is_upgraded() {
        let pom = r#"<project>
    <properties><spring-boot.version>3.2.1</spring-boot.version></properties>
</project>"#;
        let resolver = resolver(&["3.2.1", "3.3.5"]);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(pom).unwrap();

        let report = SpringBootHandler::new(&mut context).upgrade(&mut model);

        assert_eq!(
            report.results[0].location,
            Location::Property(SPRING_BOOT_PROPERTY.into())
        );
        assert_eq!(model.property(SPRING_BOOT_PROPERTY), Some("3.3.5"));
    }

    #[test]
    fn no_spring_boot_is_not_found() {
        let resolver = resolver(&["3.3.5"]);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse("<project><artifactId>plain</artifactId></project>").unwrap();

        let report = SpringBootHandler::new(&mut context).upgrade(&mut model);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].outcome, UpgradeOutcome::NotFound);
    }

    #[test]
    fn unreachable_initializr_is_unresolved() {
        let repo = Arc::new(StaticRepository::unreachable());
        let resolver =
            VersionResolver::new(repo.clone(), repo, DefaultVersionStrategy::shared(), false);
        let mut context = UpgradeContext::new(&resolver, OwnershipClassifier::default());
        let mut model = PomModel::parse(DEMO_POM).unwrap();

        let report = SpringBootHandler::new(&mut context).upgrade(&mut model);
        assert_eq!(report.counts().unresolved, 1);
        assert!(!report.has_changes());
    }
}
