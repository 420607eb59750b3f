// Upgrade module - the operations that move descriptor versions forward
//
// Architecture:
// - UpgradeContext: resolver, classifier and the per-run session
// - UpgradeReport: one result per touched coordinate
// - Handlers: dependencies, plugins, Kotlin and Spring Boot
pub mod context;
pub mod handlers;
pub mod report;

pub use context::UpgradeContext;
pub use report::{Location, UpgradeOutcome, UpgradeReport, UpgradeResult};

use crate::agents::classifier::{Ownership, OwnershipClassifier};
use crate::agents::property_rewriter::{derive_property_name, rewrite_as_property, PropertyName};
use crate::agents::resolver::VersionResolver;
use crate::config::Config;
use crate::error::{CopilotError, Result};
use crate::maven::pom::{EntryKind, PomModel};
use crate::repository::{Coordinate, DefaultVersionStrategy, RepositoryFactory};
use handlers::{DependencyHandler, KotlinHandler, PluginHandler, SpringBootHandler};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOperation {
    Dependency { coordinate: Coordinate },
    SecondParty,
    ThirdParty,
    Plugins,
    Kotlin,
    SpringBoot,
    All,
}

impl UpgradeOperation {
    /// Single-dependency operation; both parts are required.
    pub fn dependency(group: Option<&str>, artifact: Option<&str>) -> Result<Self> {
        let group = group.map(str::trim).filter(|g| !g.is_empty());
        let artifact = artifact.map(str::trim).filter(|a| !a.is_empty());
        match (group, artifact) {
            (Some(group), Some(artifact)) => Ok(UpgradeOperation::Dependency {
                coordinate: Coordinate::new(group, artifact),
            }),
            _ => Err(CopilotError::Configuration(
                "both groupId and artifactId are required. Example: co-pilot upgrade dependency -g org.acme -a widget".into(),
            )),
        }
    }
}

impl fmt::Display for UpgradeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeOperation::Dependency { coordinate } => write!(f, "dependency {coordinate}"),
            UpgradeOperation::SecondParty => f.write_str("2party"),
            UpgradeOperation::ThirdParty => f.write_str("3party"),
            UpgradeOperation::Plugins => f.write_str("plugins"),
            UpgradeOperation::Kotlin => f.write_str("kotlin"),
            UpgradeOperation::SpringBoot => f.write_str("spring-boot"),
            UpgradeOperation::All => f.write_str("all"),
        }
    }
}

/// Runs upgrade and format operations against one descriptor at a time
pub struct Upgrader {
    resolver: VersionResolver,
    classifier: OwnershipClassifier,
    infer_second_party: bool,
    show_progress: bool,
}

impl Upgrader {
    pub fn new(resolver: VersionResolver, classifier: OwnershipClassifier, infer_second_party: bool) -> Self {
        Self {
            resolver,
            classifier,
            infer_second_party,
            show_progress: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let resolver = VersionResolver::new(
            RepositoryFactory::create_maven(config)?,
            RepositoryFactory::create_spring_initializr(config)?,
            DefaultVersionStrategy::shared(),
            config.include_prereleases,
        );
        let classifier = OwnershipClassifier::new(config.second_party_prefixes.iter().cloned());
        Ok(Self::new(resolver, classifier, config.infer_second_party).with_progress(true))
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Classifier for this descriptor, seeded from its own groupId when no
    /// prefixes are configured.
    pub fn classifier_for(&self, model: &PomModel) -> OwnershipClassifier {
        self.classifier
            .for_project(model.group_id(), self.infer_second_party)
    }

    /// Applies `operation` to the model. Fails only when the descriptor
    /// itself is unusable; per-entry problems are reported as results.
    pub fn apply(&self, model: &mut PomModel, operation: &UpgradeOperation) -> Result<UpgradeReport> {
        model.ensure_unique_coordinates()?;

        let mut context = UpgradeContext::new(&self.resolver, self.classifier_for(model));
        context.show_progress = self.show_progress;

        let report = match operation {
            UpgradeOperation::Dependency { coordinate } => {
                DependencyHandler::new(&mut context).upgrade_single(model, coordinate)
            }
            UpgradeOperation::SecondParty => {
                DependencyHandler::new(&mut context).upgrade_by_ownership(model, Ownership::SecondParty)
            }
            UpgradeOperation::ThirdParty => {
                DependencyHandler::new(&mut context).upgrade_by_ownership(model, Ownership::ThirdParty)
            }
            UpgradeOperation::Plugins => PluginHandler::new(&mut context).upgrade(model),
            UpgradeOperation::Kotlin => KotlinHandler::new(&mut context).upgrade(model),
            UpgradeOperation::SpringBoot => SpringBootHandler::new(&mut context).upgrade(model),
            UpgradeOperation::All => {
                let mut report = KotlinHandler::new(&mut context).upgrade(model);
                report.extend(SpringBootHandler::new(&mut context).upgrade(model));
                report.extend(
                    DependencyHandler::new(&mut context)
                        .upgrade_by_ownership(model, Ownership::SecondParty),
                );
                report.extend(
                    DependencyHandler::new(&mut context)
                        .upgrade_by_ownership(model, Ownership::ThirdParty),
                );
                report.extend(PluginHandler::new(&mut context).upgrade(model));
                report
            }
        };

        Ok(report)
    }

    /// Moves every literal version into a derived property without changing
    /// any effective version.
    pub fn format(&self, model: &mut PomModel) -> Result<UpgradeReport> {
        model.ensure_unique_coordinates()?;

        let mut report = UpgradeReport::new();
        for kind in EntryKind::ALL {
            for artifact in model.artifacts(kind) {
                let Some(version) = artifact.version.clone() else {
                    continue;
                };
                if artifact.version_ref().is_some() {
                    continue;
                }

                let name = derive_property_name(&artifact.coordinate);
                let outcome = match model.property(&name) {
                    Some(existing)
                        if existing != version && model.count_placeholder_uses(&name) > 0 =>
                    {
                        UpgradeOutcome::Failed {
                            reason: CopilotError::PropertyConflict {
                                property: name,
                                coordinate: artifact.coordinate.to_string(),
                            }
                            .to_string(),
                        }
                    }
                    _ => match rewrite_as_property(model, &artifact, &version, &PropertyName::Derived) {
                        Ok(property) => UpgradeOutcome::Indirected { version, property },
                        Err(e) => UpgradeOutcome::Failed {
                            reason: e.to_string(),
                        },
                    },
                };

                report.push(UpgradeResult::new(
                    artifact.coordinate.clone(),
                    Location::Entry(kind),
                    outcome,
                ));
            }
        }

        Ok(report)
    }
}
