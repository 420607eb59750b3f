use crate::agents::classifier::OwnershipClassifier;
use crate::agents::property_rewriter::{rewrite_as_property, PropertyName};
use crate::agents::resolver::{Channel, Resolution, VersionResolver};
use crate::agents::upgrade::report::{Location, UpgradeOutcome, UpgradeResult};
use crate::error::CopilotError;
use crate::maven::pom::{is_builtin_property, placeholder, Artifact, EntryKind, PomModel};
use crate::repository::Coordinate;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashSet;

/// What one run has already handled in a descriptor. Composed operations
/// consult it so no entry or shared property is decided twice.
#[derive(Debug, Clone, Default)]
pub struct UpgradeSession {
    touched_entries: HashSet<(EntryKind, Coordinate)>,
    touched_properties: HashSet<String>,
}

impl UpgradeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_entry_touched(&self, kind: EntryKind, coordinate: &Coordinate) -> bool {
        self.touched_entries.contains(&(kind, coordinate.clone()))
    }

    /// Records the entry; returns false when it was already handled.
    pub fn touch_entry(&mut self, kind: EntryKind, coordinate: &Coordinate) -> bool {
        self.touched_entries.insert((kind, coordinate.clone()))
    }

    pub fn is_property_touched(&self, name: &str) -> bool {
        self.touched_properties.contains(name)
    }

    pub fn touch_property(&mut self, name: &str) {
        self.touched_properties.insert(name.to_string());
    }
}

/// State shared by the handlers while upgrading one descriptor.
pub struct UpgradeContext<'r> {
    pub resolver: &'r VersionResolver,
    pub classifier: OwnershipClassifier,
    pub session: UpgradeSession,
    pub show_progress: bool,
}

impl<'r> UpgradeContext<'r> {
    pub fn new(resolver: &'r VersionResolver, classifier: OwnershipClassifier) -> Self {
        Self {
            resolver,
            classifier,
            session: UpgradeSession::new(),
            show_progress: false,
        }
    }

    pub fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        if !self.show_progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::with_template("  [{bar:40}] {pos}/{len} {msg}") {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_message(label.to_string());
        pb
    }

    /// Upgrades one entry through `channel`. Returns `None` when an earlier
    /// operation of the run already handled the entry.
    pub fn upgrade_artifact(
        &mut self,
        model: &mut PomModel,
        artifact: &Artifact,
        channel: &Channel,
        naming: &PropertyName,
    ) -> Option<UpgradeResult> {
        if !self.session.touch_entry(artifact.kind, &artifact.coordinate) {
            return None;
        }

        let outcome = self.upgrade_outcome(model, artifact, channel, naming);
        Some(UpgradeResult::new(
            artifact.coordinate.clone(),
            Location::Entry(artifact.kind),
            outcome,
        ))
    }

    fn upgrade_outcome(
        &mut self,
        model: &mut PomModel,
        artifact: &Artifact,
        channel: &Channel,
        naming: &PropertyName,
    ) -> UpgradeOutcome {
        let Some(version) = artifact.version.as_deref() else {
            return UpgradeOutcome::Managed {
                reason: "version inherited from parent or BOM".into(),
            };
        };

        let current = match artifact.version_ref() {
            Some(property) if self.session.is_property_touched(property) => {
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
            None => version.to_string(),
        };

        match self.resolver.resolve(&artifact.coordinate, &current, channel) {
            Resolution::Upgrade(target) => {
                match rewrite_as_property(model, artifact, &target, naming) {
                    Ok(property) => {
                        self.session.touch_property(&property);
                        UpgradeOutcome::Upgraded {
                            from: current,
                            to: target,
                            property: Some(property),
                        }
                    }
                    Err(e) => UpgradeOutcome::Failed {
                        reason: e.to_string(),
                    },
                }
            }
            Resolution::UpToDate => {
                if let Some(property) = artifact.version_ref() {
                    self.session.touch_property(property);
                }
                UpgradeOutcome::UpToDate { version: current }
            }
            Resolution::Unresolved(reason) => UpgradeOutcome::Unresolved { reason },
        }
    }

    /// Upgrades a bare property, for operations keyed on a well known name.
    /// Returns `None` when the property is absent or was already handled.
    pub fn upgrade_property(
        &mut self,
        model: &mut PomModel,
        property: &str,
        coordinate: &Coordinate,
        channel: &Channel,
    ) -> Option<UpgradeResult> {
        if self.session.is_property_touched(property) {
            return None;
        }
        let current = model.property(property)?.to_string();
        self.session.touch_property(property);

        let outcome = match self.resolver.resolve(coordinate, &current, channel) {
            Resolution::Upgrade(target) => {
                model.set_property(property, &target);
                UpgradeOutcome::Upgraded {
                    from: current,
                    to: target,
                    property: Some(property.to_string()),
                }
            }
            Resolution::UpToDate => UpgradeOutcome::UpToDate { version: current },
            Resolution::Unresolved(reason) => UpgradeOutcome::Unresolved { reason },
        };

        Some(UpgradeResult::new(
            coordinate.clone(),
            Location::Property(property.to_string()),
            outcome,
        ))
    }
}
