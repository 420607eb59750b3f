use crate::agents::classifier::OwnershipClassifier;
use crate::maven::pom::{EntryKind, PomModel};

/// Orders dependencies and managed dependencies by ownership tier, then
/// groupId, then artifactId. Plugins keep their declared order.
pub fn sort_dependencies(model: &mut PomModel, classifier: &OwnershipClassifier) {
    for kind in [EntryKind::Dependency, EntryKind::ManagedDependency] {
        model.sort_entries_by_key(kind, |artifact| {
            (
                classifier.classify(&artifact.coordinate.group),
                artifact.coordinate.group.clone(),
                artifact.coordinate.artifact.clone(),
            )
        });
    }
}
