use crate::error::{CopilotError, Result};
use crate::maven::pom::{placeholder, Artifact, EntryKind, PomModel};
use crate::repository::Coordinate;

/// How the property holding a rewritten version is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyName {
    /// `{artifactId}.version`, guarded against clobbering unrelated properties
    Derived,
    /// A well known property shared on purpose, e.g. `kotlin.version`
    Explicit(String),
}

pub fn derive_property_name(coordinate: &Coordinate) -> String {
    let artifact: String = coordinate
        .artifact
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{artifact}.version")
}

/// Points the entry's version at a property holding `new_version` and returns
/// the property name. An existing `${p}` reference is updated in place.
pub fn rewrite_as_property(
    model: &mut PomModel,
    artifact: &Artifact,
    new_version: &str,
    naming: &PropertyName,
) -> Result<String> {
    if let Some(existing) = artifact.version_ref() {
        if model.property(existing).is_none() {
            return Err(CopilotError::UndefinedProperty(existing.to_string()));
        }
        model.set_property(existing, new_version);
        return Ok(existing.to_string());
    }

    let name = match naming {
        PropertyName::Derived => {
            let name = derive_property_name(&artifact.coordinate);
            ensure_unclaimed(model, &name, &artifact.coordinate)?;
            name
        }
        PropertyName::Explicit(name) => name.clone(),
    };

    model.set_property(&name, new_version);
    model.set_version(artifact.kind, artifact.index, &placeholder(&name))?;
    Ok(name)
}

/// A derived property may be reused only when nothing but entries of the same
/// coordinate refer to it.
fn ensure_unclaimed(model: &PomModel, name: &str, coordinate: &Coordinate) -> Result<()> {
    if model.property(name).is_none() {
        return Ok(());
    }

    let own_uses = EntryKind::ALL
        .iter()
        .flat_map(|kind| model.artifacts(*kind))
        .filter(|a| &a.coordinate == coordinate && a.version_ref() == Some(name))
        .count();

    if model.count_placeholder_uses(name) > own_uses {
        return Err(CopilotError::PropertyConflict {
            property: name.to_string(),
            coordinate: coordinate.to_string(),
        });
    }
    Ok(())
}
