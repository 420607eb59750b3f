use crate::error::{CopilotError, Result};
use crate::maven::xml::{Element, Node, XmlDocument};
use crate::repository::Coordinate;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

static PROPERTY_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{([^${}]+)\}$").expect("hardcoded regex must compile")
});

/// Returns the property name when `value` is exactly a `${name}` placeholder.
pub fn property_reference(value: &str) -> Option<&str> {
    PROPERTY_REFERENCE
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Sections conventionally declared after `<properties>`.
const PROPERTIES_SUCCESSORS: &[&str] = &[
    "dependencyManagement",
    "dependencies",
    "repositories",
    "pluginRepositories",
    "build",
    "reporting",
    "profiles",
];

/// Properties Maven supplies itself, never declared under `<properties>`.
pub fn is_builtin_property(name: &str) -> bool {
    const PREFIXES: [&str; 5] = ["project.", "pom.", "parent.", "env.", "settings."];
    name == "basedir" || PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

pub fn placeholder(property: &str) -> String {
    format!("${{{property}}}")
}

/// The coordinate lists of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Dependency,
    ManagedDependency,
    Plugin,
    ManagedPlugin,
}

impl EntryKind {
    pub const ALL: [EntryKind; 4] = [
        EntryKind::Dependency,
        EntryKind::ManagedDependency,
        EntryKind::Plugin,
        EntryKind::ManagedPlugin,
    ];

    fn container_path(self) -> &'static [&'static str] {
        match self {
            EntryKind::Dependency => &["dependencies"],
            EntryKind::ManagedDependency => &["dependencyManagement", "dependencies"],
            EntryKind::Plugin => &["build", "plugins"],
            EntryKind::ManagedPlugin => &["build", "pluginManagement", "plugins"],
        }
    }

    fn item_name(self) -> &'static str {
        if self.is_plugin() { "plugin" } else { "dependency" }
    }

    pub fn is_plugin(self) -> bool {
        matches!(self, EntryKind::Plugin | EntryKind::ManagedPlugin)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::Dependency => "dependencies",
            EntryKind::ManagedDependency => "dependencyManagement",
            EntryKind::Plugin => "plugins",
            EntryKind::ManagedPlugin => "pluginManagement",
        };
        f.write_str(label)
    }
}

/// Snapshot of one dependency or plugin entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub coordinate: Coordinate,
    pub version: Option<String>,
    pub kind: EntryKind,
    /// Position among the entries of its list
    pub index: usize,
}

impl Artifact {
    fn from_element(element: &Element, kind: EntryKind, index: usize) -> Option<Self> {
        let artifact = element.child_text("artifactId")?;
        let group = match element.child_text("groupId") {
            Some(group) => group,
            None if kind.is_plugin() => DEFAULT_PLUGIN_GROUP,
            None => return None,
        };

        Some(Self {
            coordinate: Coordinate::new(group, artifact),
            version: element
                .child_text("version")
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            kind,
            index,
        })
    }

    /// Property named by the version field, if it is a placeholder.
    pub fn version_ref(&self) -> Option<&str> {
        self.version.as_deref().and_then(property_reference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub coordinate: Coordinate,
    pub version: Option<String>,
}

/// In-memory Maven project descriptor.
#[derive(Debug, Clone)]
pub struct PomModel {
    document: XmlDocument,
}

impl PomModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CopilotError::DescriptorParsing(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::parse(&content).map_err(|e| {
            CopilotError::DescriptorParsing(format!("Failed to parse '{}': {}", path.display(), e))
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let document = XmlDocument::parse(content)?;
        if document.root.name != "project" {
            return Err(CopilotError::DescriptorParsing(format!(
                "expected <project> root element, found <{}>",
                document.root.name
            )));
        }
        Ok(Self { document })
    }

    pub fn to_xml(&self) -> Result<String> {
        self.document.to_xml()
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_xml()?).map_err(|e| {
            CopilotError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write '{}': {}", path.display(), e),
            ))
        })
    }

    fn project(&self) -> &Element {
        &self.document.root
    }

    fn project_mut(&mut self) -> &mut Element {
        &mut self.document.root
    }

    /// Own groupId, falling back to the parent's.
    pub fn group_id(&self) -> Option<&str> {
        self.project()
            .child_text("groupId")
            .or_else(|| self.project().descendant(&["parent", "groupId"]).and_then(Element::text))
    }

    pub fn parent(&self) -> Option<ParentRef> {
        let parent = self.project().child("parent")?;
        Some(ParentRef {
            coordinate: Coordinate::new(parent.child_text("groupId")?, parent.child_text("artifactId")?),
            version: parent.child_text("version").map(str::to_string),
        })
    }

    pub fn set_parent_version(&mut self, version: &str) -> Result<()> {
        let parent = self
            .project_mut()
            .child_mut("parent")
            .ok_or_else(|| CopilotError::ProjectValidation("descriptor has no parent".into()))?;
        parent.ensure_child("version").set_text(version);
        Ok(())
    }

    /// Declared child modules in declaration order.
    pub fn modules(&self) -> Vec<String> {
        self.project()
            .child("modules")
            .map(|modules| {
                modules
                    .children_named("module")
                    .filter_map(Element::text)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn properties(&self) -> Vec<(String, String)> {
        self.project()
            .child("properties")
            .map(|props| {
                props
                    .elements()
                    .map(|p| (p.name.clone(), p.text().unwrap_or_default().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.project()
            .child("properties")
            .and_then(|props| props.child(name))
            .map(|p| p.text().unwrap_or_default())
    }

    /// Creates or updates a property; new properties are appended. Returns
    /// whether the table changed.
    pub fn set_property(&mut self, name: &str, value: &str) -> bool {
        if self.property(name) == Some(value) {
            return false;
        }

        let properties = self
            .project_mut()
            .ensure_child_before("properties", PROPERTIES_SUCCESSORS);
        match properties.child_mut(name) {
            Some(existing) => existing.set_text(value),
            None => properties
                .children
                .push(Node::Element(Element::with_text(name, value))),
        }
        true
    }

    fn container(&self, kind: EntryKind) -> Option<&Element> {
        self.project().descendant(kind.container_path())
    }

    fn container_mut(&mut self, kind: EntryKind) -> Option<&mut Element> {
        self.project_mut().descendant_mut(kind.container_path())
    }

    pub fn artifacts(&self, kind: EntryKind) -> Vec<Artifact> {
        self.container(kind)
            .map(|container| {
                container
                    .children_named(kind.item_name())
                    .enumerate()
                    .filter_map(|(index, element)| Artifact::from_element(element, kind, index))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find_artifact(&self, kind: EntryKind, coordinate: &Coordinate) -> Option<Artifact> {
        self.artifacts(kind)
            .into_iter()
            .find(|a| &a.coordinate == coordinate)
    }

    /// Sets the version field of the `index`th entry of `kind`, adding a
    /// `<version>` after `<artifactId>` when missing.
    pub fn set_version(&mut self, kind: EntryKind, index: usize, version: &str) -> Result<()> {
        let entry = self
            .container_mut(kind)
            .and_then(|container| {
                container
                    .elements_mut()
                    .filter(|e| e.name == kind.item_name())
                    .nth(index)
            })
            .ok_or_else(|| {
                CopilotError::ProjectValidation(format!("no entry #{index} in {kind}"))
            })?;

        if let Some(existing) = entry.child_mut("version") {
            existing.set_text(version);
            return Ok(());
        }

        let position = entry
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == "artifactId"))
            .map(|i| i + 1)
            .unwrap_or(entry.children.len());
        entry
            .children
            .insert(position, Node::Element(Element::with_text("version", version)));
        Ok(())
    }

    /// Fails on the first coordinate declared twice in the same list.
    pub fn ensure_unique_coordinates(&self) -> Result<()> {
        for kind in EntryKind::ALL {
            let mut seen = HashSet::new();
            for artifact in self.artifacts(kind) {
                if !seen.insert(artifact.coordinate.clone()) {
                    return Err(CopilotError::DuplicateCoordinate {
                        coordinate: artifact.coordinate.to_string(),
                        list: kind.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of `${name}` occurrences in any text or attribute of the descriptor.
    pub fn count_placeholder_uses(&self, name: &str) -> usize {
        let needle = placeholder(name);
        let mut count = 0;
        self.project()
            .visit_text(&mut |text| count += text.matches(needle.as_str()).count());
        count
    }

    /// Reorders the entries of one list by `key`. Comments directly above an
    /// entry move with it; trailing comments stay at the end.
    pub fn sort_entries_by_key<K, F>(&mut self, kind: EntryKind, key: F)
    where
        K: Ord,
        F: Fn(&Artifact) -> K,
    {
        let Some(container) = self.container_mut(kind) else {
            return;
        };

        let mut chunks: Vec<(Option<K>, Vec<Node>)> = Vec::new();
        let mut pending = Vec::new();
        let mut index = 0;
        for node in std::mem::take(&mut container.children) {
            let is_item = matches!(&node, Node::Element(e) if e.name == kind.item_name());
            if !is_item {
                pending.push(node);
                continue;
            }
            let sort_key = match &node {
                Node::Element(e) => Artifact::from_element(e, kind, index).map(|a| key(&a)),
                _ => None,
            };
            index += 1;
            pending.push(node);
            chunks.push((sort_key, std::mem::take(&mut pending)));
        }

        // Entries without a usable coordinate keep their relative order at the end.
        chunks.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        container.children = chunks.into_iter().flat_map(|(_, nodes)| nodes).collect();
        container.children.extend(pending);
    }
}
