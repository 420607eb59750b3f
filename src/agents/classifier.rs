use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ownership {
    SecondParty,
    ThirdParty,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::SecondParty => f.write_str("2party"),
            Ownership::ThirdParty => f.write_str("3party"),
        }
    }
}

/// Decides whether a groupId belongs to the organization, by ordered prefix list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipClassifier {
    prefixes: Vec<String>,
}

impl OwnershipClassifier {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .map(|p| p.trim().trim_end_matches('.').to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// First configured prefix owning `group_id`.
    pub fn matching_prefix(&self, group_id: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|prefix| {
                group_id == prefix.as_str()
                    || group_id
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .map(String::as_str)
    }

    pub fn classify(&self, group_id: &str) -> Ownership {
        match self.matching_prefix(group_id) {
            Some(_) => Ownership::SecondParty,
            None => Ownership::ThirdParty,
        }
    }

    /// Classifier for one descriptor. Without configured prefixes, and when
    /// `infer` is set, the first two segments of the project's groupId are used.
    pub fn for_project(&self, project_group: Option<&str>, infer: bool) -> Self {
        if !self.prefixes.is_empty() || !infer {
            return self.clone();
        }

        match project_group.and_then(inferred_prefix) {
            Some(prefix) => Self::new([prefix]),
            None => self.clone(),
        }
    }
}

fn inferred_prefix(group: &str) -> Option<String> {
    let segments: Vec<&str> = group.split('.').filter(|s| !s.is_empty()).collect();
    match segments.len() {
        0 => None,
        1 => Some(segments[0].to_string()),
        _ => Some(segments[..2].join(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_is_second_party() {
        let classifier = OwnershipClassifier::new(["org.acme"]);
        assert_eq!(classifier.classify("org.acme"), Ownership::SecondParty);
        assert_eq!(classifier.classify("org.acme.widgets"), Ownership::SecondParty);
        assert_eq!(classifier.classify("com.external"), Ownership::ThirdParty);
    }

    #[test]
    fn prefix_must_end_on_segment_boundary() {
        let classifier = OwnershipClassifier::new(["org.acme"]);
        assert_eq!(classifier.classify("org.acmecorp"), Ownership::ThirdParty);
    }

    #[test]
    fn first_matching_prefix_wins() {
        let classifier = OwnershipClassifier::new(["org.acme", "org.acme.internal"]);
        assert_eq!(
            classifier.matching_prefix("org.acme.internal.tools"),
            Some("org.acme")
        );
    }

    #[test]
    fn empty_configuration_defaults_to_third_party() {
        let classifier = OwnershipClassifier::default();
        assert_eq!(classifier.classify("org.acme"), Ownership::ThirdParty);
        assert!(OwnershipClassifier::new(["  ", "org.acme."]).prefixes() == ["org.acme"]);
    }

    #[test]
    fn classification_is_stable() {
        let classifier = OwnershipClassifier::new(["no.acme", "com.acme"]);
        for group in ["no.acme.app", "com.google", "com.acme", "no"] {
            let first = classifier.classify(group);
            assert!((0..5).all(|_| classifier.classify(group) == first));
        }
    }

    #[test]
    fn infers_prefix_from_project_group() {
        let configured = OwnershipClassifier::new(["com.acme"]);
        assert_eq!(configured.for_project(Some("org.other.app"), true), configured);

        let empty = OwnershipClassifier::default();
        let inferred = empty.for_project(Some("org.acme.demo.service"), true);
        assert_eq!(inferred.prefixes(), ["org.acme"]);
        assert_eq!(inferred.classify("org.acme.shared"), Ownership::SecondParty);

        assert!(empty.for_project(Some("org.acme.demo"), false).prefixes().is_empty());
        assert!(empty.for_project(None, true).prefixes().is_empty());
    }
}
