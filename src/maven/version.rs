use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)(.*)$").expect("hardcoded regex must compile")
});

static PRE_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(alpha|beta|milestone|preview|canary|dev|eap|rc|cr|a|b|m)[.-]?(\d*)$")
        .expect("hardcoded regex must compile")
});

/// Maven style version: numeric segments followed by an optional qualifier.
#[derive(Debug, Clone)]
pub struct Version {
    pub original: String,
    pub parsed: VersionType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionType {
    Structured {
        segments: Vec<u64>,
        qualifier: Qualifier,
    },
    /// No leading numeric part, e.g. date or hash based schemes.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    Snapshot,
    PreRelease { stage: Stage, number: u64 },
    Release,
    /// Release flavours such as `jre` or `android`.
    Variant(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Dev,
    Alpha,
    Beta,
    Milestone,
    ReleaseCandidate,
}

impl Qualifier {
    fn parse(raw: &str) -> Self {
        let lower = raw
            .trim_start_matches(['-', '.'])
            .to_ascii_lowercase();

        if lower.contains("snapshot") {
            return Qualifier::Snapshot;
        }

        if matches!(lower.as_str(), "" | "release" | "final" | "ga") {
            return Qualifier::Release;
        }

        if let Some(caps) = PRE_RELEASE.captures(&lower) {
            let stage = match &caps[1] {
                "alpha" | "a" => Stage::Alpha,
                "beta" | "b" => Stage::Beta,
                "milestone" | "m" => Stage::Milestone,
                "rc" | "cr" => Stage::ReleaseCandidate,
                _ => Stage::Dev,
            };
            let number = caps[2].parse().unwrap_or(0);
            return Qualifier::PreRelease { stage, number };
        }

        Qualifier::Variant(lower)
    }

    fn rank(&self) -> u8 {
        match self {
            Qualifier::Snapshot => 0,
            Qualifier::PreRelease { .. } => 1,
            Qualifier::Release => 2,
            Qualifier::Variant(_) => 3,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Qualifier::PreRelease { stage: sa, number: na },
                Qualifier::PreRelease { stage: sb, number: nb },
            ) => sa.cmp(sb).then(na.cmp(nb)),
            (Qualifier::Variant(a), Qualifier::Variant(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Version {
    pub fn parse(version: &str) -> Self {
        let trimmed = version.trim();
        let parsed = match NUMERIC_PREFIX.captures(trimmed) {
            Some(caps) => {
                let segments: Option<Vec<u64>> =
                    caps[1].split('.').map(|part| part.parse().ok()).collect();
                match segments {
                    Some(segments) => VersionType::Structured {
                        segments,
                        qualifier: Qualifier::parse(&caps[2]),
                    },
                    None => VersionType::Unknown,
                }
            }
            None => VersionType::Unknown,
        };

        Version {
            original: version.to_string(),
            parsed,
        }
    }

    /// Whether this version can take part in an upgrade decision.
    pub fn is_comparable(&self) -> bool {
        matches!(self.parsed, VersionType::Structured { .. })
    }

    pub fn is_stable(&self) -> bool {
        match &self.parsed {
            VersionType::Structured { qualifier, .. } => {
                matches!(qualifier, Qualifier::Release | Qualifier::Variant(_))
            }
            VersionType::Unknown => false,
        }
    }

    /// Alphabetic label of a release flavour: `jre` for `31.1-jre`, `v` for
    /// `9.4.51.v20230217`. `None` for plain releases and pre-releases.
    pub fn flavour(&self) -> Option<&str> {
        match &self.parsed {
            VersionType::Structured {
                qualifier: Qualifier::Variant(variant),
                ..
            } => {
                let end = variant
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(variant.len());
                Some(&variant[..end])
            }
            _ => None,
        }
    }
}

fn compare_segments(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        match av.cmp(&bv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    /// Ordering without the final tie-break on the original text, so `1.0`
    /// and `1.0.0` compare equal.
    pub fn semantic_cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (
                VersionType::Structured {
                    segments: sa,
                    qualifier: qa,
                },
                VersionType::Structured {
                    segments: sb,
                    qualifier: qb,
                },
            ) => compare_segments(sa, sb).then_with(|| qa.compare(qb)),
            (VersionType::Unknown, VersionType::Structured { .. }) => Ordering::Less,
            (VersionType::Structured { .. }, VersionType::Unknown) => Ordering::Greater,
            (VersionType::Unknown, VersionType::Unknown) => Ordering::Equal,
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semantic_cmp(other)
            .then_with(|| self.original.cmp(&other.original))
    }
}

pub struct VersionComparator;

impl VersionComparator {
    /// Get the latest comparable version from a list
    pub fn get_latest(versions: &[String], stable_only: bool) -> Option<String> {
        let mut parsed_versions: Vec<Version> = versions
            .iter()
            .map(|v| Version::parse(v))
            .filter(Version::is_comparable)
            .collect();

        if stable_only {
            parsed_versions.retain(|v| v.is_stable());
        }

        parsed_versions.sort();
        parsed_versions.last().map(|v| v.original.clone())
    }

    /// Latest candidate for `current`. A flavoured current version only moves
    /// to candidates of the same flavour or without one.
    pub fn get_latest_for(current: &str, versions: &[String], stable_only: bool) -> Option<String> {
        let current = Version::parse(current);
        let Some(flavour) = current.flavour() else {
            return Self::get_latest(versions, stable_only);
        };

        let same_flavour: Vec<String> = versions
            .iter()
            .filter(|v| Version::parse(v).flavour().is_none_or(|f| f == flavour))
            .cloned()
            .collect();
        Self::get_latest(&same_flavour, stable_only)
    }

    /// Check if version `a` is newer than version `b`.
    /// Non comparable versions are never newer than anything.
    pub fn is_newer(a: &str, b: &str) -> bool {
        let va = Version::parse(a);
        let vb = Version::parse(b);
        va.is_comparable() && vb.is_comparable() && va.semantic_cmp(&vb) == Ordering::Greater
    }
}
