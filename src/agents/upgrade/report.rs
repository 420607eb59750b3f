use crate::maven::pom::EntryKind;
use crate::repository::Coordinate;
use std::fmt;

/// Where in the descriptor a result applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Entry(EntryKind),
    Parent,
    Property(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Entry(kind) => write!(f, "{kind}"),
            Location::Parent => f.write_str("parent"),
            Location::Property(name) => write!(f, "property {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Upgraded {
        from: String,
        to: String,
        property: Option<String>,
    },
    UpToDate {
        version: String,
    },
    /// No-op: the version is inherited or follows a property already handled
    Managed {
        reason: String,
    },
    /// A literal version moved into a property without changing its value
    Indirected {
        version: String,
        property: String,
    },
    Unresolved {
        reason: String,
    },
    NotFound,
    Failed {
        reason: String,
    },
}

impl UpgradeOutcome {
    /// Whether the descriptor was modified for this result.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            UpgradeOutcome::Upgraded { .. } | UpgradeOutcome::Indirected { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeResult {
    pub coordinate: Coordinate,
    pub location: Location,
    pub outcome: UpgradeOutcome,
}

impl UpgradeResult {
    pub fn new(coordinate: Coordinate, location: Location, outcome: UpgradeOutcome) -> Self {
        Self {
            coordinate,
            location,
            outcome,
        }
    }
}

/// Per-outcome totals of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub upgraded: usize,
    pub up_to_date: usize,
    pub managed: usize,
    pub indirected: usize,
    pub unresolved: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl std::ops::AddAssign for OutcomeCounts {
    fn add_assign(&mut self, other: Self) {
        self.upgraded += other.upgraded;
        self.up_to_date += other.up_to_date;
        self.managed += other.managed;
        self.indirected += other.indirected;
        self.unresolved += other.unresolved;
        self.not_found += other.not_found;
        self.failed += other.failed;
    }
}

/// Results of one operation on one descriptor, in the order they were produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub results: Vec<UpgradeResult>,
}

impl UpgradeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: UpgradeResult) {
        self.results.push(result);
    }

    pub fn extend(&mut self, other: UpgradeReport) {
        self.results.extend(other.results);
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_change())
    }

    #[cfg(test)]
    pub fn outcome_for(&self, coordinate: &Coordinate) -> Option<&UpgradeOutcome> {
        self.results
            .iter()
            .find(|r| &r.coordinate == coordinate)
            .map(|r| &r.outcome)
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for result in &self.results {
            match result.outcome {
                UpgradeOutcome::Upgraded { .. } => counts.upgraded += 1,
                UpgradeOutcome::UpToDate { .. } => counts.up_to_date += 1,
                UpgradeOutcome::Managed { .. } => counts.managed += 1,
                UpgradeOutcome::Indirected { .. } => counts.indirected += 1,
                UpgradeOutcome::Unresolved { .. } => counts.unresolved += 1,
                UpgradeOutcome::NotFound => counts.not_found += 1,
                UpgradeOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }
}
