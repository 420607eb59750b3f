use crate::agents::classifier::Ownership;
use crate::agents::property_rewriter::PropertyName;
use crate::agents::resolver::Channel;
use crate::agents::upgrade::context::UpgradeContext;
use crate::agents::upgrade::report::{Location, UpgradeOutcome, UpgradeReport, UpgradeResult};
use crate::maven::pom::{Artifact, EntryKind, PomModel};
use crate::repository::Coordinate;
use colored::Colorize;

const DEPENDENCY_LISTS: [EntryKind; 2] = [EntryKind::Dependency, EntryKind::ManagedDependency];

/// Handles the dependency and dependencyManagement lists
pub struct DependencyHandler<'a, 'r> {
    context: &'a mut UpgradeContext<'r>,
}

impl<'a, 'r> DependencyHandler<'a, 'r> {
    pub fn new(context: &'a mut UpgradeContext<'r>) -> Self {
        Self { context }
    }

    /// Upgrade one coordinate wherever it is declared. An absent coordinate is
    /// reported as `NotFound` and leaves the descriptor untouched.
    pub fn upgrade_single(&mut self, model: &mut PomModel, coordinate: &Coordinate) -> UpgradeReport {
        let matches: Vec<Artifact> = DEPENDENCY_LISTS
            .iter()
            .filter_map(|kind| model.find_artifact(*kind, coordinate))
            .collect();

        let mut report = UpgradeReport::new();
        if matches.is_empty() {
            report.push(UpgradeResult::new(
                coordinate.clone(),
                Location::Entry(EntryKind::Dependency),
                UpgradeOutcome::NotFound,
            ));
            return report;
        }

        for artifact in matches {
            if let Some(result) = self.context.upgrade_artifact(
                model,
                &artifact,
                &Channel::Stable,
                &PropertyName::Derived,
            ) {
                report.push(result);
            }
        }
        report
    }

    /// Upgrade every dependency of the given ownership tier.
    pub fn upgrade_by_ownership(&mut self, model: &mut PomModel, ownership: Ownership) -> UpgradeReport {
        let candidates: Vec<Artifact> = DEPENDENCY_LISTS
            .iter()
            .flat_map(|kind| model.artifacts(*kind))
            .filter(|a| self.context.classifier.classify(&a.coordinate.group) == ownership)
            .filter(|a| !self.context.session.is_entry_touched(a.kind, &a.coordinate))
            .collect();

        println!(
            "\n{}",
            format!("Checking {} {} dependencies...", candidates.len(), ownership).cyan()
        );
        let prefixes = self.context.classifier.prefixes();
        if !prefixes.is_empty() {
            println!("  {}", format!("second-party prefixes: {}", prefixes.join(", ")).dimmed());
        }

        let mut report = UpgradeReport::new();
        let pb = self.context.progress_bar(candidates.len(), "dependencies");
        for artifact in candidates {
            pb.set_message(format!("Checking {}", artifact.coordinate));
            if let Some(result) = self.context.upgrade_artifact(
                model,
                &artifact,
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
