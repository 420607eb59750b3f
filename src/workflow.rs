use crate::agents::sorter::sort_dependencies;
use crate::agents::upgrade::report::OutcomeCounts;
use crate::agents::upgrade::{UpgradeOperation, UpgradeOutcome, UpgradeReport, Upgrader};
use crate::agents::ProjectScannerAgent;
use crate::config::Config;
use crate::error::{CopilotError, Result};
use crate::maven::pom::PomModel;
use crate::utils::PathValidator;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Target selection and write-back flags shared by all commands
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target: PathBuf,
    pub recursive: bool,
    pub dry_run: bool,
    pub overwrite: bool,
}

impl RunOptions {
    fn writes(&self) -> bool {
        self.overwrite && !self.dry_run
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub report: UpgradeReport,
    pub written: bool,
}

/// Per-file results of one run, in discovery order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files: Vec<(PathBuf, Result<FileReport>)>,
}

impl RunSummary {
    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn written_files(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, r)| matches!(r, Ok(file) if file.written))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files() > 0
    }

    /// Outcome totals over every descriptor that was processed.
    pub fn outcome_counts(&self) -> OutcomeCounts {
        let mut total = OutcomeCounts::default();
        for file in self.files.iter().filter_map(|(_, r)| r.as_ref().ok()) {
            total += file.report.counts();
        }
        total
    }
}

/// Execute an upgrade operation over the target descriptors
pub fn execute_upgrade(
    config: &Config,
    options: &RunOptions,
    operation: &UpgradeOperation,
) -> Result<RunSummary> {
    println!(
        "{}",
        format!("Upgrading {operation}...").cyan().bold()
    );

    let files = discover(options)?;
    let upgrader = Upgrader::from_config(config)?;
    let summary = run_files(&files, |path| {
        upgrade_file(&upgrader, path, options, operation)
    });

    print_summary(&summary, options);
    Ok(summary)
}

/// Execute the format workflow: literal versions become properties, lists are sorted
pub fn execute_format(config: &Config, options: &RunOptions) -> Result<RunSummary> {
    println!("{}", "Formatting descriptors...".cyan().bold());

    let files = discover(options)?;
    let upgrader = Upgrader::from_config(config)?;
    let summary = run_files(&files, |path| format_file(&upgrader, path, options));

    print_summary(&summary, options);
    Ok(summary)
}

fn discover(options: &RunOptions) -> Result<Vec<PathBuf>> {
    println!("\n{}", "1. Validating target...".yellow());
    let root = PathValidator::validate_target(&options.target)?;
    let files = ProjectScannerAgent::new(&root).discover(options.recursive);
    println!(
        "{}",
        format!("✓ Found {} descriptor(s)", files.len()).green()
    );
    println!("\n{}", "2. Processing descriptors...".yellow());
    Ok(files)
}

/// One failing file never stops the others.
fn run_files<F>(files: &[PathBuf], mut process: F) -> RunSummary
where
    F: FnMut(&Path) -> Result<FileReport>,
{
    let mut summary = RunSummary::default();
    for path in files {
        println!("\n{}", path.display().to_string().white().bold());
        let result = process(path);
        match &result {
            Ok(file) => print_file_report(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "descriptor failed");
                println!("  {} {}", "✗".red(), e.to_string().red());
            }
        }
        summary.files.push((path.clone(), result));
    }
    summary
}

fn load(path: &Path) -> Result<(String, PomModel)> {
    let original = fs::read_to_string(path).map_err(|e| {
        CopilotError::DescriptorParsing(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    let model = PomModel::parse(&original).map_err(|e| {
        CopilotError::DescriptorParsing(format!("Failed to parse '{}': {}", path.display(), e))
    })?;
    Ok((original, model))
}

/// Load, upgrade, sort and write one descriptor. Writes only when an entry
/// changed and writing is enabled.
pub fn upgrade_file(
    upgrader: &Upgrader,
    path: &Path,
    options: &RunOptions,
    operation: &UpgradeOperation,
) -> Result<FileReport> {
    let (_, mut model) = load(path)?;
    let report = upgrader.apply(&mut model, operation)?;

    let written = report.has_changes() && options.writes();
    if written {
        let classifier = upgrader.classifier_for(&model);
        sort_dependencies(&mut model, &classifier);
        model.write(path)?;
    }

    Ok(FileReport { report, written })
}

/// Format one descriptor. Writes when the normalized output differs from the file.
pub fn format_file(upgrader: &Upgrader, path: &Path, options: &RunOptions) -> Result<FileReport> {
    let (original, mut model) = load(path)?;
    let report = upgrader.format(&mut model)?;

    let classifier = upgrader.classifier_for(&model);
    sort_dependencies(&mut model, &classifier);
    let output = model.to_xml()?;

    let written = output != original && options.writes();
    if written {
        fs::write(path, output)?;
    }

    Ok(FileReport { report, written })
}

fn print_file_report(file: &FileReport) {
    if file.report.is_empty() {
        println!("  {}", "Nothing to do".dimmed());
    }

    for result in &file.report.results {
        let coordinate = result.coordinate.to_string();
        let location = format!("[{}]", result.location).dimmed();
        match &result.outcome {
            UpgradeOutcome::Upgraded { from, to, property } => {
                let via = property
                    .as_deref()
                    .map(|p| format!(" (${{{p}}})"))
                    .unwrap_or_default();
                println!(
                    "  • {} {} → {}{} {}",
                    coordinate.white().bold(),
                    from.red(),
                    to.green().bold(),
                    via.dimmed(),
                    location
                );
            }
            UpgradeOutcome::UpToDate { version } => {
                println!("  • {} {} {}", coordinate, version.dimmed(), "up to date".dimmed());
            }
            UpgradeOutcome::Managed { reason } => {
                println!("  • {} {}", coordinate.dimmed(), reason.dimmed());
            }
            UpgradeOutcome::Indirected { version, property } => {
                println!(
                    "  • {} {} → ${{{}}} {}",
                    coordinate.white().bold(),
                    version,
                    property.cyan(),
                    location
                );
            }
            UpgradeOutcome::Unresolved { reason } => {
                println!("  • {} {} {}", coordinate.yellow(), "unresolved:".yellow(), reason);
            }
            UpgradeOutcome::NotFound => {
                println!("  • {} {}", coordinate.yellow(), "not found".yellow());
            }
            UpgradeOutcome::Failed { reason } => {
                println!("  • {} {} {}", coordinate.red(), "failed:".red(), reason.red());
            }
        }
    }

    if file.written {
        println!("  {}", "✓ Descriptor updated".green());
    }
}

fn print_summary(summary: &RunSummary, options: &RunOptions) {
    println!("\n{}", "Summary:".cyan().bold());
    println!(
        "  {} descriptor(s), {} written, {} failed",
        summary.files.len().to_string().yellow(),
        summary.written_files().to_string().green(),
        summary.failed_files().to_string().red()
    );

    let counts = summary.outcome_counts();
    println!(
        "  {} upgraded, {} indirected, {} up to date, {} managed",
        counts.upgraded.to_string().green(),
        counts.indirected.to_string().green(),
        counts.up_to_date,
        counts.managed
    );
    if counts.unresolved + counts.not_found + counts.failed > 0 {
        println!(
            "  {} unresolved, {} not found, {} failed",
            counts.unresolved.to_string().yellow(),
            counts.not_found.to_string().yellow(),
            counts.failed.to_string().red()
        );
    }

    if options.dry_run {
        println!("  {}", "(dry run: no files were written)".dimmed());
    } else if !options.overwrite {
        println!("  {}", "(overwrite disabled: no files were written)".dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::classifier::OwnershipClassifier;
    use crate::agents::resolver::VersionResolver;
    use crate::maven::pom::tests::DEMO_POM;
    use crate::repository::testing::StaticRepository;
    use crate::repository::{Coordinate, DefaultVersionStrategy};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn upgrader() -> Upgrader {
        let repo = Arc::new(
            StaticRepository::new()
                .with("org.acme", "widget", &["1.2.0", "1.3.0"])
                .with("com.external", "lib", &["2.0.0"])
                .with_platform(&["3.2.0"]),
        );
        let resolver =
            VersionResolver::new(repo.clone(), repo, DefaultVersionStrategy::shared(), false);
        Upgrader::new(resolver, OwnershipClassifier::new(["org.acme"]), false)
    }

    fn options(target: &Path, dry_run: bool) -> RunOptions {
        RunOptions {
            target: target.to_path_buf(),
            recursive: false,
            dry_run,
            overwrite: true,
        }
    }

    #[test]
    fn upgrade_writes_property_and_placeholder() {
        let dir = tempdir().unwrap();
        let pom = dir.path().join("pom.xml");
        fs::write(&pom, DEMO_POM).unwrap();

        let file = upgrade_file(
            &upgrader(),
            &pom,
            &options(dir.path(), false),
            &UpgradeOperation::SecondParty,
        )
        .unwrap();

        assert!(file.written);
        let written = PomModel::load(&pom).unwrap();
        assert_eq!(written.property("widget.version"), Some("1.3.0"));
        assert!(fs::read_to_string(&pom)
            .unwrap()
            .contains("<version>${widget.version}</version>"));
    }

    #[test]
    fn dry_run_leaves_bytes_identical() {
        let dir = tempdir().unwrap();
        let pom = dir.path().join("pom.xml");
        fs::write(&pom, DEMO_POM).unwrap();

        let file = upgrade_file(
            &upgrader(),
            &pom,
            &options(dir.path(), true),
            &UpgradeOperation::All,
        )
        .unwrap();

        assert!(file.report.has_changes());
        assert!(!file.written);
        assert_eq!(fs::read_to_string(&pom).unwrap(), DEMO_POM);
    }

    #[test]
    fn overwrite_disabled_does_not_write() {
        let dir = tempdir().unwrap();
        let pom = dir.path().join("pom.xml");
        fs::write(&pom, DEMO_POM).unwrap();

        let mut opts = options(dir.path(), false);
        opts.overwrite = false;
        let file = upgrade_file(&upgrader(), &pom, &opts, &UpgradeOperation::SecondParty).unwrap();

        assert!(!file.written);
        assert_eq!(fs::read_to_string(&pom).unwrap(), DEMO_POM);
    }

    #[test]
    fn absent_dependency_is_not_written() {
        let dir = tempdir().unwrap();
        let pom = dir.path().join("pom.xml");
        fs::write(&pom, DEMO_POM).unwrap();

        let operation = UpgradeOperation::Dependency {
            coordinate: Coordinate::new("org.acme", "missing"),
        };
        let file = upgrade_file(&upgrader(), &pom, &options(dir.path(), false), &operation).unwrap();

        assert!(!file.written);
        assert_eq!(
            file.report.results[0].outcome,
            UpgradeOutcome::NotFound
        );
        assert_eq!(fs::read_to_string(&pom).unwrap(), DEMO_POM);
    }

    #[test]
    fn failing_descriptor_does_not_stop_the_run() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.xml");
        let good = dir.path().join("pom.xml");
        fs::write(&broken, "<project><dependencies>").unwrap();
        fs::write(&good, DEMO_POM).unwrap();

        let upgrader = upgrader();
        let opts = options(dir.path(), false);
        let summary = run_files(&[broken.clone(), good.clone()], |path| {
            upgrade_file(&upgrader, path, &opts, &UpgradeOperation::SecondParty)
        });

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.failed_files(), 1);
        assert!(summary.has_failures());
        assert!(matches!(
            summary.files[0].1,
            Err(CopilotError::DescriptorParsing(_))
        ));
        assert_eq!(summary.written_files(), 1);

        let counts = summary.outcome_counts();
        assert_eq!(counts.upgraded, 1);
        assert_eq!(counts.failed, 0);
    }

    #[test]
    fn format_is_idempotent() {
        let dir = tempdir().unwrap();
        let pom = dir.path().join("pom.xml");
        fs::write(&pom, DEMO_POM).unwrap();
        let upgrader = upgrader();
        let opts = options(dir.path(), false);

        let first = format_file(&upgrader, &pom, &opts).unwrap();
        assert!(first.written);
        let formatted = fs::read_to_string(&pom).unwrap();
        assert!(formatted.contains("<widget.version>1.2.0</widget.version>"));

        let second = format_file(&upgrader, &pom, &opts).unwrap();
        assert!(!second.written);
        assert!(second.report.is_empty());
        assert_eq!(fs::read_to_string(&pom).unwrap(), formatted);
    }

    #[test]
    fn upgraded_descriptor_is_sorted() {
        let dir = tempdir().unwrap();
        let pom = dir.path().join("pom.xml");
        fs::write(&pom, DEMO_POM).unwrap();

        upgrade_file(
            &upgrader(),
            &pom,
            &options(dir.path(), false),
            &UpgradeOperation::SecondParty,
        )
        .unwrap();

        let content = fs::read_to_string(&pom).unwrap();
        let widget = content.find("<artifactId>widget</artifactId>").unwrap();
        let lib = content.find("<artifactId>lib</artifactId>").unwrap();
        assert!(widget < lib);
    }
}
