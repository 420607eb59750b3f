pub mod classifier;
pub mod project_scanner;
pub mod property_rewriter;
pub mod resolver;
pub mod sorter;
pub mod upgrade;

pub use project_scanner::ProjectScannerAgent;
pub use upgrade::UpgradeOperation;
