// Handler modules for the upgrade operations
//
// Each handler owns one slice of the descriptor. They share an UpgradeContext,
// so running several in a row never touches an entry twice.

pub mod dependency_handler;
pub mod kotlin_handler;
pub mod plugin_handler;
pub mod spring_boot_handler;

pub use dependency_handler::DependencyHandler;
pub use kotlin_handler::KotlinHandler;
pub use plugin_handler::PluginHandler;
pub use spring_boot_handler::SpringBootHandler;
