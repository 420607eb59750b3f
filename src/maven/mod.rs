pub mod initializr;
pub mod pom;
pub mod repository;
pub mod version;
pub mod xml;

pub use initializr::SpringInitializrClient;
pub use repository::{parse_maven_coordinate, MavenRepository};
