use crate::config::Config;
use crate::error::Result;
use crate::maven::{MavenRepository, SpringInitializrClient};
use crate::repository::{PlatformClient, RepositoryClient};
use std::sync::Arc;

pub struct RepositoryFactory;

impl RepositoryFactory {
    pub fn create_maven(config: &Config) -> Result<Arc<dyn RepositoryClient>> {
        Ok(Arc::new(MavenRepository::new(config)?))
    }

    pub fn create_spring_initializr(config: &Config) -> Result<Arc<dyn PlatformClient>> {
        Ok(Arc::new(SpringInitializrClient::new(config)?))
    }
}
