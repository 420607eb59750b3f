use crate::config::Config;
use crate::error::{CopilotError, Result};
use crate::maven::repository::{build_client, read_capped, MavenRepository, MAX_METADATA_BYTES};
use crate::repository::PlatformClient;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

const INITIALIZR_METADATA: &str = "application/vnd.initializr.v2.2+json";

/// Spring Initializr client, the source of the Spring Boot release train
pub struct SpringInitializrClient {
    client: Client,
    url: String,
}

impl SpringInitializrClient {
    pub fn new(config: &Config) -> Result<Self> {
        MavenRepository::validate_repository_url(
            &config.spring_initializr_url,
            config.allow_private_hosts,
        )?;

        Ok(Self {
            client: build_client(config.request_timeout_secs)?,
            url: config.spring_initializr_url.clone(),
        })
    }

    /// Fetch the Spring Boot versions offered by Initializr
    ///
    /// The list includes snapshots and milestones; filtering is left to the
    /// version strategy.
    pub fn fetch_boot_versions(&self) -> Result<Vec<String>> {
        tracing::debug!(url = %self.url, "fetching spring initializr metadata");

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, INITIALIZR_METADATA)
            .send()
            .map_err(|e| CopilotError::Repository(format!("Spring Initializr request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CopilotError::Repository(format!(
                "Spring Initializr answered HTTP {}",
                response.status()
            )));
        }

        let declared = response.content_length();
        let text = read_capped(response, declared, MAX_METADATA_BYTES)?;
        parse_boot_versions(&text)
    }
}

impl PlatformClient for SpringInitializrClient {
    fn fetch_platform_versions(&self) -> Result<Vec<String>> {
        self.fetch_boot_versions()
    }
}

fn parse_boot_versions(body: &str) -> Result<Vec<String>> {
    let metadata: InitializrMetadata = serde_json::from_str(body)?;
    Ok(metadata
        .boot_version
        .values
        .into_iter()
        .map(|v| v.id)
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializrMetadata {
    boot_version: BootVersion,
}

#[derive(Debug, Deserialize)]
struct BootVersion {
    #[serde(default)]
    values: Vec<BootVersionValue>,
}

#[derive(Debug, Deserialize)]
struct BootVersionValue {
    id: String,
}
