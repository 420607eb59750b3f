use crate::config::{Config, RepositoryConfig};
use crate::error::{CopilotError, Result};
use crate::maven::version::Version;
use crate::repository::{Coordinate, RepositoryClient};
use quick_xml::de::from_str;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::io::Read;
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

pub(crate) const MAX_METADATA_BYTES: usize = 10 * 1024 * 1024;

/// Maven repository client
pub struct MavenRepository {
    client: Client,
    repositories: Vec<RepositoryConfig>,
}

impl MavenRepository {
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_client(config.request_timeout_secs)?;
        let repositories =
            Self::ensure_valid_repositories(config.repositories.clone(), config.allow_private_hosts)?;

        Ok(Self {
            client,
            repositories,
        })
    }

    /// Fetch all available versions for a dependency, sorted from newest to oldest.
    /// Stops at the first repository that has the artifact.
    pub fn fetch_available_versions(&self, group: &str, artifact: &str) -> Result<Vec<String>> {
        for repo in &self.repositories {
            if !repo.group_filters.is_empty() && !Self::matches_filters(group, &repo.group_filters)
            {
                continue;
            }

            if let Ok(Some(versions)) =
                self.fetch_all_versions_from_repository(&repo.url, group, artifact)
            {
                if versions.is_empty() {
                    continue;
                }

                let mut parsed: Vec<Version> =
                    versions.into_iter().map(|v| Version::parse(&v)).collect();
                parsed.sort();
                parsed.dedup_by(|a, b| a.original == b.original);
                let ordered = parsed.into_iter().rev().map(|v| v.original).collect();
                return Ok(ordered);
            }
        }

        Ok(Vec::new())
    }

    /// Check if a group matches any of the regex filters
    fn matches_filters(group: &str, filters: &[String]) -> bool {
        filters
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .any(|re| re.is_match(group))
    }

    fn fetch_all_versions_from_repository(
        &self,
        repo_url: &str,
        group: &str,
        artifact: &str,
    ) -> Result<Option<Vec<String>>> {
        let metadata_url = metadata_url(repo_url, group, artifact);
        tracing::debug!(url = %metadata_url, "fetching maven metadata");

        let response = match self.client.get(&metadata_url).send() {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(url = %metadata_url, error = %e, "metadata request failed");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            tracing::debug!(url = %metadata_url, status = %response.status(), "metadata not available");
            return Ok(None);
        }

        let declared = response.content_length();
        let text = read_capped(response, declared, MAX_METADATA_BYTES)?;
        parse_metadata(&text).map(Some)
    }

    fn ensure_valid_repositories(
        repositories: Vec<RepositoryConfig>,
        allow_private_hosts: bool,
    ) -> Result<Vec<RepositoryConfig>> {
        for repo in &repositories {
            Self::validate_repository_url(&repo.url, allow_private_hosts)?;
            for pattern in &repo.group_filters {
                Regex::new(pattern).map_err(|e| {
                    CopilotError::Configuration(format!(
                        "Invalid group filter '{}' for repository '{}': {}",
                        pattern, repo.name, e
                    ))
                })?;
            }
        }
        Ok(repositories)
    }

    pub(crate) fn validate_repository_url(url: &str, allow_private_hosts: bool) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|_| CopilotError::Configuration(format!("Invalid repository URL: {url}")))?;

        match parsed.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(CopilotError::Configuration(format!(
                    "Unsupported repository scheme: {scheme}"
                )));
            }
        }

        if let Some(host) = parsed.host_str() {
            if !allow_private_hosts && Self::is_private_host(host) {
                return Err(CopilotError::Configuration(format!(
                    "Repository host '{host}' is not allowed"
                )));
            }
        }

        Ok(())
    }

    fn is_private_host(host: &str) -> bool {
        if host.eq_ignore_ascii_case("localhost") {
            return true;
        }

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            match ip {
                IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
                IpAddr::V6(v6) => v6.is_loopback() || v6.is_unique_local(),
            }
        } else {
            false
        }
    }
}

impl RepositoryClient for MavenRepository {
    fn fetch_available_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>> {
        MavenRepository::fetch_available_versions(self, &coordinate.group, &coordinate.artifact)
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("co-pilot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CopilotError::Repository(e.to_string()))
}

/// Reads a response body, refusing anything over `limit` bytes without
/// buffering more than `limit + 1` of it.
pub(crate) fn read_capped<R: Read>(reader: R, declared: Option<u64>, limit: usize) -> Result<String> {
    let too_large = || {
        CopilotError::Repository(format!(
            "response exceeded the {} MiB limit",
            limit / (1024 * 1024)
        ))
    };

    if declared.is_some_and(|len| len > limit as u64) {
        return Err(too_large());
    }

    let mut body = String::new();
    reader
        .take(limit as u64 + 1)
        .read_to_string(&mut body)
        .map_err(|e| CopilotError::Repository(format!("failed to read response: {e}")))?;

    if body.len() > limit {
        return Err(too_large());
    }
    Ok(body)
}

fn metadata_url(repo_url: &str, group: &str, artifact: &str) -> String {
    format!(
        "{}/{}/{}/maven-metadata.xml",
        repo_url.trim_end_matches('/'),
        group.replace('.', "/"),
        artifact
    )
}

fn parse_metadata(text: &str) -> Result<Vec<String>> {
    let metadata: MavenMetadata = from_str(text).map_err(|e| {
        CopilotError::Repository(format!("Failed to parse Maven metadata: {}", e))
    })?;
    Ok(metadata
        .versioning
        .map(|v| v.versions.version)
        .unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct MavenMetadata {
    versioning: Option<Versioning>,
}

#[derive(Debug, Deserialize)]
struct Versioning {
    #[serde(default)]
    versions: Versions,
}

#[derive(Debug, Default, Deserialize)]
struct Versions {
    #[serde(default)]
    version: Vec<String>,
}

/// Parse a Maven coordinate (e.g., "com.example:artifact:1.0.0")
pub fn parse_maven_coordinate(coordinate: &str) -> Option<(String, String, Option<String>)> {
    let parts: Vec<&str> = coordinate.split(':').collect();
    match parts.len() {
        2 => Some((parts[0].to_string(), parts[1].to_string(), None)),
        3 => Some((
            parts[0].to_string(),
            parts[1].to_string(),
            Some(parts[2].to_string()),
        )),
        _ => None,
    }
}
