//! Run configuration for the e2e suite.
//!
//! The harness is configured entirely through `E2E_*` environment variables so
//! it can run under `cargo test` without fighting the test runner over argv.
//! Required values are validated up front: a missing or empty variable fails
//! the run before any subprocess is spawned or network request is made.

use thiserror::Error;
use uuid::Uuid;

/// Environment variable names consumed by [`TestConfig::from_env`].
pub const CLUSTER_LOCATION_VAR: &str = "E2E_CLUSTER_LOCATION";
pub const CLUSTER_NAME_VAR: &str = "E2E_CLUSTER_NAME";
pub const NAMESPACE_NAME_VAR: &str = "E2E_NAMESPACE_NAME";
pub const PROJECT_ID_VAR: &str = "E2E_PROJECT_ID";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {name} is not set")]
    Missing { name: &'static str },

    #[error("environment variable {name} must not be empty")]
    Empty { name: &'static str },
}

/// Configuration for one e2e run.
///
/// `namespace_name` is optional: when unset, each run gets a unique
/// generated namespace so concurrent or repeated runs cannot collide.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Cluster location (zone or region), e.g. `us-central1-a`.
    pub cluster_location: String,
    /// Name of the cluster kubectl's current context points at.
    pub cluster_name: String,
    /// Explicit namespace to deploy into, if pinned by the caller.
    pub namespace_name: Option<String>,
    /// Cloud project the sidecar exports metrics to.
    pub project_id: String,
}

impl TestConfig {
    /// Build the configuration from `E2E_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        Ok(Self {
            cluster_location: required(&lookup, CLUSTER_LOCATION_VAR)?,
            cluster_name: required(&lookup, CLUSTER_NAME_VAR)?,
            namespace_name: lookup(NAMESPACE_NAME_VAR).filter(|v| !v.is_empty()),
            project_id: required(&lookup, PROJECT_ID_VAR)?,
        })
    }

    /// The namespace for this run: the pinned name, or a fresh `e2e-<hex>` one.
    pub fn namespace(&self) -> String {
        match &self.namespace_name {
            Some(name) => name.clone(),
            None => format!("e2e-{}", Uuid::new_v4().simple()),
        }
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(name) {
        None => Err(ConfigError::Missing { name }),
        Some(value) if value.is_empty() => Err(ConfigError::Empty { name }),
        Some(value) => Ok(value),
    }
}
