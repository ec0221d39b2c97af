//! Cluster e2e suite.
//!
//! Deploys the Prometheus + sidecar manifests into a fresh namespace, then
//! polls the monitoring backend until the sidecar's exported `up` metric
//! appears and asserts its value. Requires kubectl, cloud credentials, and
//! the `E2E_*` environment described in the crate docs.

#![cfg(feature = "integration")]

use anyhow::{Context, Result};
use serial_test::serial;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use e2e_tests::config::TestConfig;
use e2e_tests::kubectl::{Impersonation, Kubectl, NamespaceGuard};
use e2e_tests::manifests::{self, TemplateValues};
use e2e_tests::monitoring::auth::Scope;
use e2e_tests::monitoring::{
    fetch_float64_metric, Authenticator, Metric, MetricsClient, MonitoredResource,
};

/// Container name from prometheus-service.yml.tmpl.
const CONTAINER_NAME: &str = "prometheus";

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

fn manifest_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("manifests")
        .join(name)
}

#[tokio::test]
#[serial]
async fn sidecar_up_metric_reaches_the_backend() -> Result<()> {
    init_logging();

    let config = TestConfig::from_env()
        .context("incomplete E2E_* environment - see the crate docs for required variables")?;
    let namespace = config.namespace();
    info!(cluster = %config.cluster_name, %namespace, "starting e2e run");

    let kubectl = Kubectl::default();
    kubectl
        .create_namespace(&namespace)
        .context("failed to create the test namespace")?;
    let _guard = NamespaceGuard::new(kubectl.clone(), namespace.clone());

    let values = TemplateValues {
        cluster: config.cluster_name.clone(),
        location: config.cluster_location.clone(),
        namespace: namespace.clone(),
        project_id: config.project_id.clone(),
    };
    let rbac = manifests::render(&manifest_path("rbac-setup.yml.tmpl"), &values)
        .context("cannot render rbac-setup.yml")?;
    let service = manifests::render(&manifest_path("prometheus-service.yml.tmpl"), &values)
        .context("cannot render prometheus-service.yml")?;

    kubectl
        .apply(&namespace, rbac.path(), Some(&Impersonation::admin()))
        .context("failed to apply the RBAC manifest")?;
    kubectl
        .create(&namespace, service.path())
        .context("failed to create the prometheus deployment")?;

    let auth = Authenticator::application_default(Scope::MonitoringRead)
        .await
        .context("failed to obtain monitoring credentials")?;
    let client = MetricsClient::new(auth);

    // instance_id and pod_id are assigned by the deployment at runtime;
    // namespace_id is unique per run and pins the time series on its own.
    let resource = MonitoredResource {
        resource_type: "gke_container".to_string(),
        labels: HashMap::from([
            ("project_id".to_string(), config.project_id.clone()),
            ("cluster_name".to_string(), config.cluster_name.clone()),
            ("namespace_id".to_string(), namespace.clone()),
            ("container_name".to_string(), CONTAINER_NAME.to_string()),
            ("zone".to_string(), config.cluster_location.clone()),
        ]),
    };
    let metric = Metric {
        metric_type: "custom.googleapis.com/up".to_string(),
        labels: HashMap::new(),
    };

    let value = fetch_float64_metric(&client, &config.project_id, &resource, &metric)
        .await
        .context("the sidecar's up metric never became visible in the backend")?;

    assert_eq!(
        value, 1.0,
        "the sidecar should report its scrape target as up"
    );
    Ok(())
}
