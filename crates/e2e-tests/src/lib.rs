//! End-to-End Test Suite for the Metrics Sidecar
//!
//! This crate deploys the metrics-export sidecar into a fresh Kubernetes
//! namespace and validates that the metrics it exports become visible in the
//! Cloud Monitoring backend with the expected values.
//!
//! # Features
//!
//! - `integration`: the cluster suite. Deploys real manifests via kubectl and
//!   polls the real backend; takes minutes and needs cloud credentials.
//!
//! The poller contract tests in `tests/20_metric_poller.rs` are hermetic
//! (wiremock-backed) and always run.
//!
//! # Prerequisites for the cluster suite
//!
//! 1. kubectl in PATH, with its current context pointing at the test cluster
//! 2. Credentials with read access to the monitoring API, either via
//!    `GOOGLE_APPLICATION_CREDENTIALS` or the instance metadata server
//! 3. Configuration in the environment: `E2E_CLUSTER_LOCATION`,
//!    `E2E_CLUSTER_NAME`, `E2E_PROJECT_ID` (and optionally
//!    `E2E_NAMESPACE_NAME` to pin the namespace)
//!
//! # Usage
//!
//! ```bash
//! # Hermetic tests only
//! cargo test -p e2e-tests
//!
//! # Full run against a cluster
//! E2E_CLUSTER_LOCATION=us-central1-a \
//! E2E_CLUSTER_NAME=e2e-cluster \
//! E2E_PROJECT_ID=my-project \
//! cargo test -p e2e-tests --features integration
//! ```

pub mod config;
pub mod kubectl;
pub mod manifests;
pub mod monitoring;
pub mod retry;
