//! kubectl subprocess wrapper.
//!
//! All cluster mutations go through the CLI, mirroring how the deployment
//! itself is driven. Output is captured and only logged when a command fails;
//! a non-zero exit is always an error for the caller to surface.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{error, info, warn};

/// kubectl invocation errors.
#[derive(Debug, Error)]
pub enum KubectlError {
    #[error("failed to spawn {program}: {source}. Is kubectl installed and in PATH?")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Impersonation parameters for `kubectl --as` / `--as-group`.
#[derive(Debug, Clone)]
pub struct Impersonation {
    pub user: String,
    pub group: String,
}

impl Impersonation {
    /// Cluster-admin impersonation used to apply RBAC manifests.
    pub fn admin() -> Self {
        Self {
            user: "admin".to_string(),
            group: "system:masters".to_string(),
        }
    }
}

/// Thin wrapper over the `kubectl` binary.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
}

impl Default for Kubectl {
    fn default() -> Self {
        // Assume in PATH
        Self::with_program("kubectl")
    }
}

impl Kubectl {
    /// Use a specific binary instead of `kubectl` from PATH.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run the CLI with the given arguments, capturing output.
    ///
    /// stdout/stderr are logged only on failure so passing runs stay quiet.
    pub fn run<I, S>(&self, args: I) -> Result<(), KubectlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(args);

        let human = human_readable(&command);
        info!(command = %human, "running kubectl");

        let output = command.output().map_err(|source| KubectlError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(command = %human, status = %output.status, "kubectl failed");
        error!(stdout = %stdout, stderr = %stderr, "kubectl output");

        Err(KubectlError::CommandFailed {
            command: human,
            status: output.status,
            stderr: stderr.trim().to_string(),
        })
    }

    pub fn create_namespace(&self, name: &str) -> Result<(), KubectlError> {
        self.run(["create", "namespace", name])
    }

    /// Delete a namespace, tolerating one that is already gone.
    pub fn delete_namespace(&self, name: &str) -> Result<(), KubectlError> {
        self.run(["delete", "namespace", name, "--ignore-not-found=true"])
    }

    /// `kubectl apply` a manifest, optionally impersonating a privileged user.
    pub fn apply(
        &self,
        namespace: &str,
        manifest: &Path,
        impersonate: Option<&Impersonation>,
    ) -> Result<(), KubectlError> {
        let mut args = vec![
            "apply".to_string(),
            "--namespace".to_string(),
            namespace.to_string(),
            "-f".to_string(),
            manifest.display().to_string(),
        ];
        if let Some(who) = impersonate {
            args.push(format!("--as={}", who.user));
            args.push(format!("--as-group={}", who.group));
        }
        self.run(args)
    }

    /// `kubectl create` resources from a manifest in the given namespace.
    pub fn create(&self, namespace: &str, manifest: &Path) -> Result<(), KubectlError> {
        let manifest = manifest.display().to_string();
        self.run(["create", "--namespace", namespace, "-f", manifest.as_str()])
    }
}

/// Deletes its namespace when dropped.
///
/// Teardown is best effort: a failed delete is logged and otherwise ignored,
/// so a flaky cleanup never masks the test's real outcome.
#[derive(Debug)]
pub struct NamespaceGuard {
    kubectl: Kubectl,
    name: String,
}

impl NamespaceGuard {
    pub fn new(kubectl: Kubectl, name: impl Into<String>) -> Self {
        Self {
            kubectl,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NamespaceGuard {
    fn drop(&mut self) {
        if let Err(error) = self.kubectl.delete_namespace(&self.name) {
            warn!(namespace = %self.name, %error, "namespace teardown failed");
        }
    }
}

fn human_readable(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_command_returns_ok() {
        // `true` exits 0 regardless of arguments.
        let kubectl = Kubectl::with_program("true");
        kubectl
            .run(["get", "pods"])
            .expect("zero exit should be Ok");
    }

    #[test]
    fn failing_command_reports_status() {
        let kubectl = Kubectl::with_program("false");
        let err = kubectl.run(["get", "pods"]).expect_err("non-zero exit");

        match err {
            KubectlError::CommandFailed { command, .. } => {
                assert!(command.contains("get pods"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let kubectl = Kubectl::with_program("/nonexistent/kubectl-e2e");
        let err = kubectl
            .run(["version"])
            .expect_err("spawn should fail for a missing binary");
        assert!(matches!(err, KubectlError::Spawn { .. }));
    }

    #[test]
    fn namespace_guard_drop_never_panics() {
        let guard = NamespaceGuard::new(Kubectl::with_program("false"), "e2e-doomed");
        assert_eq!(guard.name(), "e2e-doomed");
        drop(guard);
    }

    #[test]
    fn admin_impersonation_matches_rbac_requirements() {
        let who = Impersonation::admin();
        assert_eq!(who.user, "admin");
        assert_eq!(who.group, "system:masters");
    }
}
