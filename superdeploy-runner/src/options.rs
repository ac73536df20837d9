//! Deployment options shared by `deploy`, `plan`, `teardown` and `refresh`.

use crate::error::DispatchError;

/// Stage selection and verbosity. Options alter which stages run, never the
/// resolved descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Terraform `plan` instead of `apply`, Ansible `--check`.
    pub plan_only: bool,
    /// Skip the application (Ansible) stage.
    pub infrastructure_only: bool,
    /// Skip the infrastructure (Terraform) stage.
    pub application_only: bool,
    pub verbose: bool,
}

impl DeployOptions {
    /// Reject conflicting flags. Runs before any resolution.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.infrastructure_only && self.application_only {
            return Err(DispatchError::Validation(
                "--infrastructure-only and --application-only are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn planning(self) -> Self {
        Self {
            plan_only: true,
            ..self
        }
    }

    pub fn runs_infrastructure(&self) -> bool {
        !self.application_only
    }

    pub fn runs_application(&self) -> bool {
        !self.infrastructure_only
    }

    /// Standardized flags passed to custom deployment scripts.
    pub fn script_args(&self, project: &str) -> Vec<String> {
        let mut args = vec!["--project-name".to_string(), project.to_string()];
        if self.plan_only {
            args.push("--plan-only".to_string());
        } else {
            args.push("--auto-approve".to_string());
        }
        if self.infrastructure_only {
            args.push("--infrastructure-only".to_string());
        }
        if self.application_only {
            args.push("--application-only".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args
    }
}
