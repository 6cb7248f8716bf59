//! Terraform lifecycle steps

/// Default name of the plan artifact shared by `plan` and `apply`
pub const DEFAULT_PLAN_FILE: &str = "tfplan";

/// One external tool invocation in the deployment pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    Init,
    Validate,
    Plan,
    Apply,
}

impl LifecycleStep {
    /// Steps in the order they run
    pub const ORDER: [LifecycleStep; 4] = [
        LifecycleStep::Init,
        LifecycleStep::Validate,
        LifecycleStep::Plan,
        LifecycleStep::Apply,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleStep::Init => "init",
            LifecycleStep::Validate => "validate",
            LifecycleStep::Plan => "plan",
            LifecycleStep::Apply => "apply",
        }
    }

    /// Subcommand arguments. Apply consumes the plan artifact and never
    /// prompts for confirmation.
    pub fn args(&self, plan_file: &str) -> Vec<String> {
        match self {
            LifecycleStep::Init => vec!["init".to_string(), "-input=false".to_string()],
            LifecycleStep::Validate => vec!["validate".to_string()],
            LifecycleStep::Plan => vec![
                "plan".to_string(),
                "-input=false".to_string(),
                format!("-out={}", plan_file),
            ],
            LifecycleStep::Apply => vec![
                "apply".to_string(),
                "-input=false".to_string(),
                "-auto-approve".to_string(),
                plan_file.to_string(),
            ],
        }
    }

    /// Message shown while the step runs
    pub fn running_message(&self) -> &'static str {
        match self {
            LifecycleStep::Init => "Initializing Terraform...",
            LifecycleStep::Validate => "Validating Terraform configuration...",
            LifecycleStep::Plan => "Creating Terraform execution plan...",
            LifecycleStep::Apply => "Executing Terraform apply...",
        }
    }

    /// Log entry recorded once the step succeeds
    pub fn success_message(&self) -> &'static str {
        match self {
            LifecycleStep::Init => "Terraform initialization completed",
            LifecycleStep::Validate => "Terraform configuration is valid",
            LifecycleStep::Plan => "Terraform execution plan created",
            LifecycleStep::Apply => "Terraform apply completed",
        }
    }

    /// Progress once the step succeeds
    pub fn progress_after(&self) -> u8 {
        match self {
            LifecycleStep::Init => 20,
            LifecycleStep::Validate => 30,
            LifecycleStep::Plan => 40,
            LifecycleStep::Apply => 90,
        }
    }

    /// Progress reported when the step starts, if it moves the bar
    pub fn progress_before(&self) -> Option<u8> {
        match self {
            LifecycleStep::Apply => Some(60),
            _ => None,
        }
    }
}
