use crate::step::StepName;
use thiserror::Error;

/// Errors that can end a workflow run.
///
/// Every variant is terminal: a run that produces one of these never
/// resumes. When a step rejects, `Display` yields the step's message
/// verbatim, which is what a failure handler is expected to surface.
///
/// # Non-Exhaustive
///
/// New variants may be added, so matches need a wildcard arm:
///
/// ```
/// use junban::{StepName, WorkflowError};
///
/// fn describe(error: &WorkflowError) -> String {
///     match error {
///         WorkflowError::Rejected { message, .. } => message.clone(),
///         WorkflowError::Timeout { step_name } => format!("{} took too long", step_name),
///         _ => error.to_string(),
///     }
/// }
///
/// let error = WorkflowError::rejected(StepName::new("ScheduleMeeting"), "Meeting already scheduled");
/// assert_eq!(describe(&error), "Meeting already scheduled");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorkflowError {
    /// A step signalled failure.
    #[error("{message}")]
    Rejected {
        /// The step that rejected
        step_name: StepName,
        /// Human-readable reason, preserved as given
        message: String,
    },

    /// A step exceeded its configured timeout.
    #[error("Timeout occurred in step: {step_name}")]
    Timeout {
        /// The step that timed out
        step_name: StepName,
    },

    /// A continuation was dropped without proceeding or failing.
    #[error("Step '{step_name}' dropped its continuation without resolving it")]
    Abandoned {
        /// The step that owned the continuation
        step_name: StepName,
    },

    /// A continuation chain returned before reaching a terminal state.
    #[error("Workflow returned before every step resolved its continuation")]
    Incomplete,

    /// A detached effect could not be handed to an async runtime.
    #[error("Failed to schedule effect '{label}': {details}")]
    Scheduling {
        /// Label of the effect
        label: String,
        /// Why scheduling failed
        details: String,
    },

    /// The workflow configuration is invalid.
    #[error("Invalid workflow configuration: {0}")]
    Configuration(String),
}

impl WorkflowError {
    /// Builds the error a step returns to reject its input.
    pub fn rejected(step_name: impl Into<StepName>, message: impl Into<String>) -> Self {
        WorkflowError::Rejected {
            step_name: step_name.into(),
            message: message.into(),
        }
    }

    /// The step the error originated in, when one is known.
    pub fn step_name(&self) -> Option<&StepName> {
        match self {
            WorkflowError::Rejected { step_name, .. }
            | WorkflowError::Timeout { step_name }
            | WorkflowError::Abandoned { step_name } => Some(step_name),
            WorkflowError::Incomplete
            | WorkflowError::Scheduling { .. }
            | WorkflowError::Configuration(_) => None,
        }
    }
}
