use crate::context::Context;
use crate::error::WorkflowError;
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::time::Duration;

/// Type-safe step name wrapper.
///
/// # Examples
///
/// ```
/// use junban::StepName;
///
/// let name = StepName::new("TakeOrder");
/// assert_eq!(name.as_str(), "TakeOrder");
///
/// let name: StepName = "CompleteOrder".into();
/// assert_eq!(name.to_string(), "CompleteOrder");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepName(String);

impl StepName {
    /// Creates a new StepName
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a StepName from a type's name (extracts last segment)
    pub fn from_type_name<T: ?Sized>() -> Self {
        let full_name = std::any::type_name::<T>();
        let short_name = full_name.rsplit("::").next().unwrap_or("UnknownStep");
        Self::new(short_name)
    }

    /// Returns the step name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for StepName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Configuration for a workflow step.
///
/// ```
/// use junban::StepConfig;
/// use std::time::Duration;
///
/// let config = StepConfig {
///     timeout: Some(Duration::from_secs(5)),
/// };
/// assert_ne!(config.timeout, StepConfig::default().timeout);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConfig {
    /// Maximum time allowed for step execution. `None` means no timeout.
    /// Default: 30 seconds.
    pub timeout: Option<Duration>,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// One unit of work in a [`Workflow`](crate::Workflow).
///
/// A step consumes the previous step's output (or the run's initial input)
/// and produces the value handed to the next step. Returning an error ends
/// the run; no later step is invoked.
///
/// Console output belongs in `execute` itself, emitted through
/// [`Context::console`] while the step runs. Delayed work goes through
/// [`Context::effects`] and is never awaited by the step.
///
/// # Examples
///
/// ```
/// use junban::prelude::*;
/// use async_trait::async_trait;
///
/// define_step!(Shout);
///
/// #[async_trait]
/// impl Step<String> for Shout {
///     async fn execute(&self, ctx: &Context, input: String) -> Result<String, WorkflowError> {
///         ctx.console().emit(format!("shouting {}", input));
///         Ok(input.to_uppercase())
///     }
/// }
/// ```
#[async_trait]
pub trait Step<T>: Send + Sync + Debug {
    /// Runs the step against `input`.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - hand `output` to the next step
    /// - `Err(error)` - stop the run with `error`
    async fn execute(&self, ctx: &Context, input: T) -> Result<T, WorkflowError>;

    /// Returns the step name.
    ///
    /// By default, uses the type name. Override to provide a custom name.
    fn name(&self) -> StepName {
        StepName::from_type_name::<Self>()
    }

    /// Returns the step configuration.
    fn config(&self) -> StepConfig {
        StepConfig::default()
    }
}
