//! Continuation-passing workflows.
//!
//! Each step receives a [`Continuation`] and decides, once, whether the run
//! proceeds or fails. Proceeding calls straight into the next step, so the
//! whole chain runs synchronously inside [`CallbackWorkflow::run_with`] and
//! the nesting depth equals the number of steps.

use crate::context::{lock, Context};
use crate::error::WorkflowError;
use crate::step::StepName;
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

type Resume<T> = Box<dyn FnOnce(Result<T, WorkflowError>) + Send + 'static>;

/// The rest of the workflow, handed to a step.
///
/// Consuming it with [`proceed`](Continuation::proceed) or
/// [`fail`](Continuation::fail) resumes the chain. Dropping it unresolved
/// fails the run with [`WorkflowError::Abandoned`].
#[must_use = "dropping a continuation abandons the workflow"]
pub struct Continuation<T> {
    step_name: StepName,
    resume: Option<Resume<T>>,
}

impl<T> Debug for Continuation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("step_name", &self.step_name)
            .field("resolved", &self.resume.is_none())
            .finish()
    }
}

impl<T> Continuation<T> {
    fn new(step_name: StepName, resume: Resume<T>) -> Self {
        Self {
            step_name,
            resume: Some(resume),
        }
    }

    /// Hands `value` to the next step.
    pub fn proceed(mut self, value: T) {
        self.resolve(Ok(value));
    }

    /// Stops the workflow with `error`.
    pub fn fail(mut self, error: WorkflowError) {
        self.resolve(Err(error));
    }

    /// Proceeds or fails depending on `outcome`.
    pub fn complete(mut self, outcome: Result<T, WorkflowError>) {
        self.resolve(outcome);
    }

    fn resolve(&mut self, outcome: Result<T, WorkflowError>) {
        if let Some(resume) = self.resume.take() {
            resume(outcome);
        }
    }
}

impl<T> Drop for Continuation<T> {
    fn drop(&mut self) {
        if self.resume.is_some() {
            warn!("Step '{}' dropped its continuation", self.step_name);
            let step_name = self.step_name.clone();
            self.resolve(Err(WorkflowError::Abandoned { step_name }));
        }
    }
}

/// A step written in continuation-passing style.
pub trait CallbackStep<T>: Send + Sync + Debug {
    /// Does the step's work on `input`, then resolves `next` exactly once.
    fn call(&self, ctx: &Context, input: T, next: Continuation<T>);

    /// Returns the step name.
    fn name(&self) -> StepName {
        StepName::from_type_name::<Self>()
    }
}

/// Ordered continuation-passing steps.
///
/// ```
/// use junban::prelude::*;
///
/// define_step!(Increment);
///
/// impl CallbackStep<u32> for Increment {
///     fn call(&self, _ctx: &Context, input: u32, next: Continuation<u32>) {
///         next.proceed(input + 1);
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), WorkflowError> {
/// let workflow = CallbackWorkflow::<u32>::builder()
///     .add::<Increment>()
///     .add::<Increment>()
///     .build()?;
///
/// assert_eq!(workflow.run(&Context::capture(), 1), Ok(3));
/// # Ok(())
/// # }
/// ```
pub struct CallbackWorkflow<T> {
    steps: Arc<[Box<dyn CallbackStep<T>>]>,
}

impl<T> Debug for CallbackWorkflow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<StepName> = self.steps.iter().map(|step| step.name()).collect();
        f.debug_struct("CallbackWorkflow")
            .field("steps", &names)
            .finish()
    }
}

impl<T: Send + 'static> CallbackWorkflow<T> {
    pub fn builder() -> CallbackWorkflowBuilder<T> {
        CallbackWorkflowBuilder::new()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Starts the chain and hands the terminal result to `done`.
    ///
    /// `done` runs exactly once, as soon as the last step proceeds or any
    /// step fails.
    pub fn run_with<F>(&self, ctx: &Context, input: T, done: F)
    where
        F: FnOnce(Result<T, WorkflowError>) + Send + 'static,
    {
        descend(Arc::clone(&self.steps), 0, ctx.clone(), input, Box::new(done));
    }

    /// Runs the chain and returns its terminal result.
    ///
    /// Fails with [`WorkflowError::Incomplete`] if a step kept its
    /// continuation past its own return.
    pub fn run(&self, ctx: &Context, input: T) -> Result<T, WorkflowError> {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        self.run_with(ctx, input, move |outcome| {
            *lock(&sink) = Some(outcome);
        });
        let outcome = lock(&slot).take();
        outcome.unwrap_or(Err(WorkflowError::Incomplete))
    }
}

fn descend<T: Send + 'static>(
    steps: Arc<[Box<dyn CallbackStep<T>>]>,
    step_index: usize,
    ctx: Context,
    input: T,
    done: Resume<T>,
) {
    let Some(step) = steps.get(step_index) else {
        done(Ok(input));
        return;
    };

    let step_name = step.name();
    debug!(step = %step_name, step_index, "Invoking callback step");

    let rest = Arc::clone(&steps);
    let next_ctx = ctx.clone();
    let completed = step_name.clone();
    let next = Continuation::new(
        step_name,
        Box::new(move |outcome| match outcome {
            Ok(value) => {
                info!("Step '{}' completed successfully", completed);
                descend(rest, step_index + 1, next_ctx, value, done);
            }
            Err(e) => {
                warn!("Step '{}' failed: {}", completed, e);
                done(Err(e));
            }
        }),
    );

    step.call(&ctx, input, next);
}

/// Builder for [`CallbackWorkflow`]. Steps run in the order they are added.
pub struct CallbackWorkflowBuilder<T> {
    steps: Vec<Box<dyn CallbackStep<T>>>,
}

impl<T> Default for CallbackWorkflowBuilder<T> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<T: Send + 'static> CallbackWorkflowBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step instance.
    pub fn add_step<S: CallbackStep<T> + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends a default-constructed step
    pub fn add<S: CallbackStep<T> + Default + 'static>(self) -> Self {
        self.add_step(S::default())
    }

    pub fn build(self) -> Result<CallbackWorkflow<T>, WorkflowError> {
        if self.steps.is_empty() {
            return Err(WorkflowError::Configuration(
                "Workflow must contain at least one step".to_string(),
            ));
        }

        Ok(CallbackWorkflow {
            steps: Arc::from(self.steps),
        })
    }
}
