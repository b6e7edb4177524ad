use crate::{Context, Step, StepName, WorkflowError};
use std::fmt;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Where a run stands.
///
/// A run moves `Pending → Running(0) → … → Running(n-1)` and ends in
/// exactly one of `Succeeded` or `Failed`. Terminal states have no exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running {
        /// Index of the step currently executing
        step_index: usize,
    },
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (*self, next) {
            (RunState::Pending, RunState::Running { step_index }) => step_index == 0,
            (RunState::Running { step_index: current }, RunState::Running { step_index }) => {
                step_index == current + 1
            }
            (RunState::Running { .. }, RunState::Succeeded | RunState::Failed) => true,
            _ => false,
        }
    }
}

/// What a single run did and how it ended.
#[derive(Debug)]
pub struct RunReport<T> {
    pub outcome: Result<T, WorkflowError>,
    /// Steps that were invoked, in order
    pub executed: Vec<StepName>,
    /// Every state the run passed through, starting with `Pending`
    pub transitions: Vec<RunState>,
}

impl<T> RunReport<T> {
    pub fn state(&self) -> RunState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(RunState::Pending)
    }

    pub fn into_result(self) -> Result<T, WorkflowError> {
        self.outcome
    }
}

struct RunTracker {
    transitions: Vec<RunState>,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            transitions: vec![RunState::Pending],
        }
    }

    fn advance(&mut self, next: RunState) {
        let current = self
            .transitions
            .last()
            .copied()
            .unwrap_or(RunState::Pending);
        debug_assert!(
            current.can_transition_to(next),
            "illegal run transition {:?} -> {:?}",
            current,
            next
        );
        debug!("Run state {:?} -> {:?}", current, next);
        self.transitions.push(next);
    }
}

/// An ordered list of steps threading one value from first to last.
///
/// Each step's output becomes the next step's input. The first failure ends
/// the run; remaining steps are skipped and the error is returned unchanged.
/// Detached effects scheduled along the way are left running.
pub struct Workflow<T> {
    steps: Vec<Box<dyn Step<T>>>,
}

impl<T> fmt::Debug for Workflow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("steps", &self.step_names())
            .finish()
    }
}

impl<T> Workflow<T> {
    pub fn builder() -> WorkflowBuilder<T> {
        WorkflowBuilder::new()
    }

    /// Names of the registered steps, in execution order.
    pub fn step_names(&self) -> Vec<StepName> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl<T: Send + 'static> Workflow<T> {
    /// Runs every step in order and returns the final output.
    pub async fn run(&self, ctx: &Context, input: T) -> Result<T, WorkflowError> {
        self.execute(ctx, input).await.into_result()
    }

    /// Runs every step in order and reports how the run went.
    pub async fn execute(&self, ctx: &Context, input: T) -> RunReport<T> {
        let mut tracker = RunTracker::new();
        let mut executed = Vec::with_capacity(self.steps.len());
        let mut value = input;

        for (step_index, step) in self.steps.iter().enumerate() {
            tracker.advance(RunState::Running { step_index });
            let step_name = step.name();
            executed.push(step_name.clone());

            let outcome = match step.config().timeout {
                Some(limit) => match timeout(limit, step.execute(ctx, value)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(WorkflowError::Timeout {
                        step_name: step_name.clone(),
                    }),
                },
                None => step.execute(ctx, value).await,
            };

            match outcome {
                Ok(next) => {
                    info!("Step '{}' completed successfully", step_name);
                    value = next;
                }
                Err(e) => {
                    warn!("Step '{}' failed: {}", step_name, e);
                    tracker.advance(RunState::Failed);
                    return RunReport {
                        outcome: Err(e),
                        executed,
                        transitions: tracker.transitions,
                    };
                }
            }
        }

        tracker.advance(RunState::Succeeded);
        RunReport {
            outcome: Ok(value),
            executed,
            transitions: tracker.transitions,
        }
    }
}

/// Builder for [`Workflow`]. Steps run in the order they are added.
pub struct WorkflowBuilder<T> {
    steps: Vec<Box<dyn Step<T>>>,
}

impl<T> Default for WorkflowBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkflowBuilder<T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn build(self) -> Result<Workflow<T>, WorkflowError> {
        if self.steps.is_empty() {
            return Err(WorkflowError::Configuration(
                "Workflow must contain at least one step".to_string(),
            ));
        }

        Ok(Workflow { steps: self.steps })
    }
}

impl<T: Send + 'static> WorkflowBuilder<T> {
    /// Appends a step instance.
    pub fn add_step<S: Step<T> + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends a default-constructed step
    pub fn add<S: Step<T> + Default + 'static>(self) -> Self {
        self.add_step(S::default())
    }
}
