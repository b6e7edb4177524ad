//! The three-step order workflow: take, process, complete.
//!
//! Each step is implemented once and exposed through all three control
//! surfaces: the [`Workflow`] engine, the continuation-passing
//! [`CallbackWorkflow`], and a [`Deferred`] chain.
//!
//! With the default settings every rendition emits, in order:
//!
//! ```text
//! Take order for customer 1
//! Processing order for customer 1
//! Order process for customer 1
//! complete order for customer 1
//! cooking completed customer 1      (3 seconds after processing)
//! ```

use crate::callback::{CallbackStep, CallbackWorkflow, Continuation};
use crate::context::Context;
use crate::deferred::Deferred;
use crate::effect::DetachedEffect;
use crate::error::WorkflowError;
use crate::step::{Step, StepName};
use crate::workflow::Workflow;
use crate::define_step;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How long the kitchen takes once an order is processed.
pub const DEFAULT_COOKING_DELAY: Duration = Duration::from_millis(3000);

/// Identifies the customer an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CustomerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSettings {
    pub customer: CustomerId,
    pub cooking_delay: Duration,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            customer: CustomerId::new("customer 1"),
            cooking_delay: DEFAULT_COOKING_DELAY,
        }
    }
}

/// Which control surface drives the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Style {
    /// Deferred values chained with a single failure handler
    #[default]
    Chain,
    /// Nested continuations
    Callback,
    /// The step engine
    Workflow,
}

define_step!(TakeOrder);
define_step!(CompleteOrder);

impl TakeOrder {
    fn perform(&self, ctx: &Context, customer: CustomerId) -> Result<CustomerId, WorkflowError> {
        if customer.as_str().trim().is_empty() {
            return Err(WorkflowError::rejected(
                Self::NAME,
                "Customer identifier must not be empty",
            ));
        }
        ctx.console().emit(format!("Take order for {}", customer));
        Ok(customer)
    }
}

/// Processes the order and hands it to the kitchen.
///
/// Cooking is a detached effect: the step proceeds as soon as cooking is
/// scheduled, and `cooking completed …` shows up `cooking_delay` later.
#[derive(Debug, Clone)]
pub struct ProcessOrder {
    cooking_delay: Duration,
}

impl Default for ProcessOrder {
    fn default() -> Self {
        Self::new(DEFAULT_COOKING_DELAY)
    }
}

impl ProcessOrder {
    pub const NAME: &'static str = "ProcessOrder";

    pub fn new(cooking_delay: Duration) -> Self {
        Self { cooking_delay }
    }

    fn perform(&self, ctx: &Context, customer: CustomerId) -> Result<CustomerId, WorkflowError> {
        ctx.console()
            .emit(format!("Processing order for {}", customer));
        ctx.console().emit(format!("Order process for {}", customer));

        let kitchen = ctx.console().clone();
        let cooked = customer.clone();
        ctx.effects().schedule(DetachedEffect::new(
            "cooking",
            self.cooking_delay,
            move || kitchen.emit(format!("cooking completed {}", cooked)),
        ))?;

        Ok(customer)
    }
}

impl CompleteOrder {
    fn perform(&self, ctx: &Context, customer: CustomerId) -> Result<CustomerId, WorkflowError> {
        ctx.console().emit(format!("complete order for {}", customer));
        Ok(customer)
    }
}

macro_rules! order_step {
    ($step:ty) => {
        #[async_trait]
        impl Step<CustomerId> for $step {
            async fn execute(
                &self,
                ctx: &Context,
                input: CustomerId,
            ) -> Result<CustomerId, WorkflowError> {
                self.perform(ctx, input)
            }

            fn name(&self) -> StepName {
                StepName::new(<$step>::NAME)
            }
        }

        impl CallbackStep<CustomerId> for $step {
            fn call(&self, ctx: &Context, input: CustomerId, next: Continuation<CustomerId>) {
                next.complete(self.perform(ctx, input));
            }

            fn name(&self) -> StepName {
                StepName::new(<$step>::NAME)
            }
        }
    };
}

order_step!(TakeOrder);
order_step!(ProcessOrder);
order_step!(CompleteOrder);

/// The order workflow on the step engine.
pub fn workflow(settings: &OrderSettings) -> Result<Workflow<CustomerId>, WorkflowError> {
    Workflow::<CustomerId>::builder()
        .add::<TakeOrder>()
        .add_step(ProcessOrder::new(settings.cooking_delay))
        .add::<CompleteOrder>()
        .build()
}

/// The order workflow as nested continuations.
pub fn callback_workflow(
    settings: &OrderSettings,
) -> Result<CallbackWorkflow<CustomerId>, WorkflowError> {
    CallbackWorkflow::<CustomerId>::builder()
        .add::<TakeOrder>()
        .add_step(ProcessOrder::new(settings.cooking_delay))
        .add::<CompleteOrder>()
        .build()
}

/// The order workflow as a chain of deferred values.
///
/// Taking the order happens immediately; the later stages run as the chain
/// is awaited.
pub fn chain(ctx: &Context, settings: &OrderSettings, customer: CustomerId) -> Deferred<CustomerId> {
    let process = ProcessOrder::new(settings.cooking_delay);
    let process_ctx = ctx.clone();
    let complete_ctx = ctx.clone();

    Deferred::settle(|| TakeOrder.perform(ctx, customer))
        .and_then(move |customer| Deferred::settle(|| process.perform(&process_ctx, customer)))
        .and_then(move |customer| {
            Deferred::settle(|| CompleteOrder.perform(&complete_ctx, customer))
        })
}

/// Runs the order workflow in `style`, emitting the failure message if a
/// step rejects.
pub async fn report(
    ctx: &Context,
    settings: &OrderSettings,
    style: Style,
) -> Result<CustomerId, WorkflowError> {
    let customer = settings.customer.clone();
    let outcome = match style {
        Style::Chain => chain(ctx, settings, customer).await,
        Style::Callback => callback_workflow(settings)?.run(ctx, customer),
        Style::Workflow => workflow(settings)?.run(ctx, customer).await,
    };

    if let Err(e) = &outcome {
        ctx.console().emit(e.to_string());
    }
    outcome
}
