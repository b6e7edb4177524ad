//! # Junban (順番)
//!
//! Sequential async workflows for Rust.
//!
//! "Junban" (順番) means "order" or "one's turn" in Japanese. Every step
//! waits its turn, receives what the previous step produced, and hands its
//! own output to the next.
//!
//! ## Features
//!
//! - **Two control surfaces**: continuation-passing steps
//!   ([`CallbackWorkflow`]) and deferred values ([`Deferred`], [`Workflow`]),
//!   with the same ordering and failure semantics
//! - **Detached effects**: steps can schedule delayed work that the run never
//!   waits for ([`EffectScheduler`])
//! - **Short-circuiting**: the first failing step ends the run, and its error
//!   is returned unchanged
//! - **Run tracking**: [`RunReport`] records executed steps and every
//!   [`RunState`] transition
//!
//! ## Quick Start
//!
//! ```rust
//! use junban::prelude::*;
//! use async_trait::async_trait;
//!
//! define_step!(Greet);
//! define_step!(Sign);
//!
//! #[async_trait]
//! impl Step<String> for Greet {
//!     async fn execute(&self, ctx: &Context, input: String) -> Result<String, WorkflowError> {
//!         ctx.console().emit(format!("Hello, {}", input));
//!         Ok(format!("Hello, {}", input))
//!     }
//! }
//!
//! #[async_trait]
//! impl Step<String> for Sign {
//!     async fn execute(&self, _ctx: &Context, input: String) -> Result<String, WorkflowError> {
//!         Ok(format!("{} -- Junban", input))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let workflow = Workflow::<String>::builder()
//!     .add::<Greet>()
//!     .add::<Sign>()
//!     .build()
//!     .expect("valid workflow");
//!
//! let ctx = Context::capture();
//! let letter = workflow.run(&ctx, "Tsumugi".to_string()).await;
//!
//! assert_eq!(letter, Ok("Hello, Tsumugi -- Junban".to_string()));
//! assert_eq!(ctx.console().lines(), vec!["Hello, Tsumugi".to_string()]);
//! # }
//! ```
//!
//! ## Detached Effects
//!
//! ```rust
//! use junban::order::{self, OrderSettings};
//! use junban::Context;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let ctx = Context::capture();
//! let settings = OrderSettings {
//!     cooking_delay: Duration::from_millis(200),
//!     ..OrderSettings::default()
//! };
//!
//! let callbacks = order::callback_workflow(&settings).expect("valid workflow");
//! callbacks.run(&ctx, settings.customer.clone()).expect("order completes");
//! assert_eq!(ctx.console().lines().len(), 4);
//!
//! // the workflow is done; cooking still fires later
//! ctx.effects().drain().await;
//! assert_eq!(
//!     ctx.console().lines().last().map(String::as_str),
//!     Some("cooking completed customer 1")
//! );
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use junban::meeting::{self, MeetingSettings};
//! use junban::WorkflowError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! match meeting::schedule(&MeetingSettings { has_meeting: true }).await {
//!     Ok(meeting) => println!("{} at {}", meeting.name, meeting.time),
//!     Err(WorkflowError::Rejected { message, .. }) => assert_eq!(message, "Meeting already scheduled"),
//!     Err(other) => eprintln!("Error: {}", other),
//! }
//! # }
//! ```

mod callback;
mod context;
mod deferred;
mod effect;
mod error;
mod step;
mod workflow;

pub mod meeting;
pub mod order;
pub mod prelude;

pub use callback::{CallbackStep, CallbackWorkflow, CallbackWorkflowBuilder, Continuation};
pub use context::{Console, Context};
pub use deferred::Deferred;
pub use effect::{DetachedEffect, EffectScheduler};
pub use error::WorkflowError;
pub use step::{Step, StepConfig, StepName};
pub use workflow::{RunReport, RunState, Workflow, WorkflowBuilder};

/// Macro to define a step with minimal boilerplate
///
/// This macro creates a step struct with:
/// - `const NAME: &'static str` - compile-time step name
/// - `Debug` derive
/// - `Default` implementation
///
/// # Example
///
/// ```rust
/// use junban::define_step;
///
/// define_step!(MyStep);
/// assert_eq!(MyStep::NAME, "MyStep");
/// ```
#[macro_export]
macro_rules! define_step {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name;

        impl $name {
            /// Step name as a compile-time constant
            #[allow(dead_code)]
            pub const NAME: &'static str = stringify!($name);
        }

        impl Default for $name {
            fn default() -> Self {
                Self
            }
        }
    };
}
