//! Commonly used types and traits

pub use crate::callback::{CallbackStep, CallbackWorkflow, Continuation};
pub use crate::context::{Console, Context};
pub use crate::deferred::Deferred;
pub use crate::define_step;
pub use crate::effect::DetachedEffect;
pub use crate::error::WorkflowError;
pub use crate::step::{Step, StepConfig, StepName};
pub use crate::workflow::{RunState, Workflow};
