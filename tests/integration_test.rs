use async_trait::async_trait;
use junban::meeting;
use junban::order::{self, CustomerId, OrderSettings, Style};
use junban::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const ORDER_LINES: [&str; 4] = [
    "Take order for customer 1",
    "Processing order for customer 1",
    "Order process for customer 1",
    "complete order for customer 1",
];
const COOKED: &str = "cooking completed customer 1";

fn lines(ctx: &Context) -> Vec<String> {
    ctx.console().lines()
}

#[tokio::test(start_paused = true)]
async fn test_every_style_prints_the_order_contract() {
    for style in [Style::Chain, Style::Callback, Style::Workflow] {
        let ctx = Context::capture();
        let customer = assert_ok!(order::report(&ctx, &OrderSettings::default(), style).await);
        assert_eq!(customer, CustomerId::new("customer 1"));
        assert_eq!(lines(&ctx), ORDER_LINES, "style {:?}", style);

        ctx.effects().drain().await;
        let mut expected: Vec<&str> = ORDER_LINES.to_vec();
        expected.push(COOKED);
        assert_eq!(lines(&ctx), expected, "style {:?}", style);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cooking_waits_for_its_delay() {
    let ctx = Context::capture();
    let workflow = assert_ok!(order::workflow(&OrderSettings::default()));
    assert_ok!(workflow.run(&ctx, CustomerId::new("customer 1")).await);

    tokio::time::advance(Duration::from_millis(2999)).await;
    tokio::task::yield_now().await;
    assert_eq!(lines(&ctx), ORDER_LINES);
    assert_eq!(ctx.effects().pending(), 1);

    tokio::time::advance(Duration::from_millis(1)).await;
    ctx.effects().drain().await;
    assert_eq!(lines(&ctx).last().map(String::as_str), Some(COOKED));
}

#[derive(Debug, Clone)]
struct Recorder {
    label: &'static str,
    seen: Arc<Mutex<Vec<u32>>>,
}

#[async_trait]
impl Step<u32> for Recorder {
    async fn execute(&self, _ctx: &Context, input: u32) -> Result<u32, WorkflowError> {
        self.seen.lock().unwrap().push(input);
        Ok(input * 10 + 1)
    }

    fn name(&self) -> StepName {
        StepName::new(self.label)
    }
}

impl CallbackStep<u32> for Recorder {
    fn call(&self, _ctx: &Context, input: u32, next: Continuation<u32>) {
        self.seen.lock().unwrap().push(input);
        next.proceed(input * 10 + 1);
    }

    fn name(&self) -> StepName {
        StepName::new(self.label)
    }
}

fn recorders(seen: &Arc<Mutex<Vec<u32>>>) -> Vec<Recorder> {
    ["first", "second", "third"]
        .into_iter()
        .map(|label| Recorder {
            label,
            seen: Arc::clone(seen),
        })
        .collect()
}

#[tokio::test]
async fn test_each_step_receives_previous_output() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let workflow = recorders(&seen)
        .into_iter()
        .fold(Workflow::<u32>::builder(), |builder, step| {
            builder.add_step(step)
        })
        .build()
        .unwrap();
    let result = workflow.run(&Context::capture(), 2).await;
    assert_eq!(result, Ok(2111));
    assert_eq!(*seen.lock().unwrap(), vec![2, 21, 211]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let callbacks = recorders(&seen)
        .into_iter()
        .fold(CallbackWorkflow::<u32>::builder(), |builder, step| {
            builder.add_step(step)
        })
        .build()
        .unwrap();
    assert_eq!(callbacks.run(&Context::capture(), 2), Ok(2111));
    assert_eq!(*seen.lock().unwrap(), vec![2, 21, 211]);
}

define_step!(CookThenReject);
define_step!(NeverRuns);

#[async_trait]
impl Step<String> for CookThenReject {
    async fn execute(&self, ctx: &Context, input: String) -> Result<String, WorkflowError> {
        let console = ctx.console().clone();
        ctx.effects().schedule(DetachedEffect::new(
            "late",
            Duration::from_millis(50),
            move || console.emit("effect after failure"),
        ))?;
        Err(WorkflowError::rejected(
            Self::NAME,
            format!("cannot finish {}", input),
        ))
    }
}

#[async_trait]
impl Step<String> for NeverRuns {
    async fn execute(&self, ctx: &Context, input: String) -> Result<String, WorkflowError> {
        ctx.console().emit("never");
        Ok(input)
    }
}

#[tokio::test(start_paused = true)]
async fn test_effects_survive_a_failed_run() {
    let workflow = Workflow::<String>::builder()
        .add::<CookThenReject>()
        .add::<NeverRuns>()
        .build()
        .unwrap();

    let ctx = Context::capture();
    let report = workflow.execute(&ctx, "soup".to_string()).await;
    assert_eq!(report.state(), RunState::Failed);
    assert_eq!(report.executed, vec!["CookThenReject"]);
    let error = assert_err!(report.into_result());
    assert_eq!(error.to_string(), "cannot finish soup");
    assert!(lines(&ctx).is_empty());

    ctx.effects().drain().await;
    assert_eq!(lines(&ctx), vec!["effect after failure"]);
}

#[tokio::test]
async fn test_deferred_failure_handler_catches_any_stage() {
    let ctx = Context::capture();
    let handler_ctx = ctx.clone();
    let skipped_ctx = ctx.clone();

    let outcome = Deferred::resolve(1u32)
        .and_then(|n| Deferred::resolve(n + 1))
        .and_then(|n| {
            Deferred::<u32>::reject(WorkflowError::rejected("Third", format!("stopped at {}", n)))
        })
        .map(move |n| {
            skipped_ctx.console().emit("skipped");
            n
        })
        .recover(move |e| {
            handler_ctx.console().emit(e.to_string());
            0
        })
        .await;

    assert_eq!(outcome, Ok(0));
    assert_eq!(lines(&ctx), vec!["stopped at 2"]);
}

#[tokio::test]
async fn test_meeting_outcomes() {
    let ctx = Context::capture();
    let scheduled = assert_ok!(
        meeting::report(&ctx, &meeting::MeetingSettings::default(), meeting::Format::Table).await
    );
    assert_eq!(
        scheduled,
        meeting::MeetingDescriptor {
            name: "Project Meeting".to_string(),
            place: "Google Meet".to_string(),
            time: "10.00 AM".to_string(),
        }
    );
    assert_eq!(lines(&ctx).len(), 7);

    let ctx = Context::capture();
    let busy = meeting::MeetingSettings { has_meeting: true };
    let error = assert_err!(meeting::report(&ctx, &busy, meeting::Format::Table).await);
    assert_eq!(error.to_string(), "Meeting already scheduled");
    assert_eq!(lines(&ctx), vec!["Meeting already scheduled"]);
}

#[tokio::test(start_paused = true)]
async fn test_runs_are_independent() {
    let settings = OrderSettings::default();
    let workflow = assert_ok!(order::callback_workflow(&settings));

    let first = Context::capture();
    let second = Context::capture();
    assert_ok!(workflow.run(&first, CustomerId::new("customer 1")));
    assert_ok!(workflow.run(&second, CustomerId::new("customer 2")));

    first.effects().drain().await;
    second.effects().drain().await;
    assert_eq!(lines(&first).len(), 5);
    assert_eq!(lines(&second).len(), 5);
    assert!(lines(&first).iter().all(|line| line.ends_with("customer 1")));
    assert!(lines(&second).iter().all(|line| line.ends_with("customer 2")));
}
