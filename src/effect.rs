//! Detached, delayed side effects.

use crate::context::lock;
use crate::error::WorkflowError;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

type EffectBody = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work that runs once after a fixed delay.
///
/// Nothing it does flows back into the workflow that scheduled it.
pub struct DetachedEffect {
    label: String,
    delay: Duration,
    body: EffectBody,
}

impl fmt::Debug for DetachedEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetachedEffect")
            .field("label", &self.label)
            .field("delay", &self.delay)
            .finish()
    }
}

impl DetachedEffect {
    pub fn new(
        label: impl Into<String>,
        delay: Duration,
        body: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            delay,
            body: Box::new(body),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Hosts detached effects on the current tokio runtime.
///
/// Scheduling never blocks and returns nothing to wait on. Steps hand an
/// effect over and move on. [`drain`](EffectScheduler::drain) exists for
/// process shutdown, so a binary can let outstanding timers fire before
/// it exits; workflows never call it.
///
/// ```
/// use junban::{Console, DetachedEffect, EffectScheduler};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), junban::WorkflowError> {
/// let console = Console::capture();
/// let scheduler = EffectScheduler::new();
/// let sink = console.clone();
/// scheduler.schedule(DetachedEffect::new("ping", Duration::from_millis(100), move || {
///     sink.emit("pong");
/// }))?;
///
/// assert!(console.lines().is_empty());
/// scheduler.drain().await;
/// assert_eq!(console.lines(), vec!["pong".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct EffectScheduler {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl fmt::Debug for EffectScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the effect's timer and returns immediately.
    ///
    /// The deadline is fixed now, measured from this call. Fails only when
    /// no tokio runtime is running on this thread.
    pub fn schedule(&self, effect: DetachedEffect) -> Result<(), WorkflowError> {
        let runtime = Handle::try_current().map_err(|e| WorkflowError::Scheduling {
            label: effect.label.clone(),
            details: e.to_string(),
        })?;

        let DetachedEffect { label, delay, body } = effect;
        let deadline = Instant::now() + delay;
        debug!(effect = %label, delay_ms = delay.as_millis() as u64, "Scheduling detached effect");

        let handle = runtime.spawn(async move {
            sleep_until(deadline).await;
            debug!(effect = %label, "Running detached effect");
            body();
        });

        let mut handles = lock(&self.handles);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        Ok(())
    }

    /// Number of effects that have not finished yet.
    pub fn pending(&self) -> usize {
        lock(&self.handles)
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Waits until every scheduled effect, including ones scheduled while
    /// draining, has run.
    pub async fn drain(&self) {
        loop {
            let batch = mem::take(&mut *lock(&self.handles));
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                if let Err(e) = handle.await {
                    warn!("Detached effect did not complete: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Console;

    fn emitting(console: &Console, line: &'static str, delay: Duration) -> DetachedEffect {
        let sink = console.clone();
        DetachedEffect::new(line, delay, move || sink.emit(line))
    }

    #[tokio::test(start_paused = true)]
    async fn test_effect_fires_after_delay() {
        let console = Console::capture();
        let scheduler = EffectScheduler::new();
        scheduler
            .schedule(emitting(&console, "cooked", Duration::from_millis(3000)))
            .unwrap();

        tokio::time::advance(Duration::from_millis(2999)).await;
        tokio::task::yield_now().await;
        assert!(console.lines().is_empty());
        assert_eq!(scheduler.pending(), 1);

        scheduler.drain().await;
        assert_eq!(console.lines(), vec!["cooked".to_string()]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_effects_fire_by_deadline() {
        let console = Console::capture();
        let scheduler = EffectScheduler::new();
        scheduler
            .schedule(emitting(&console, "slow", Duration::from_millis(200)))
            .unwrap();
        scheduler
            .schedule(emitting(&console, "fast", Duration::from_millis(100)))
            .unwrap();

        scheduler.drain().await;
        assert_eq!(
            console.lines(),
            vec!["fast".to_string(), "slow".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_picks_up_nested_effects() {
        let console = Console::capture();
        let scheduler = EffectScheduler::new();
        let inner_scheduler = scheduler.clone();
        let inner_console = console.clone();
        scheduler
            .schedule(DetachedEffect::new(
                "outer",
                Duration::from_millis(10),
                move || {
                    inner_console.emit("outer");
                    let sink = inner_console.clone();
                    let _ = inner_scheduler.schedule(DetachedEffect::new(
                        "inner",
                        Duration::from_millis(10),
                        move || sink.emit("inner"),
                    ));
                },
            ))
            .unwrap();

        scheduler.drain().await;
        assert_eq!(
            console.lines(),
            vec!["outer".to_string(), "inner".to_string()]
        );
    }

    #[test]
    fn test_schedule_without_runtime_fails() {
        let console = Console::capture();
        let scheduler = EffectScheduler::new();
        let result = scheduler.schedule(emitting(&console, "orphan", Duration::from_millis(1)));
        match result {
            Err(WorkflowError::Scheduling { label, .. }) => assert_eq!(label, "orphan"),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_effect_accessors() {
        let effect = DetachedEffect::new("cooking", Duration::from_secs(3), || {});
        assert_eq!(effect.label(), "cooking");
        assert_eq!(effect.delay(), Duration::from_secs(3));
    }
}
