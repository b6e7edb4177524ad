use crate::effect::EffectScheduler;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Locks `mutex`, recovering the guard if a panicking holder poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Where steps write their observable output lines.
///
/// `Console::stdout()` prints each line as it is emitted.
/// `Console::capture()` records lines in memory instead, which is what
/// tests assert against. Clones share the same destination.
///
/// ```
/// use junban::Console;
///
/// let console = Console::capture();
/// console.emit("Take order for customer 1");
/// assert_eq!(console.lines(), vec!["Take order for customer 1".to_string()]);
/// ```
#[derive(Clone, Default)]
pub struct Console {
    transcript: Option<Arc<Mutex<Vec<String>>>>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = if self.transcript.is_some() {
            "capture"
        } else {
            "stdout"
        };
        f.debug_struct("Console").field("target", &target).finish()
    }
}

impl Console {
    /// A console that prints to standard output.
    pub fn stdout() -> Self {
        Self { transcript: None }
    }

    /// A console that records lines in memory.
    pub fn capture() -> Self {
        Self {
            transcript: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Writes one output line.
    pub fn emit(&self, line: impl Into<String>) {
        let line = line.into();
        match &self.transcript {
            Some(transcript) => lock(transcript).push(line),
            None => println!("{}", line),
        }
    }

    /// Lines recorded so far. Always empty for a stdout console.
    pub fn lines(&self) -> Vec<String> {
        self.transcript
            .as_ref()
            .map(|transcript| lock(transcript).clone())
            .unwrap_or_default()
    }
}

/// Handle lent to every step of a run.
///
/// Bundles the [`Console`] steps write to and the [`EffectScheduler`]
/// that hosts their detached effects. Cloning is cheap; clones share both.
#[derive(Clone)]
pub struct Context {
    console: Console,
    effects: EffectScheduler,
    started_at: Instant,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("console", &self.console)
            .field("pending_effects", &self.effects.pending())
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Console::stdout())
    }
}

impl Context {
    /// Creates a context writing to `console` with a fresh scheduler.
    pub fn new(console: Console) -> Self {
        Self {
            console,
            effects: EffectScheduler::new(),
            started_at: Instant::now(),
        }
    }

    /// Shorthand for a context over [`Console::capture`].
    pub fn capture() -> Self {
        Self::new(Console::capture())
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn effects(&self) -> &EffectScheduler {
        &self.effects
    }

    /// Returns the time elapsed since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_in_order() {
        let console = Console::capture();
        console.emit("first");
        console.emit(String::from("second"));
        assert_eq!(
            console.lines(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn test_clones_share_transcript() {
        let ctx = Context::capture();
        let clone = ctx.clone();
        clone.console().emit("from clone");
        assert_eq!(ctx.console().lines(), vec!["from clone".to_string()]);
    }

    #[test]
    fn test_stdout_console_has_no_transcript() {
        let console = Console::stdout();
        console.emit("printed");
        assert!(console.lines().is_empty());
    }

    #[test]
    fn test_context_elapsed_time() {
        let ctx = Context::capture();
        std::thread::sleep(Duration::from_millis(10));
        assert!(ctx.elapsed() >= Duration::from_millis(10));
    }
}
