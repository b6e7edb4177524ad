//! Meeting scheduling: a single decision with one success and one failure.

use crate::context::{Console, Context};
use crate::deferred::Deferred;
use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Message of the rejection returned when a meeting already exists.
pub const ALREADY_SCHEDULED: &str = "Meeting already scheduled";

/// The meeting produced by a successful scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDescriptor {
    pub name: String,
    pub place: String,
    pub time: String,
}

impl MeetingDescriptor {
    pub fn project_meeting() -> Self {
        Self {
            name: "Project Meeting".to_string(),
            place: "Google Meet".to_string(),
            time: "10.00 AM".to_string(),
        }
    }

    /// Field names paired with their values, in declaration order.
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("name", self.name.as_str()),
            ("place", self.place.as_str()),
            ("time", self.time.as_str()),
        ]
    }

    /// Renders the descriptor as a bordered two-column table, one line per
    /// element of the returned vector.
    pub fn render_table(&self) -> Vec<String> {
        const INDEX: &str = "(index)";
        const VALUES: &str = "Values";

        let rows: Vec<(&str, String)> = self
            .fields()
            .iter()
            .map(|(key, value)| (*key, format!("'{}'", value)))
            .collect();

        let key_width = rows
            .iter()
            .map(|(key, _)| key.chars().count())
            .chain([INDEX.chars().count()])
            .max()
            .unwrap_or_default();
        let value_width = rows
            .iter()
            .map(|(_, value)| value.chars().count())
            .chain([VALUES.chars().count()])
            .max()
            .unwrap_or_default();

        let rule = |left: &str, middle: &str, right: &str| {
            format!(
                "{}{}{}{}{}",
                left,
                "─".repeat(key_width + 2),
                middle,
                "─".repeat(value_width + 2),
                right
            )
        };
        let row = |key: &str, value: &str| {
            format!(
                "│ {:<kw$} │ {:<vw$} │",
                key,
                value,
                kw = key_width,
                vw = value_width
            )
        };

        let mut lines = Vec::with_capacity(rows.len() + 4);
        lines.push(rule("┌", "┬", "┐"));
        lines.push(row(INDEX, VALUES));
        lines.push(rule("├", "┼", "┤"));
        for (key, value) in &rows {
            lines.push(row(*key, value.as_str()));
        }
        lines.push(rule("└", "┴", "┘"));
        lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeetingSettings {
    /// Whether a meeting is already on the calendar.
    pub has_meeting: bool,
}

/// How a scheduled meeting is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Table,
    Json,
}

/// Decides whether a meeting can be scheduled.
///
/// ```
/// use junban::meeting::{self, MeetingDescriptor, MeetingSettings};
///
/// # #[tokio::main]
/// # async fn main() {
/// let free = meeting::schedule(&MeetingSettings { has_meeting: false }).await;
/// assert_eq!(free, Ok(MeetingDescriptor::project_meeting()));
///
/// let busy = meeting::schedule(&MeetingSettings { has_meeting: true }).await;
/// assert_eq!(busy.unwrap_err().to_string(), "Meeting already scheduled");
/// # }
/// ```
pub fn schedule(settings: &MeetingSettings) -> Deferred<MeetingDescriptor> {
    let has_meeting = settings.has_meeting;
    Deferred::settle(move || {
        if has_meeting {
            Err(WorkflowError::rejected("ScheduleMeeting", ALREADY_SCHEDULED))
        } else {
            Ok(MeetingDescriptor::project_meeting())
        }
    })
}

fn render(console: &Console, meeting: &MeetingDescriptor, format: Format) {
    match format {
        Format::Table => {
            for line in meeting.render_table() {
                console.emit(line);
            }
        }
        Format::Json => match serde_json::to_string_pretty(meeting) {
            Ok(json) => json.lines().for_each(|line| console.emit(line)),
            Err(e) => warn!("Failed to serialize meeting: {}", e),
        },
    }
}

/// Schedules a meeting and prints the outcome: the meeting in `format` on
/// success, only the error message on failure.
pub async fn report(
    ctx: &Context,
    settings: &MeetingSettings,
    format: Format,
) -> Result<MeetingDescriptor, WorkflowError> {
    let console = ctx.console().clone();
    let outcome = schedule(settings)
        .map(move |meeting| {
            render(&console, &meeting, format);
            meeting
        })
        .await;

    if let Err(e) = &outcome {
        ctx.console().emit(e.to_string());
    }
    outcome
}
