//! Reporters consuming re-emitted runner events.
//!
//! ```text
//! Runner ──emit──► Reporter::on_event(event, stats)
//!                    ├── SpecReporter      indented titles + epilogue
//!                    ├── DotReporter       one character per test + epilogue
//!                    ├── JsonReporter      single JSON document at run end
//!                    └── RecordingReporter events kept in memory
//! ```

mod diff;
mod dot;
mod json;
mod spec;

pub use diff::unified_diff;
pub use dot::DotReporter;
pub use json::JsonReporter;
pub use spec::SpecReporter;

use crate::event::{RunnerEvent, TestRecord};
use crate::inspect::{inspect, InspectOptions};
use crate::result::{MochifyError, MochifyResult};
use crate::runner::Stats;
use crate::shadow::{js_number, Shadow};
use console::Style;
use std::io::Write;
use std::str::FromStr;

/// Sink for runner events
pub trait Reporter {
    /// Handle one event; `stats` already includes it
    fn on_event(&mut self, event: &RunnerEvent, stats: &Stats) -> MochifyResult<()>;
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn on_event(&mut self, event: &RunnerEvent, stats: &Stats) -> MochifyResult<()> {
        (**self).on_event(event, stats)
    }
}

/// Built-in reporter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReporterKind {
    /// Hierarchical view
    #[default]
    Spec,
    /// Dot matrix
    Dot,
    /// JSON document
    Json,
}

impl ReporterKind {
    /// Reporter name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }

    /// Build the reporter writing to `out`
    pub fn build<W: Write + Send + 'static>(
        self,
        out: W,
        colors: bool,
    ) -> Box<dyn Reporter + Send> {
        match self {
            Self::Spec => Box::new(SpecReporter::new(out).with_colors(colors)),
            Self::Dot => Box::new(DotReporter::new(out).with_colors(colors)),
            Self::Json => Box::new(JsonReporter::new(out)),
        }
    }
}

impl FromStr for ReporterKind {
    type Err = MochifyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "spec" => Ok(Self::Spec),
            "dot" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            other => Err(MochifyError::protocol(format!("unknown reporter {other:?}"))),
        }
    }
}

/// Keeps every event, for tests and programmatic use
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Vec<RunnerEvent>,
}

impl RecordingReporter {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events in emission order
    #[must_use]
    pub fn events(&self) -> &[RunnerEvent] {
        &self.events
    }

    /// Wire names of the recorded events
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.events.iter().map(|e| e.name().to_string()).collect()
    }
}

impl Reporter for RecordingReporter {
    fn on_event(&mut self, event: &RunnerEvent, _stats: &Stats) -> MochifyResult<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Output color classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Pass,
    Fail,
    BrightPass,
    BrightYellow,
    ErrorMessage,
    ErrorStack,
    Checkmark,
    Fast,
    Medium,
    Slow,
    Green,
    Light,
    Pending,
    DiffAdded,
    DiffRemoved,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Palette {
    enabled: bool,
}

impl Palette {
    pub(crate) const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub(crate) fn paint(self, color: Color, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let style = Style::new().force_styling(true);
        let style = match color {
            Color::Pass | Color::ErrorStack | Color::Fast | Color::Light => style.black().bright(),
            Color::Fail | Color::ErrorMessage | Color::Slow | Color::DiffRemoved => style.red(),
            Color::BrightPass => style.green().bright(),
            Color::BrightYellow => style.yellow().bright(),
            Color::Checkmark | Color::Green | Color::DiffAdded => style.green(),
            Color::Medium => style.yellow(),
            Color::Pending => style.cyan(),
        };
        style.apply_to(text).to_string()
    }
}

/// Short duration rendering: `25ms`, `2s`, `1m`
pub(crate) fn milliseconds(ms: f64) -> String {
    const SECOND: f64 = 1000.0;
    const MINUTE: f64 = SECOND * 60.0;
    const HOUR: f64 = MINUTE * 60.0;
    const DAY: f64 = HOUR * 24.0;
    let abs = ms.abs();
    if abs >= DAY {
        format!("{}d", js_number((ms / DAY).round()))
    } else if abs >= HOUR {
        format!("{}h", js_number((ms / HOUR).round()))
    } else if abs >= MINUTE {
        format!("{}m", js_number((ms / MINUTE).round()))
    } else if abs >= SECOND {
        format!("{}s", js_number((ms / SECOND).round()))
    } else {
        format!("{}ms", js_number(ms))
    }
}

/// Failure summary shared by the spec and dot epilogues
pub(crate) fn write_epilogue(
    out: &mut dyn Write,
    palette: Palette,
    stats: &Stats,
    failures: &[(TestRecord, Shadow)],
) -> MochifyResult<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}{}{}",
        palette.paint(Color::BrightPass, " "),
        palette.paint(Color::Green, &format!(" {} passing", stats.passes)),
        palette.paint(
            Color::Light,
            &format!(" ({})", milliseconds(stats.duration.unwrap_or(0.0)))
        )
    )?;
    if stats.pending > 0 {
        writeln!(
            out,
            "{}{}",
            palette.paint(Color::Pending, " "),
            palette.paint(Color::Pending, &format!(" {} pending", stats.pending))
        )?;
    }
    if stats.failures > 0 {
        writeln!(
            out,
            "{}",
            palette.paint(Color::Fail, &format!("  {} failing", stats.failures))
        )?;
        writeln!(out)?;
        for (index, (test, err)) in failures.iter().enumerate() {
            write_failure(out, palette, index + 1, test, err)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn title_block(test: &TestRecord) -> String {
    let path = test.title_path();
    if path.is_empty() {
        return test.full_title().to_string();
    }
    let mut title = String::new();
    for (index, part) in path.iter().enumerate() {
        if index != 0 {
            title.push_str("\n     ");
            title.push_str(&"  ".repeat(index));
        }
        title.push_str(part);
    }
    title
}

fn write_failure(
    out: &mut dyn Write,
    palette: Palette,
    number: usize,
    test: &TestRecord,
    err: &Shadow,
) -> MochifyResult<()> {
    let (message, stack) = match err {
        Shadow::Error(error) => (
            error.message.clone(),
            error.stack.clone().unwrap_or_else(|| error.message.clone()),
        ),
        other => {
            let text = other.to_js_string();
            (text.clone(), text)
        }
    };
    let (mut msg, mut stack) = match (!message.is_empty())
        .then(|| stack.find(&message))
        .flatten()
    {
        Some(index) => {
            let end = index + message.len();
            let rest = stack.get(end + 1..).unwrap_or_default().to_string();
            (stack[..end].to_string(), rest)
        }
        None => (message.clone(), stack),
    };
    if err.get("uncaught") == Some(&Shadow::Bool(true)) {
        msg = format!("Uncaught {msg}");
    }
    stack = stack
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    let title = title_block(test);

    if let Some((actual, expected)) = diff_operands(err) {
        let head = message
            .split_once(": expected")
            .filter(|(head, _)| !head.is_empty() && !head.contains(':'))
            .map_or_else(|| msg.clone(), |(head, _)| head.to_string());
        writeln!(out, "  {number}) {title}:")?;
        write!(out, "\n      {}", palette.paint(Color::ErrorMessage, &head))?;
        writeln!(out, "{}", unified_diff(&actual, &expected, palette.enabled))?;
        writeln!(out, "{}", palette.paint(Color::ErrorStack, &format!("\n{stack}")))?;
    } else {
        writeln!(out, "  {number}) {title}:")?;
        write!(out, "{}", palette.paint(Color::ErrorMessage, &format!("     {msg}")))?;
        writeln!(out, "{}", palette.paint(Color::ErrorStack, &format!("\n{stack}\n")))?;
    }
    Ok(())
}

/// `actual` and `expected` rendered for diffing, when a diff applies
fn diff_operands(err: &Shadow) -> Option<(String, String)> {
    if err.get("showDiff") == Some(&Shadow::Bool(false)) {
        return None;
    }
    let actual = err.get("actual")?;
    let expected = err.get("expected")?;
    if matches!(expected, Shadow::Undefined) || actual.to_string_tag() != expected.to_string_tag() {
        return None;
    }
    let options = InspectOptions::default().with_depth(None).with_break_length(1);
    let render = |value: &Shadow| match value {
        Shadow::String(s) => s.clone(),
        other => inspect(other, &options),
    };
    Some((render(actual), render(expected)))
}
