//! Hierarchical reporter: one line per suite and test, then the epilogue.

use super::{write_epilogue, Color, Palette, Reporter};
use crate::event::{RunnerEvent, Speed, TestRecord};
use crate::result::MochifyResult;
use crate::runner::Stats;
use crate::shadow::{js_number, Shadow};
use std::io::{self, Write};

/// Indented suite/test listing
#[derive(Debug)]
pub struct SpecReporter<W: Write = io::Stdout> {
    out: W,
    palette: Palette,
    indents: usize,
    failures: Vec<(TestRecord, Shadow)>,
}

impl Default for SpecReporter<io::Stdout> {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> SpecReporter<W> {
    /// Create a reporter writing to `out`, without colors
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            palette: Palette::new(false),
            indents: 0,
            failures: Vec::new(),
        }
    }

    /// Enable or disable colors
    #[must_use]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.palette = Palette::new(colors);
        self
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn indent(&self) -> String {
        "  ".repeat(self.indents.saturating_sub(1))
    }
}

impl<W: Write> Reporter for SpecReporter<W> {
    fn on_event(&mut self, event: &RunnerEvent, stats: &Stats) -> MochifyResult<()> {
        let palette = self.palette;
        match event {
            RunnerEvent::Start(_) => writeln!(self.out)?,
            RunnerEvent::SuiteBegin(suite) => {
                self.indents += 1;
                writeln!(self.out, "{}{}", self.indent(), suite.title)?;
            }
            RunnerEvent::SuiteEnd(_) => {
                self.indents = self.indents.saturating_sub(1);
                if self.indents == 1 {
                    writeln!(self.out)?;
                }
            }
            RunnerEvent::TestPending(test) => {
                let line = format!("{}  - {}", self.indent(), test.title);
                writeln!(self.out, "{}", palette.paint(Color::Pending, &line))?;
            }
            RunnerEvent::TestPass(test) => {
                let mut line = format!(
                    "{}  {} {}",
                    self.indent(),
                    palette.paint(Color::Checkmark, "✓"),
                    palette.paint(Color::Pass, &test.title)
                );
                let speed = match test.speed {
                    Some(Speed::Medium) => Some(Color::Medium),
                    Some(Speed::Slow) => Some(Color::Slow),
                    Some(Speed::Fast) | None => None,
                };
                if let (Some(color), Some(duration)) = (speed, test.duration) {
                    line.push_str(&palette.paint(color, &format!(" ({}ms)", js_number(duration))));
                }
                writeln!(self.out, "{line}")?;
            }
            RunnerEvent::TestFail(test, err) => {
                self.failures.push((test.clone(), err.clone()));
                let line = format!("{}  {}) {}", self.indent(), self.failures.len(), test.title);
                writeln!(self.out, "{}", palette.paint(Color::Fail, &line))?;
            }
            RunnerEvent::End(_) => {
                write_epilogue(&mut self.out, palette, stats, &self.failures)?;
            }
            RunnerEvent::DelayBegin(_) | RunnerEvent::DelayEnd(_) | RunnerEvent::TestEnd(_) => {}
        }
        self.out.flush()?;
        Ok(())
    }
}
