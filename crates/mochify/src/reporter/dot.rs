//! Dot matrix reporter.

use super::{write_epilogue, Color, Palette, Reporter};
use crate::event::{RunnerEvent, Speed, TestRecord};
use crate::result::MochifyResult;
use crate::runner::Stats;
use crate::shadow::Shadow;
use std::io::{self, Write};

const WIDTH: usize = 60;

/// One character per test: `.` pass, `,` pending, `!` failure
#[derive(Debug)]
pub struct DotReporter<W: Write = io::Stdout> {
    out: W,
    palette: Palette,
    count: usize,
    failures: Vec<(TestRecord, Shadow)>,
}

impl Default for DotReporter<io::Stdout> {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DotReporter<W> {
    /// Create a reporter writing to `out`, without colors
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            palette: Palette::new(false),
            count: 0,
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

    fn dot(&mut self, color: Color, mark: &str) -> MochifyResult<()> {
        if self.count % WIDTH == 0 {
            write!(self.out, "\n  ")?;
        }
        self.count += 1;
        write!(self.out, "{}", self.palette.paint(color, mark))?;
        Ok(())
    }
}

impl<W: Write> Reporter for DotReporter<W> {
    fn on_event(&mut self, event: &RunnerEvent, stats: &Stats) -> MochifyResult<()> {
        match event {
            RunnerEvent::Start(_) => writeln!(self.out)?,
            RunnerEvent::TestPending(_) => self.dot(Color::Pending, ",")?,
            RunnerEvent::TestPass(test) => {
                let color = match test.speed {
                    Some(Speed::Slow) => Color::BrightYellow,
                    Some(Speed::Medium) => Color::Medium,
                    Some(Speed::Fast) | None => Color::Fast,
                };
                self.dot(color, ".")?;
            }
            RunnerEvent::TestFail(test, err) => {
                self.failures.push((test.clone(), err.clone()));
                self.dot(Color::Fail, "!")?;
            }
            RunnerEvent::End(_) => {
                writeln!(self.out)?;
                write_epilogue(&mut self.out, self.palette, stats, &self.failures)?;
            }
            RunnerEvent::SuiteBegin(_)
            | RunnerEvent::SuiteEnd(_)
            | RunnerEvent::DelayBegin(_)
            | RunnerEvent::DelayEnd(_)
            | RunnerEvent::TestEnd(_) => {}
        }
        self.out.flush()?;
        Ok(())
    }
}
