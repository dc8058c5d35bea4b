//! Host console receiving `console.*` events from the page.

use crate::event::ConsoleLevel;
use crate::inspect::{format_console, InspectOptions};
use crate::result::MochifyResult;
use crate::shadow::Shadow;
use std::io::{self, Write};

/// Destination for page console output
pub trait HostConsole {
    /// Print reconstructed arguments at `level`
    fn write(&mut self, level: ConsoleLevel, args: &[Shadow]) -> MochifyResult<()>;
}

impl<C: HostConsole + ?Sized> HostConsole for Box<C> {
    fn write(&mut self, level: ConsoleLevel, args: &[Shadow]) -> MochifyResult<()> {
        (**self).write(level, args)
    }
}

/// Prints debug/log/info to stdout and warn/error to stderr
#[derive(Debug, Clone, Default)]
pub struct StdConsole {
    options: InspectOptions,
}

impl StdConsole {
    /// Create a console with default inspection options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable colors in inspected values
    #[must_use]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.options = self.options.with_colors(colors);
        self
    }
}

impl HostConsole for StdConsole {
    fn write(&mut self, level: ConsoleLevel, args: &[Shadow]) -> MochifyResult<()> {
        let line = format_console(args, &self.options);
        if level.is_stderr() {
            let mut err = io::stderr().lock();
            writeln!(err, "{line}")?;
        } else {
            let mut out = io::stdout().lock();
            writeln!(out, "{line}")?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Keeps formatted lines in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingConsole {
    options: InspectOptions,
    lines: Vec<(ConsoleLevel, String)>,
}

impl RecordingConsole {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatted lines in arrival order
    #[must_use]
    pub fn lines(&self) -> &[(ConsoleLevel, String)] {
        &self.lines
    }

    /// Formatted text of every line at `level`
    #[must_use]
    pub fn at(&self, level: ConsoleLevel) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl HostConsole for RecordingConsole {
    fn write(&mut self, level: ConsoleLevel, args: &[Shadow]) -> MochifyResult<()> {
        self.lines.push((level, format_console(args, &self.options)));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_console_formats_arguments() {
        let mut console = RecordingConsole::new();
        console
            .write(
                ConsoleLevel::Log,
                &[Shadow::string("%d items"), Shadow::Number(3.0), Shadow::Bool(true)],
            )
            .unwrap();
        console
            .write(ConsoleLevel::Error, &[Shadow::string("oops")])
            .unwrap();
        assert_eq!(console.at(ConsoleLevel::Log), vec!["3 items true"]);
        assert_eq!(console.at(ConsoleLevel::Error), vec!["oops"]);
        assert_eq!(console.lines().len(), 2);
    }

    #[test]
    fn test_std_console_writes() {
        let mut console = StdConsole::new().with_colors(false);
        assert!(console.write(ConsoleLevel::Info, &[Shadow::Null]).is_ok());
    }
}
