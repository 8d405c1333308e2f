//! Diagnostic emitters.
//!
//! The host layer renders collected diagnostics through an emitter. Only
//! the human-readable terminal emitter lives here; the wire format toward
//! editors is the caller's concern.

use std::io::{self, Write};

use crate::{FormattedDiagnostic, Severity};

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m";
    pub const WARNING: &str = "\x1b[1;33m";
    pub const MESSAGE: &str = "\x1b[1;36m";
    pub const RESET: &str = "\x1b[0m";
}

/// Returns "s" for plural counts, "" for singular.
#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Trait for emitting formatted diagnostics.
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &FormattedDiagnostic);

    fn emit_all(&mut self, diagnostics: &[FormattedDiagnostic]) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize);

    fn flush(&mut self);
}

/// Human-readable output with optional ANSI colors.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, use_colors: bool) -> Self {
        TerminalEmitter { writer, use_colors }
    }

    fn severity_color(&self, severity: Severity) -> &'static str {
        if !self.use_colors {
            return "";
        }
        match severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
            Severity::Message => colors::MESSAGE,
        }
    }

    fn reset(&self) -> &'static str {
        if self.use_colors {
            colors::RESET
        } else {
            ""
        }
    }
}

impl TerminalEmitter<io::Stderr> {
    pub fn stderr(use_colors: bool) -> Self {
        TerminalEmitter::new(io::stderr(), use_colors)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &FormattedDiagnostic) {
        let color = self.severity_color(diagnostic.severity);
        let reset = self.reset();
        let _ = writeln!(self.writer, "{color}{}{reset}", diagnostic.to_line());
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count == 0 && warning_count == 0 {
            return;
        }
        let mut parts = Vec::new();
        if error_count > 0 {
            parts.push(format!("{error_count} error{}", plural_s(error_count)));
        }
        if warning_count > 0 {
            parts.push(format!(
                "{warning_count} warning{}",
                plural_s(warning_count)
            ));
        }
        let _ = writeln!(self.writer, "{}", parts.join(", "));
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;
    use pretty_assertions::assert_eq;

    fn sample() -> FormattedDiagnostic {
        FormattedDiagnostic {
            filename: "a.grammar".to_string(),
            position: Position::new(0, 0),
            length: 1,
            severity: Severity::Error,
            code: 1007,
            message: "Digit expected.".to_string(),
        }
    }

    #[test]
    fn plain_emit() {
        let mut buffer = Vec::new();
        {
            let mut emitter = TerminalEmitter::new(&mut buffer, false);
            emitter.emit(&sample());
            emitter.emit_summary(1, 0);
            emitter.flush();
        }
        let out = String::from_utf8(buffer).unwrap_or_default();
        assert_eq!(
            out,
            "a.grammar(1,1): error GM1007: Digit expected.\n1 error\n"
        );
    }

    #[test]
    fn colored_emit_wraps_line() {
        let mut buffer = Vec::new();
        {
            let mut emitter = TerminalEmitter::new(&mut buffer, true);
            emitter.emit(&sample());
        }
        let out = String::from_utf8(buffer).unwrap_or_default();
        assert!(out.starts_with("\x1b[1;31m"));
        assert!(out.contains("GM1007"));
    }

    #[test]
    fn empty_summary_is_silent() {
        let mut buffer = Vec::new();
        {
            let mut emitter = TerminalEmitter::new(&mut buffer, false);
            emitter.emit_summary(0, 0);
        }
        assert!(buffer.is_empty());
    }
}
