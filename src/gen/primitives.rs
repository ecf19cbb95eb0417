//! Smallest building blocks of the emitted markup.
//!
//! None of these keep state; brace balance across calls is the caller's job.

use std::fmt::{self, Write};

use crate::data::{Label, ReferenceMode};

#[cfg(windows)]
pub const LINE_BREAK: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_BREAK: &str = "\n";

/// Ends a line so that whitespace at the start of the next one can't leak into the output
pub fn write_line_terminator<W: Write + ?Sized>(output: &mut W) -> fmt::Result {
    output.write_char('%')?;
    output.write_str(LINE_BREAK)
}

/// Closes a command argument and ends the line
pub fn write_command_close<W: Write + ?Sized>(output: &mut W) -> fmt::Result {
    output.write_char('}')?;
    write_line_terminator(output)
}

pub fn write_comment_line<W: Write + ?Sized>(text: &str, output: &mut W) -> fmt::Result {
    output.write_str("% ")?;
    // a comment ends at the first line break, so there must not be one inside
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            output.write_char(' ')?;
        }
        output.write_str(line)?;
    }
    output.write_str(LINE_BREAK)
}

/// Writes `\label{..}` for a non-empty label id.
///
/// With `enforce_location`, a `\phantomsection` anchor goes first; constructs without a
/// counter of their own (emulated sections) need it, or the label attaches to whatever was
/// numbered before. Returns whether anything was written.
pub fn write_label<W: Write + ?Sized>(
    label: Option<&Label>,
    output: &mut W,
    enforce_location: bool,
) -> Result<bool, fmt::Error> {
    let Some(label) = label.filter(|l| !l.id().is_empty()) else {
        return Ok(false);
    };
    if enforce_location {
        output.write_str("\\phantomsection")?;
    }
    write!(output, "\\label{{{}}}", label.id())?;
    Ok(true)
}

/// Refers to a label. It has to be written by [`write_label`] somewhere in the same document,
/// which only the LaTeX compiler can check.
pub fn write_reference<W: Write + ?Sized>(
    label: &Label,
    mode: ReferenceMode,
    output: &mut W,
) -> fmt::Result {
    let command = match mode {
        ReferenceMode::Number => "ref",
        ReferenceMode::Page => "pageref",
        ReferenceMode::Auto => "autoref",
    };
    write!(output, "\\{command}{{{}}}", label.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_stays_on_one_line() {
        // arrange
        let mut output = String::new();

        // act
        write_comment_line("first\nsecond\r\nthird", &mut output).unwrap();

        // assert
        assert_eq!(output, format!("% first second third{LINE_BREAK}"));
    }

    #[test]
    fn command_close() {
        let mut output = String::new();
        write_command_close(&mut output).unwrap();
        assert_eq!(output, format!("}}%{LINE_BREAK}"));
    }

    #[test]
    fn label_plain() {
        // arrange
        let mut output = String::new();
        let label = Label::new("tab:results");

        // act
        let written = write_label(Some(&label), &mut output, false).unwrap();

        // assert
        assert!(written);
        assert_eq!(output, r"\label{tab:results}");
    }

    #[test]
    fn label_enforced() {
        // arrange
        let mut output = String::new();
        let label = Label::new("sec:deep");

        // act
        let written = write_label(Some(&label), &mut output, true).unwrap();

        // assert
        assert!(written);
        assert_eq!(output, r"\phantomsection\label{sec:deep}");
    }

    #[test]
    fn label_missing_or_empty() {
        let mut output = String::new();
        assert!(!write_label(None, &mut output, true).unwrap());
        assert!(!write_label(Some(&Label::new("")), &mut output, true).unwrap());
        assert!(output.is_empty());
    }

    #[test]
    fn references() {
        let label = Label::new("fig:a");
        let mut output = String::new();
        write_reference(&label, ReferenceMode::Number, &mut output).unwrap();
        write_reference(&label, ReferenceMode::Page, &mut output).unwrap();
        write_reference(&label, ReferenceMode::Auto, &mut output).unwrap();
        assert_eq!(output, r"\ref{fig:a}\pageref{fig:a}\autoref{fig:a}");
    }
}
