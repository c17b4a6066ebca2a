use std::fmt;

/// One line of validator output.
///
/// The rendered text of these lines is the tool's user-facing contract, so the
/// markers and header decorations must not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `=== title ===`, always preceded by an empty line when rendered.
    Header(String),

    /// `✅ message`
    Success(String),

    /// `❌ message`
    Failure(String),

    /// Printed as-is. May span several lines.
    Text(String),

    /// An empty line.
    Blank,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(title) => write!(f, "=== {title} ==="),
            Self::Success(msg) => write!(f, "{} {msg}", marker(true)),
            Self::Failure(msg) => write!(f, "{} {msg}", marker(false)),
            Self::Text(text) => f.write_str(text),
            Self::Blank => Ok(()),
        }
    }
}

/// The pass/fail marker used throughout the output.
pub fn marker(passed: bool) -> &'static str {
    if passed { "✅" } else { "❌" }
}

/// Write `lines`, one per line, inserting the empty line that precedes every header.
pub(crate) fn write_lines(f: &mut fmt::Formatter<'_>, lines: &[Diagnostic]) -> fmt::Result {
    for line in lines {
        if matches!(line, Diagnostic::Header(_)) {
            writeln!(f)?;
        }
        writeln!(f, "{line}")?;
    }
    Ok(())
}

/// The result of one check: whether it passed, and everything it has to say about it.
///
/// Checks never return errors. Anything that goes wrong is recorded as a
/// [`Diagnostic::Failure`] and flips [`Self::passed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub lines: Vec<Diagnostic>,
}

impl CheckOutcome {
    /// A passing outcome that starts with the given section header.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            passed: true,
            lines: vec![Diagnostic::Header(title.into())],
        }
    }

    pub fn header(&mut self, title: impl Into<String>) {
        self.lines.push(Diagnostic::Header(title.into()));
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.lines.push(Diagnostic::Success(msg.into()));
    }

    pub fn text(&mut self, text: impl Into<String>) {
        self.lines.push(Diagnostic::Text(text.into()));
    }

    pub fn blank(&mut self) {
        self.lines.push(Diagnostic::Blank);
    }

    /// Record a failure and mark the whole check as failed.
    #[must_use]
    pub fn fail(mut self, msg: impl Into<String>) -> Self {
        self.lines.push(Diagnostic::Failure(msg.into()));
        self.passed = false;
        self
    }

    /// Iterate over the failure messages, without their marker.
    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Diagnostic::Failure(msg) => Some(msg.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_lines(f, &self.lines)
    }
}
