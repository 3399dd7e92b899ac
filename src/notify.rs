use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Success,
    Info,
    Error,
}

impl Severity {
    fn label(&self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// User-facing outcome of one mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    pub(crate) fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Success)
    }

    pub(crate) fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Info)
    }

    pub(crate) fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Error)
    }

    fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.label(), self.title)?;
        if !self.description.is_empty() {
            write!(f, ": {}", self.description)?;
        }
        Ok(())
    }
}

pub(crate) trait NotificationSink {
    fn notify(&mut self, notice: Notice);
}

/// Prints notices; errors go to stderr.
#[derive(Debug, Default)]
pub(crate) struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn notify(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Error => eprintln!("{notice}"),
            Severity::Success | Severity::Info => println!("{notice}"),
        }
    }
}

/// Keeps every notice in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub notices: Vec<Notice>,
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_display() {
        let n = Notice::success("Expense created", "Rent, 13 rows");
        assert_eq!(n.to_string(), "[ok] Expense created: Rent, 13 rows");
        let bare = Notice::info("Already up to date", "");
        assert_eq!(bare.to_string(), "[info] Already up to date");
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::default();
        sink.notify(Notice::info("a", ""));
        sink.notify(Notice::error("b", "failed"));
        assert_eq!(sink.notices.len(), 2);
        assert_eq!(sink.notices[1].severity, Severity::Error);
    }
}
