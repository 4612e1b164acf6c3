//! Accumulating warning sink.
//!
//! Every recoverable data problem found while reading a file is recorded here
//! so that a caller can audit data quality after the fact. Messages are also
//! forwarded to `tracing`: at `warn` level when echoing is enabled, otherwise
//! at `debug` level.

/// Ordered list of warnings raised while reading a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    echo: bool,
    entries: Vec<String>,
}

impl Messages {
    /// Creates an empty sink.
    ///
    /// When `echo` is set each warning is also logged at `warn` level.
    #[must_use]
    pub const fn new(echo: bool) -> Self {
        Self {
            echo,
            entries: Vec::new(),
        }
    }

    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.echo {
            tracing::warn!("{message}");
        } else {
            tracing::debug!("{message}");
        }
        self.entries.push(message);
    }

    /// Records each warning in turn.
    pub fn extend<I>(&mut self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for message in messages {
            self.warn(message);
        }
    }

    /// The recorded warnings, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The number of recorded warnings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no warnings were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_accumulate_in_order() {
        let mut messages = Messages::new(false);
        messages.warn("first");
        messages.extend(["second", "third"]);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages.entries(), ["first", "second", "third"]);
    }

    #[test]
    fn new_sink_is_empty() {
        assert!(Messages::new(true).is_empty());
    }
}
