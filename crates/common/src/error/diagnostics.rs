use std::{borrow::Cow, fmt, panic::Location};

/// Error text plus the call-site that produced it.
///
/// Build one with [`DiagnosticMessage::new`] or the [`diag!`] macro. Both
/// record the caller's file and line so an error surfaced at the top of the
/// job still points at the code that raised it.
#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    message: Cow<'static, str>,
    location: &'static Location<'static>,
}

impl DiagnosticMessage {
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// `format!`-style constructor for [`DiagnosticMessage`].
#[macro_export]
macro_rules! diag {
    ($msg:literal $(,)?) => {
        $crate::error::diagnostics::DiagnosticMessage::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::diagnostics::DiagnosticMessage::new(format!($fmt, $($arg)*))
    };
}
