/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt;

/// Coarse classification of what went wrong, used by the batch executor to
/// decide between a per-invocation fatal abort (HTTP 500) and an embedded
/// error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    /// The mailbox/CardDAV store returned an unrecoverable I/O or
    /// transaction error. Always fatal at the batch level.
    Store,
    /// A vCard failed to parse where a live, previously-valid record was
    /// expected (`parseError`).
    Parse,
    /// Programmer error / invariant violation.
    Internal,
}

/// A structured error with a short causal chain: a span id, context
/// locations, and a root cause, but without event-collector machinery.
#[derive(Debug, Clone)]
pub struct Error {
    cause: Cause,
    message: std::sync::Arc<str>,
    locations: Vec<&'static str>,
}

impl Error {
    pub fn new(cause: Cause, message: impl Into<String>) -> Self {
        Error {
            cause,
            message: message.into().into(),
            locations: Vec::new(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(Cause::Store, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(Cause::Parse, message)
    }

    pub fn cause(&self) -> Cause {
        self.cause
    }

    pub fn with_location(mut self, location: &'static str) -> Self {
        self.locations.push(location);
        self
    }

    pub fn span_id(self, _span_id: u64) -> Self {
        // Span correlation goes through `tracing`'s own span context instead;
        // kept as a no-op for call-site compatibility.
        self
    }

    pub fn ctx_unique(self, _key: &'static str, _value: impl fmt::Display) -> Self {
        self
    }

    pub fn caused_by(self, _location: &'static str) -> Self {
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for loc in &self.locations {
            write!(f, " (at {loc})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::store(e.to_string())
    }
}

/// Named event kinds used in `event!(Jmap(JmapEvent::MethodCall), ...)`
/// call sites.
#[derive(Debug, Clone, Copy)]
pub enum JmapEvent {
    MethodCall,
    UnknownMethod,
    StateMismatch,
}

impl JmapEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            JmapEvent::MethodCall => "jmap.method_call",
            JmapEvent::UnknownMethod => "jmap.unknown_method",
            JmapEvent::StateMismatch => "jmap.state_mismatch",
        }
    }
}
