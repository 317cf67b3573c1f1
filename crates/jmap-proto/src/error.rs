/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt;

/// Per-invocation error codes, embedded as `["error", {"type": code}, tag]`
/// or inside a set response's `notCreated`/`notUpdated`/`notDestroyed` maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownMethod,
    StateMismatch,
    NotFound,
    MissingParameters,
    InvalidArguments,
    InvalidContactId,
    InvalidParameters,
    ParseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownMethod => "unknownMethod",
            ErrorCode::StateMismatch => "stateMismatch",
            ErrorCode::NotFound => "notFound",
            ErrorCode::MissingParameters => "missingParameters",
            ErrorCode::InvalidArguments => "invalidArguments",
            ErrorCode::InvalidContactId => "invalidContactId",
            ErrorCode::InvalidParameters => "invalidParameters",
            ErrorCode::ParseError => "parseError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_spelling() {
        assert_eq!(ErrorCode::InvalidContactId.as_str(), "invalidContactId");
        assert_eq!(ErrorCode::StateMismatch.to_string(), "stateMismatch");
    }
}
