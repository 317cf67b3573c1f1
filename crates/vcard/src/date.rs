/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Partial-date codec for `BDAY`/`ANNIVERSARY`, reproducing the Apple/
//! Fastmail extension parameters that let a vCard omit the year, month, or
//! day of an otherwise-complete date.

use crate::raw::RawProperty;

/// A possibly-partial calendar date. A zero component means "omitted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartialDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

const SENTINEL_YEAR: u16 = 1604;

impl PartialDate {
    /// Parse a `BDAY`/`ANNIVERSARY` property's raw text and parameters,
    /// honoring `X-APPLE-OMIT-YEAR`, `X-FM-NO-MONTH`, `X-FM-NO-DAY`.
    /// Returns `None` if the value isn't a plain `YYYY-MM-DD` date (e.g. a
    /// free-text `BDAY` value, which this mapper doesn't round-trip).
    pub fn from_property(prop: &RawProperty) -> Option<Self> {
        let text = prop.value.as_text()?;
        let (year, month, day) = parse_ymd(text)?;
        if month > 12 || day > 31 {
            return None;
        }
        let year = if year == SENTINEL_YEAR || prop.has_param("X-APPLE-OMIT-YEAR") {
            0
        } else {
            year
        };
        let month = if prop.has_param("X-FM-NO-MONTH") { 0 } else { month };
        let day = if prop.has_param("X-FM-NO-DAY") { 0 } else { day };
        Some(PartialDate { year, month, day })
    }

    /// Render as the JMAP-facing string: `"0000-00-00"` when every
    /// component is zero (no date on file at all).
    pub fn to_jmap_string(self) -> String {
        if self.year == 0 && self.month == 0 && self.day == 0 {
            "0000-00-00".to_string()
        } else {
            format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
        }
    }

    /// Parse a JMAP-facing `YYYY-MM-DD` string. Rejects a year in `[1,
    /// 1604]` (that range is reserved for the zero-date sentinel).
    pub fn from_jmap_string(text: &str) -> Option<Self> {
        let (year, month, day) = parse_ymd(text)?;
        if (1..=SENTINEL_YEAR).contains(&year) {
            return None;
        }
        if month > 12 || day > 31 {
            return None;
        }
        Some(PartialDate { year, month, day })
    }

    /// Build the `BDAY`/`ANNIVERSARY` property to write, rewriting an
    /// all-zero or partly-zero date to the `1604-01-01` sentinel plus the
    /// matching omit parameters.
    pub fn to_property(self, name: &str) -> RawProperty {
        let omit_year = self.year == 0;
        let omit_month = self.month == 0;
        let omit_day = self.day == 0;
        let year = if omit_year { SENTINEL_YEAR } else { self.year };
        let month = if omit_month { 1 } else { self.month };
        let day = if omit_day { 1 } else { self.day };

        let mut prop = RawProperty::text(name, format!("{year:04}-{month:02}-{day:02}"));
        if omit_year {
            prop = prop.with_param("X-APPLE-OMIT-YEAR", year.to_string());
        }
        if omit_month {
            prop = prop.with_param("X-FM-NO-MONTH", "1");
        }
        if omit_day {
            prop = prop.with_param("X-FM-NO-DAY", "1");
        }
        prop
    }
}

fn parse_ymd(text: &str) -> Option<(u16, u8, u8)> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let year = text.get(0..4)?.parse().ok()?;
    let month = text.get(5..7)?.parse().ok()?;
    let day = text.get(8..10)?.parse().ok()?;
    Some((year, month, day))
}
