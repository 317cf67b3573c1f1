/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Server-wide configuration inputs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix under which address-book mailboxes live, e.g.
    /// `user/jdoe/#addressbooks/Default`.
    pub addressbook_prefix: String,
    /// Appended to bare usernames when building the `x-href` URL and the
    /// `Message-ID` of staged vCard messages.
    pub default_domain: Option<String>,
    /// Used to build `Message-ID`s for staged vCard bodies.
    pub hostname: String,
    /// Whether JSON responses are pretty-printed.
    pub json_pretty_print: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addressbook_prefix: "#addressbooks".to_string(),
            default_domain: None,
            hostname: "localhost".to_string(),
            json_pretty_print: false,
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_addressbook_prefix() {
        let cfg = Config::default();
        assert_eq!(cfg.addressbook_prefix, "#addressbooks");
        assert!(!cfg.json_pretty_print);
    }

    #[test]
    fn parses_partial_toml() {
        let cfg = Config::from_toml("hostname = \"mail.example.com\"\n").unwrap();
        assert_eq!(cfg.hostname, "mail.example.com");
        assert_eq!(cfg.addressbook_prefix, "#addressbooks");
    }
}
