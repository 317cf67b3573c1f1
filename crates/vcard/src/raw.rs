/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Adapter between `calcard`'s typed vCard AST and a flat, name-indexed
//! property list. Everything that touches `calcard` directly lives here;
//! `contact.rs`/`group.rs` never import it, so the mapper logic reads as a
//! plain list of property nodes, the way a tokenizer-and-serializer layer
//! is supposed to look to its callers.

use calcard::vcard::{
    VCard, VCardEntry, VCardParameter, VCardParameterName, VCardParameterValue, VCardProperty, VCardValue,
};

/// One property line: `NAME;PARAM=val;...:value` (or a multi-value line
/// such as `N` / `ADR` / `ORG`, folded into `Component`).
#[derive(Debug, Clone)]
pub struct RawProperty {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: RawValue,
}

#[derive(Debug, Clone)]
pub enum RawValue {
    Text(String),
    Component(Vec<String>),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(v) => Some(v),
            RawValue::Component(parts) => parts.first().map(String::as_str),
        }
    }

    pub fn as_component(&self) -> Vec<String> {
        match self {
            RawValue::Text(v) => vec![v.clone()],
            RawValue::Component(parts) => parts.clone(),
        }
    }
}

impl RawProperty {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        RawProperty {
            name: name.into(),
            params: Vec::new(),
            value: RawValue::Text(value.into()),
        }
    }

    pub fn component(name: impl Into<String>, parts: Vec<String>) -> Self {
        RawProperty {
            name: name.into(),
            params: Vec::new(),
            value: RawValue::Component(parts),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

/// A parsed vCard as a flat list of property nodes, in source order.
#[derive(Debug, Clone, Default)]
pub struct RawCard {
    pub properties: Vec<RawProperty>,
}

impl RawCard {
    pub fn new() -> Self {
        RawCard::default()
    }

    pub fn parse(text: &str) -> trc::Result<Self> {
        let card = VCard::parse(text.to_string())
            .map_err(|e| trc::Error::parse(format!("invalid vCard: {e}")))?;
        Ok(RawCard::from_calcard(&card))
    }

    pub fn serialize(&self) -> String {
        self.to_calcard().to_string()
    }

    pub fn get(&self, name: &str) -> Option<&RawProperty> {
        self.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawProperty> {
        self.properties.iter().filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn remove_all(&mut self, name: &str) {
        self.properties.retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    pub fn push(&mut self, property: RawProperty) {
        self.properties.push(property);
    }

    fn from_calcard(card: &VCard) -> Self {
        let properties = card
            .entries
            .iter()
            .map(RawCard::entry_to_property)
            .collect();
        RawCard { properties }
    }

    fn entry_to_property(entry: &VCardEntry) -> RawProperty {
        let name = property_name(&entry.name);
        let params = entry
            .params
            .iter()
            .filter_map(|p| match &p.value {
                VCardParameterValue::Text(v) => Some((parameter_name(p), v.clone())),
                _ => None,
            })
            .collect();
        let value = if entry.values.len() > 1 {
            RawValue::Component(
                entry
                    .values
                    .iter()
                    .map(|v| v.as_text().unwrap_or_default().to_string())
                    .collect(),
            )
        } else {
            RawValue::Text(
                entry
                    .values
                    .first()
                    .and_then(VCardValue::as_text)
                    .unwrap_or_default()
                    .to_string(),
            )
        };
        RawProperty { name, params, value }
    }

    fn to_calcard(&self) -> VCard {
        let mut card = VCard::default();
        for prop in &self.properties {
            let mut entry = VCardEntry::new(calcard_property(&prop.name));
            entry.values = match &prop.value {
                RawValue::Text(v) => vec![VCardValue::Text(v.clone())],
                RawValue::Component(parts) => {
                    parts.iter().cloned().map(VCardValue::Text).collect()
                }
            };
            for (key, value) in &prop.params {
                entry.params.push(VCardParameter {
                    name: calcard_parameter_name(key),
                    value: VCardParameterValue::Text(value.clone()),
                });
            }
            card.entries.push(entry);
        }
        card
    }
}

/// Maps the subset of `VCardProperty` variants this mapper cares about to
/// their wire name; anything else (including vendor `X-` extensions)
/// round-trips through `VCardProperty::Other`.
fn property_name(property: &VCardProperty) -> String {
    match property {
        VCardProperty::Version => "VERSION".into(),
        VCardProperty::Uid => "UID".into(),
        VCardProperty::Fn => "FN".into(),
        VCardProperty::N => "N".into(),
        VCardProperty::Nickname => "NICKNAME".into(),
        VCardProperty::Bday => "BDAY".into(),
        VCardProperty::Anniversary => "ANNIVERSARY".into(),
        VCardProperty::Org => "ORG".into(),
        VCardProperty::Title => "TITLE".into(),
        VCardProperty::Email => "EMAIL".into(),
        VCardProperty::Tel => "TEL".into(),
        VCardProperty::Adr => "ADR".into(),
        VCardProperty::Note => "NOTE".into(),
        VCardProperty::Url => "URL".into(),
        VCardProperty::Impp => "IMPP".into(),
        VCardProperty::Kind => "KIND".into(),
        VCardProperty::Member => "MEMBER".into(),
        VCardProperty::Rev => "REV".into(),
        VCardProperty::Photo => "PHOTO".into(),
        VCardProperty::Socialprofile => "SOCIALPROFILE".into(),
        VCardProperty::Other(name) => name.to_uppercase(),
        other => format!("{other:?}").to_uppercase(),
    }
}

fn calcard_property(name: &str) -> VCardProperty {
    match name.to_ascii_uppercase().as_str() {
        "VERSION" => VCardProperty::Version,
        "UID" => VCardProperty::Uid,
        "FN" => VCardProperty::Fn,
        "N" => VCardProperty::N,
        "NICKNAME" => VCardProperty::Nickname,
        "BDAY" => VCardProperty::Bday,
        "ANNIVERSARY" => VCardProperty::Anniversary,
        "ORG" => VCardProperty::Org,
        "TITLE" => VCardProperty::Title,
        "EMAIL" => VCardProperty::Email,
        "TEL" => VCardProperty::Tel,
        "ADR" => VCardProperty::Adr,
        "NOTE" => VCardProperty::Note,
        "URL" => VCardProperty::Url,
        "IMPP" => VCardProperty::Impp,
        "KIND" => VCardProperty::Kind,
        "MEMBER" => VCardProperty::Member,
        "REV" => VCardProperty::Rev,
        "PHOTO" => VCardProperty::Photo,
        "SOCIALPROFILE" | "X-SOCIAL-PROFILE" => VCardProperty::Socialprofile,
        other => VCardProperty::Other(other.to_string()),
    }
}

/// Parameter-name extraction kept separate from [`property_name`] since
/// `VCardParameter` has its own (unrelated) name enum in `calcard`. Debug-
/// formatting the enum would wrap vendor names as `OTHER("X-...")` instead
/// of the bare token, so every variant is named explicitly here, the same
/// way `property_name` does it.
fn parameter_name(param: &VCardParameter) -> String {
    match &param.name {
        VCardParameterName::Language => "LANGUAGE".into(),
        VCardParameterName::Value => "VALUE".into(),
        VCardParameterName::Pref => "PREF".into(),
        VCardParameterName::Altid => "ALTID".into(),
        VCardParameterName::Pid => "PID".into(),
        VCardParameterName::Type => "TYPE".into(),
        VCardParameterName::Mediatype => "MEDIATYPE".into(),
        VCardParameterName::Calscale => "CALSCALE".into(),
        VCardParameterName::SortAs => "SORT-AS".into(),
        VCardParameterName::Geo => "GEO".into(),
        VCardParameterName::Tz => "TZ".into(),
        VCardParameterName::Label => "LABEL".into(),
        VCardParameterName::Other(name) => name.to_uppercase(),
        other => format!("{other:?}").to_uppercase(),
    }
}

/// Maps a flat param key (including vendor `X-` tokens) to `calcard`'s
/// parameter-name enum. Kept separate from [`calcard_property`] — the two
/// enums are unrelated even though both fall back to an `Other(String)`.
fn calcard_parameter_name(name: &str) -> VCardParameterName {
    match name.to_ascii_uppercase().as_str() {
        "LANGUAGE" => VCardParameterName::Language,
        "VALUE" => VCardParameterName::Value,
        "PREF" => VCardParameterName::Pref,
        "ALTID" => VCardParameterName::Altid,
        "PID" => VCardParameterName::Pid,
        "TYPE" => VCardParameterName::Type,
        "MEDIATYPE" => VCardParameterName::Mediatype,
        "CALSCALE" => VCardParameterName::Calscale,
        "SORT-AS" => VCardParameterName::SortAs,
        "GEO" => VCardParameterName::Geo,
        "TZ" => VCardParameterName::Tz,
        "LABEL" => VCardParameterName::Label,
        other => VCardParameterName::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_minimal_card() {
        let text = "BEGIN:VCARD\r\nVERSION:3.0\r\nUID:11111111-1111-1111-1111-111111111111\r\nFN:Ada Lovelace\r\nEND:VCARD\r\n";
        let card = RawCard::parse(text).unwrap();
        assert_eq!(card.get("FN").unwrap().value.as_text(), Some("Ada Lovelace"));
        assert_eq!(
            card.get("UID").unwrap().value.as_text(),
            Some("11111111-1111-1111-1111-111111111111")
        );
    }

    #[test]
    fn serializes_a_built_card() {
        let mut card = RawCard::new();
        card.push(RawProperty::text("VERSION", "3.0"));
        card.push(RawProperty::text("UID", "u1"));
        card.push(RawProperty::text("FN", "Grace Hopper"));
        let text = card.serialize();
        assert!(text.contains("Grace Hopper"));
    }
}
