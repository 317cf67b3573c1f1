/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! JMAP contact object ↔ vCard property list, per the key table: `N`,
//! `ORG`, `EMAIL`, `TEL`, `ADR`, `IMPP`/`SOCIALPROFILE`, `BDAY`/
//! `ANNIVERSARY`, `NICKNAME`, `NOTE`. `isFlagged`/`x-importance` never touch
//! the vCard body — they're IMAP flag/annotation state the set engine
//! rewrites in place.

use crate::{
    date::PartialDate,
    raw::{RawCard, RawProperty},
};
use serde_json::{json, Map, Value};

/// The known IM service labels recognized on read (case-insensitive match
/// on the `IMPP` `X-SERVICE-TYPE` parameter).
const KNOWN_IM_LABELS: &[&str] = &[
    "AIM", "Facebook", "Flickr", "GaduGadu", "GitHub", "GoogleTalk", "ICQ", "Jabber", "LinkedIn",
    "MSN", "MySpace", "QQ", "Skype", "Twitter", "Yahoo",
];

/// Three-way mapper outcome: `Ok` means the vCard body changed and must be
/// re-serialized; `NoContent` means only `isFlagged`/`x-importance` were
/// touched, so the set engine can skip the re-append; `Err` carries the
/// JMAP error code to report.
pub enum MapResult {
    Ok(RawCard),
    NoContent,
    Err(&'static str),
}

/// Apply a JMAP contact update object onto `card` (freshly created, or the
/// parsed body of an existing record). Returns the mapper's three-way
/// outcome. `existing` is `None` for a create.
pub fn apply_jmap(card: &mut RawCard, update: &Map<String, Value>) -> MapResult {
    let mut touched_body = false;
    let mut name_or_nickname_touched = false;

    for (key, value) in update {
        match key.as_str() {
            "isFlagged" | "x-importance" => {
                // Handled by the caller against the message/annotation layer.
            }
            "prefix" | "firstName" | "lastName" | "suffix" => {
                set_name_position(card, key, value);
                touched_body = true;
                name_or_nickname_touched = true;
            }
            "nickname" => {
                set_text(card, "NICKNAME", value);
                touched_body = true;
                name_or_nickname_touched = true;
            }
            "birthday" => {
                if !set_date(card, "BDAY", value) {
                    return MapResult::Err("invalidParameters");
                }
                touched_body = true;
            }
            "anniversary" => {
                if !set_date(card, "ANNIVERSARY", value) {
                    return MapResult::Err("invalidParameters");
                }
                touched_body = true;
            }
            "company" | "department" | "jobTitle" => {
                set_org_position(card, key, value);
                touched_body = true;
            }
            "emails" => {
                if !set_emails(card, value) {
                    return MapResult::Err("invalidParameters");
                }
                touched_body = true;
            }
            "phones" => {
                if !set_phones(card, value) {
                    return MapResult::Err("invalidParameters");
                }
                touched_body = true;
            }
            "online" => {
                if !set_online(card, value) {
                    return MapResult::Err("invalidParameters");
                }
                touched_body = true;
            }
            "addresses" => {
                if !set_addresses(card, value) {
                    return MapResult::Err("invalidParameters");
                }
                touched_body = true;
            }
            "notes" => {
                set_text(card, "NOTE", value);
                touched_body = true;
            }
            "id" | "addressbookId" | "x-hasPhoto" => {
                // Read-only/derived; ignored on write.
            }
            _ => return MapResult::Err("invalidParameters"),
        }
    }

    if update
        .keys()
        .all(|k| matches!(k.as_str(), "isFlagged" | "x-importance"))
        && !update.is_empty()
    {
        return MapResult::NoContent;
    }

    if name_or_nickname_touched || card.get("FN").is_none() {
        recompute_fn(card);
    }

    MapResult::Ok(card.clone())
}

/// Force `FN` present, synthesizing it from `N`/`NICKNAME`/first email/
/// `"No Name"` if it's still missing. Used by the create path, since a
/// create whose update object only carries `isFlagged`/`x-importance`
/// returns [`MapResult::NoContent`] before `apply_jmap` ever reaches its
/// own `FN` check, yet the invariant that every contact has an `FN` still
/// applies to a freshly minted card.
pub fn ensure_fn(card: &mut RawCard) {
    if card.get("FN").is_none() {
        recompute_fn(card);
    }
}

/// Build the baseline vCard for a freshly-created contact: `VERSION:3.0`
/// plus `UID`, before `apply_jmap` lays in the rest.
pub fn new_card(uid: &str) -> RawCard {
    let mut card = RawCard::new();
    card.push(RawProperty::text("VERSION", "3.0"));
    card.push(RawProperty::text("UID", uid));
    card
}

/// Render a parsed vCard as the JMAP contact JSON object, the reverse of
/// [`apply_jmap`]. `properties` optionally restricts the emitted fields
/// (plus `id`/`addressbookId`, always present).
pub fn to_jmap(card: &RawCard, uid: &str, addressbook_id: &str, properties: Option<&[String]>) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(uid));
    obj.insert("addressbookId".into(), json!(addressbook_id));

    let wants = |field: &str| properties.is_none_or(|p| p.iter().any(|f| f == field));

    if wants("prefix") || wants("firstName") || wants("lastName") || wants("suffix") {
        let n = card.get("N");
        let parts = n.map(|p| p.value.as_component()).unwrap_or_default();
        if wants("lastName") {
            obj.insert("lastName".into(), json!(parts.get(0).cloned().unwrap_or_default()));
        }
        if wants("firstName") {
            obj.insert("firstName".into(), json!(parts.get(1).cloned().unwrap_or_default()));
        }
        if wants("prefix") {
            obj.insert("prefix".into(), json!(parts.get(3).cloned().unwrap_or_default()));
        }
        if wants("suffix") {
            obj.insert("suffix".into(), json!(parts.get(4).cloned().unwrap_or_default()));
        }
    }
    if wants("nickname") {
        obj.insert("nickname".into(), json!(text_of(card, "NICKNAME")));
    }
    if wants("birthday") {
        obj.insert("birthday".into(), json!(read_date(card, "BDAY")));
    }
    if wants("anniversary") {
        obj.insert("anniversary".into(), json!(read_date(card, "ANNIVERSARY")));
    }
    if wants("company") || wants("department") || wants("jobTitle") {
        let org = card.get("ORG");
        let parts = org.map(|p| p.value.as_component()).unwrap_or_default();
        if wants("company") {
            obj.insert("company".into(), json!(parts.get(0).cloned().unwrap_or_default()));
        }
        if wants("department") {
            obj.insert("department".into(), json!(parts.get(1).cloned().unwrap_or_default()));
        }
        if wants("jobTitle") {
            obj.insert("jobTitle".into(), json!(parts.get(2).cloned().unwrap_or_default()));
        }
    }
    if wants("emails") {
        obj.insert("emails".into(), json!(read_emails(card)));
    }
    if wants("phones") {
        obj.insert("phones".into(), json!(read_phones(card)));
    }
    if wants("online") {
        obj.insert("online".into(), json!(read_online(card)));
    }
    if wants("addresses") {
        obj.insert("addresses".into(), json!(read_addresses(card)));
    }
    if wants("notes") {
        obj.insert("notes".into(), json!(text_of(card, "NOTE")));
    }
    if wants("x-hasPhoto") {
        obj.insert("x-hasPhoto".into(), json!(card.get("PHOTO").is_some()));
    }

    Value::Object(obj)
}

fn text_of(card: &RawCard, name: &str) -> String {
    card.get(name)
        .and_then(|p| p.value.as_text())
        .unwrap_or_default()
        .to_string()
}

fn read_date(card: &RawCard, name: &str) -> String {
    card.get(name)
        .and_then(PartialDate::from_property)
        .unwrap_or_default()
        .to_jmap_string()
}

fn set_text(card: &mut RawCard, name: &str, value: &Value) {
    card.remove_all(name);
    if let Some(text) = value.as_str() {
        if !text.is_empty() {
            card.push(RawProperty::text(name, text));
        }
    }
}

fn set_date(card: &mut RawCard, name: &str, value: &Value) -> bool {
    let Some(text) = value.as_str() else {
        return false;
    };
    card.remove_all(name);
    match PartialDate::from_jmap_string(text) {
        Some(date) => {
            card.push(date.to_property(name));
            true
        }
        None => false,
    }
}

fn set_name_position(card: &mut RawCard, jmap_key: &str, value: &Value) {
    let Some(text) = value.as_str() else { return };
    let mut parts = card
        .get("N")
        .map(|p| p.value.as_component())
        .unwrap_or_default();
    parts.resize(5, String::new());
    let idx = match jmap_key {
        "lastName" => 0,
        "firstName" => 1,
        "suffix" => 4,
        "prefix" => 3,
        _ => return,
    };
    parts[idx] = text.to_string();
    card.remove_all("N");
    card.push(RawProperty::component("N", parts));
}

fn set_org_position(card: &mut RawCard, jmap_key: &str, value: &Value) {
    let Some(text) = value.as_str() else { return };
    let mut parts = card
        .get("ORG")
        .map(|p| p.value.as_component())
        .unwrap_or_default();
    parts.resize(3, String::new());
    let idx = match jmap_key {
        "company" => 0,
        "department" => 1,
        "jobTitle" => 2,
        _ => return,
    };
    parts[idx] = text.to_string();
    card.remove_all("ORG");
    card.push(RawProperty::component("ORG", parts));
}

fn set_emails(card: &mut RawCard, value: &Value) -> bool {
    let Some(entries) = value.as_array() else {
        return false;
    };
    card.remove_all("EMAIL");
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            return false;
        };
        let Some(addr) = obj.get("value").and_then(Value::as_str) else {
            return false;
        };
        let mut prop = RawProperty::text("EMAIL", addr);
        if let Some(kind) = obj.get("type").and_then(Value::as_str) {
            match kind {
                "personal" => prop = prop.with_param("type", "home"),
                "other" => {}
                other => prop = prop.with_param("type", other),
            }
        }
        if obj.get("isDefault").and_then(Value::as_bool).unwrap_or(false) {
            prop = prop.with_param("type", "pref");
        }
        if let Some(label) = obj.get("label").and_then(Value::as_str) {
            prop = prop.with_param("label", label);
        }
        card.push(prop);
    }
    true
}

fn read_emails(card: &RawCard) -> Vec<Value> {
    let mut seen_default = false;
    let mut out: Vec<Value> = card
        .get_all("EMAIL")
        .map(|prop| {
            let mut types = prop.params.iter().filter(|(k, _)| k.eq_ignore_ascii_case("type")).map(|(_, v)| v.as_str());
            let is_default = types.clone().any(|t| t.eq_ignore_ascii_case("pref"));
            if is_default {
                seen_default = true;
            }
            let kind = types
                .find(|t| !t.eq_ignore_ascii_case("pref"))
                .map(|t| if t.eq_ignore_ascii_case("home") { "personal" } else { t })
                .unwrap_or("other");
            json!({
                "value": prop.value.as_text().unwrap_or_default(),
                "type": kind,
                "label": prop.param("label"),
                "isDefault": is_default,
            })
        })
        .collect();
    if !seen_default {
        if let Some(first) = out.first_mut() {
            first["isDefault"] = json!(true);
        }
    }
    out
}

fn set_phones(card: &mut RawCard, value: &Value) -> bool {
    let Some(entries) = value.as_array() else {
        return false;
    };
    card.remove_all("TEL");
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            return false;
        };
        let Some(val) = obj.get("value").and_then(Value::as_str) else {
            return false;
        };
        let mut prop = RawProperty::text("TEL", val);
        if let Some(kind) = obj.get("type").and_then(Value::as_str) {
            match kind {
                "mobile" => prop = prop.with_param("type", "cell"),
                "other" => {}
                other => prop = prop.with_param("type", other),
            }
        }
        if let Some(label) = obj.get("label").and_then(Value::as_str) {
            prop = prop.with_param("label", label);
        }
        card.push(prop);
    }
    true
}

fn read_phones(card: &RawCard) -> Vec<Value> {
    card.get_all("TEL")
        .map(|prop| {
            let kind = prop
                .param("type")
                .map(|t| if t.eq_ignore_ascii_case("cell") { "mobile" } else { t })
                .unwrap_or("other");
            json!({
                "value": prop.value.as_text().unwrap_or_default(),
                "type": kind,
                "label": prop.param("label"),
            })
        })
        .collect()
}

fn set_online(card: &mut RawCard, value: &Value) -> bool {
    let Some(entries) = value.as_array() else {
        return false;
    };
    card.remove_all("URL");
    card.remove_all("IMPP");
    card.remove_all("SOCIALPROFILE");
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            return false;
        };
        let Some(val) = obj.get("value").and_then(Value::as_str) else {
            return false;
        };
        let kind = obj.get("type").and_then(Value::as_str).unwrap_or("uri");
        let label = obj.get("label").and_then(Value::as_str);
        match kind {
            "uri" => card.push(RawProperty::text("URL", val)),
            "username" => {
                let is_known_im = label
                    .map(|l| KNOWN_IM_LABELS.iter().any(|k| k.eq_ignore_ascii_case(l)))
                    .unwrap_or(false);
                if is_known_im {
                    let mut prop = RawProperty::text("IMPP", val);
                    prop = prop.with_param("X-SERVICE-TYPE", label.unwrap());
                    card.push(prop);
                } else {
                    // Matches Cyrus: an unrecognized username service gets an
                    // empty SOCIALPROFILE value with the real value carried
                    // in X-USER.
                    let mut prop = RawProperty::text("SOCIALPROFILE", "");
                    prop = prop.with_param("X-USER", val);
                    if let Some(label) = label {
                        prop = prop.with_param("type", label);
                    }
                    card.push(prop);
                }
            }
            _ => return false,
        }
    }
    true
}

fn read_online(card: &RawCard) -> Vec<Value> {
    let mut out = Vec::new();
    for prop in card.get_all("URL") {
        out.push(json!({
            "value": prop.value.as_text().unwrap_or_default(),
            "type": "uri",
            "label": Value::Null,
        }));
    }
    for prop in card.get_all("IMPP") {
        out.push(json!({
            "value": prop.value.as_text().unwrap_or_default(),
            "type": "username",
            "label": prop.param("X-SERVICE-TYPE"),
        }));
    }
    for prop in card.get_all("SOCIALPROFILE") {
        out.push(json!({
            "value": prop.param("X-USER").unwrap_or_default(),
            "type": "username",
            "label": prop.param("type"),
        }));
    }
    out
}

fn set_addresses(card: &mut RawCard, value: &Value) -> bool {
    let Some(entries) = value.as_array() else {
        return false;
    };
    card.remove_all("ADR");
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            return false;
        };
        let street = obj.get("street").and_then(Value::as_str).unwrap_or_default();
        let parts = vec![
            String::new(),
            String::new(),
            street.to_string(),
            obj.get("locality").and_then(Value::as_str).unwrap_or_default().to_string(),
            obj.get("region").and_then(Value::as_str).unwrap_or_default().to_string(),
            obj.get("postcode").and_then(Value::as_str).unwrap_or_default().to_string(),
            obj.get("country").and_then(Value::as_str).unwrap_or_default().to_string(),
        ];
        let mut prop = RawProperty::component("ADR", parts);
        if let Some(kind) = obj.get("type").and_then(Value::as_str) {
            prop = prop.with_param("type", kind);
        }
        if let Some(label) = obj.get("label").and_then(Value::as_str) {
            prop = prop.with_param("label", label);
        }
        card.push(prop);
    }
    true
}

fn read_addresses(card: &RawCard) -> Vec<Value> {
    card.get_all("ADR")
        .map(|prop| {
            let parts = prop.value.as_component();
            let street = parts
                .get(0..3)
                .map(|s| s.iter().filter(|p| !p.is_empty()).cloned().collect::<Vec<_>>().join("\n"))
                .unwrap_or_default();
            json!({
                "type": prop.param("type").unwrap_or("other"),
                "label": prop.param("label"),
                "street": street,
                "locality": parts.get(3).cloned().unwrap_or_default(),
                "region": parts.get(4).cloned().unwrap_or_default(),
                "postcode": parts.get(5).cloned().unwrap_or_default(),
                "country": parts.get(6).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

fn recompute_fn(card: &mut RawCard) {
    let n = card.get("N").map(|p| p.value.as_component()).unwrap_or_default();
    let prefix = n.get(3).cloned().unwrap_or_default();
    let first = n.get(1).cloned().unwrap_or_default();
    let middle = n.get(2).cloned().unwrap_or_default();
    let last = n.get(0).cloned().unwrap_or_default();
    let suffix = n.get(4).cloned().unwrap_or_default();
    let joined = [prefix, first, middle, last, suffix]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let fn_value = if !joined.is_empty() {
        joined
    } else if let Some(nick) = card.get("NICKNAME").and_then(|p| p.value.as_text()) {
        if !nick.is_empty() {
            nick.to_string()
        } else {
            first_email_or_no_name(card)
        }
    } else {
        first_email_or_no_name(card)
    };

    card.remove_all("FN");
    card.push(RawProperty::text("FN", fn_value));
}

fn first_email_or_no_name(card: &RawCard) -> String {
    card.get("EMAIL")
        .and_then(|p| p.value.as_text())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "No Name".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_name_recomputes_fn() {
        let mut card = new_card("u1");
        let update = json!({"firstName": "Ada", "lastName": "Lovelace"});
        apply_jmap(&mut card, update.as_object().unwrap());
        assert_eq!(text_of(&card, "FN"), "Ada Lovelace");
    }

    #[test]
    fn notes_only_create_still_gets_an_fn() {
        let mut card = new_card("u1");
        let update = json!({"notes": "likes tea"});
        apply_jmap(&mut card, update.as_object().unwrap());
        ensure_fn(&mut card);
        assert_eq!(text_of(&card, "FN"), "No Name");
    }

    #[test]
    fn no_name_falls_back_to_sentinel() {
        let mut card = new_card("u1");
        let update = json!({});
        apply_jmap(&mut card, update.as_object().unwrap());
        assert_eq!(text_of(&card, "FN"), "No Name");
    }

    #[test]
    fn flag_only_update_is_no_content() {
        let mut card = new_card("u1");
        let update = json!({"isFlagged": true});
        assert!(matches!(apply_jmap(&mut card, update.as_object().unwrap()), MapResult::NoContent));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut card = new_card("u1");
        let update = json!({"bogus": 1});
        assert!(matches!(apply_jmap(&mut card, update.as_object().unwrap()), MapResult::Err("invalidParameters")));
    }

    #[test]
    fn email_default_falls_back_to_first_entry() {
        let mut card = new_card("u1");
        let update = json!({"emails": [{"value": "a@b.com", "type": "personal"}]});
        apply_jmap(&mut card, update.as_object().unwrap());
        let emails = read_emails(&card);
        assert_eq!(emails[0]["isDefault"], json!(true));
        assert_eq!(emails[0]["type"], json!("personal"));
    }

    #[test]
    fn second_email_explicitly_marked_default_is_not_demoted() {
        let mut card = new_card("u1");
        let update = json!({"emails": [
            {"value": "a@b.com", "type": "personal"},
            {"value": "b@b.com", "type": "other", "isDefault": true},
        ]});
        apply_jmap(&mut card, update.as_object().unwrap());
        let emails = read_emails(&card);
        assert_eq!(emails[0]["isDefault"], json!(false));
        assert_eq!(emails[1]["isDefault"], json!(true));
        assert_eq!(emails[1]["type"], json!("other"));
    }

    #[test]
    fn address_street_reflattens_on_read() {
        let mut card = new_card("u1");
        let update = json!({"addresses": [{"street": "221B Baker St", "locality": "London"}]});
        apply_jmap(&mut card, update.as_object().unwrap());
        let addrs = read_addresses(&card);
        assert_eq!(addrs[0]["street"], json!("221B Baker St"));
        assert_eq!(addrs[0]["locality"], json!("London"));
    }

    #[test]
    fn unknown_online_username_uses_social_profile_fallback() {
        let mut card = new_card("u1");
        let update = json!({"online": [{"value": "bob", "type": "username", "label": "Mastodon"}]});
        apply_jmap(&mut card, update.as_object().unwrap());
        let online = read_online(&card);
        assert_eq!(online[0]["value"], json!("bob"));
        assert_eq!(online[0]["label"], json!("Mastodon"));
    }

    #[test]
    fn known_im_label_uses_impp() {
        let mut card = new_card("u1");
        let update = json!({"online": [{"value": "bob123", "type": "username", "label": "Skype"}]});
        apply_jmap(&mut card, update.as_object().unwrap());
        assert!(card.get("IMPP").is_some());
        assert!(card.get("SOCIALPROFILE").is_none());
    }
}
