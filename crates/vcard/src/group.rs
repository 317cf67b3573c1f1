/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! JMAP contact-group object ↔ vCard property list. A group is a vCard
//! carrying `X-ADDRESSBOOKSERVER-KIND:group` plus one
//! `X-ADDRESSBOOKSERVER-MEMBER` per local member and one
//! `X-FM-OTHERACCOUNT-MEMBER` per foreign member.

use crate::{
    contact::MapResult,
    raw::{RawCard, RawProperty},
};
use serde_json::{json, Map, Value};

const MEMBER_PREFIX: &str = "urn:uuid:";

/// Apply a JMAP contact-group update object onto `card`.
pub fn apply_jmap(card: &mut RawCard, update: &Map<String, Value>) -> MapResult {
    for (key, value) in update {
        match key.as_str() {
            "name" => {
                let Some(name) = value.as_str() else {
                    return MapResult::Err("invalidParameters");
                };
                card.remove_all("FN");
                card.push(RawProperty::text("FN", name));
            }
            "contactIds" => {
                if !set_local_members(card, value) {
                    return MapResult::Err("invalidParameters");
                }
            }
            "otherAccountContactIds" => {
                if !set_foreign_members(card, value) {
                    return MapResult::Err("invalidParameters");
                }
            }
            "id" | "addressbookId" | "x-href" => {
                // Read-only/derived; ignored on write.
            }
            _ => return MapResult::Err("invalidParameters"),
        }
    }
    MapResult::Ok(card.clone())
}

/// Build the baseline vCard for a freshly-created group: `VERSION:3.0`,
/// `UID`, and the `X-ADDRESSBOOKSERVER-KIND:group` marker, before
/// `apply_jmap` lays in the name and members.
pub fn new_group(uid: &str) -> RawCard {
    let mut card = RawCard::new();
    card.push(RawProperty::text("VERSION", "3.0"));
    card.push(RawProperty::text("UID", uid));
    card.push(RawProperty::text("X-ADDRESSBOOKSERVER-KIND", "group"));
    card
}

/// Render a parsed group vCard as the JMAP contact-group JSON object.
/// `href` is the fully-built `x-href` URL, assembled by the caller since
/// the mapper has no notion of account or DAV namespace.
pub fn to_jmap(card: &RawCard, uid: &str, addressbook_id: &str, href: &str) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(uid));
    obj.insert("addressbookId".into(), json!(addressbook_id));
    obj.insert("name".into(), json!(text_of(card, "FN")));
    obj.insert("contactIds".into(), json!(read_local_members(card)));
    obj.insert(
        "otherAccountContactIds".into(),
        Value::Object(read_foreign_members(card)),
    );
    obj.insert("x-href".into(), json!(href));
    Value::Object(obj)
}

fn text_of(card: &RawCard, name: &str) -> String {
    card.get(name)
        .and_then(|p| p.value.as_text())
        .unwrap_or_default()
        .to_string()
}

fn set_local_members(card: &mut RawCard, value: &Value) -> bool {
    let Some(ids) = value.as_array() else {
        return false;
    };
    card.remove_all("X-ADDRESSBOOKSERVER-MEMBER");
    for id in ids {
        let Some(uid) = id.as_str() else {
            return false;
        };
        card.push(RawProperty::text(
            "X-ADDRESSBOOKSERVER-MEMBER",
            format!("{MEMBER_PREFIX}{uid}"),
        ));
    }
    true
}

fn read_local_members(card: &RawCard) -> Vec<String> {
    card.get_all("X-ADDRESSBOOKSERVER-MEMBER")
        .filter_map(|p| p.value.as_text())
        .map(|v| v.strip_prefix(MEMBER_PREFIX).unwrap_or(v).to_string())
        .collect()
}

fn set_foreign_members(card: &mut RawCard, value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    card.remove_all("X-FM-OTHERACCOUNT-MEMBER");
    for (account, ids) in map {
        let Some(ids) = ids.as_array() else {
            return false;
        };
        for id in ids {
            let Some(uid) = id.as_str() else {
                return false;
            };
            let prop = RawProperty::text("X-FM-OTHERACCOUNT-MEMBER", format!("{MEMBER_PREFIX}{uid}"))
                .with_param("userid", account);
            card.push(prop);
        }
    }
    true
}

fn read_foreign_members(card: &RawCard) -> Map<String, Value> {
    let mut out: Map<String, Value> = Map::new();
    for prop in card.get_all("X-FM-OTHERACCOUNT-MEMBER") {
        let Some(account) = prop.param("userid") else {
            continue;
        };
        let Some(value) = prop.value.as_text() else {
            continue;
        };
        let uid = value.strip_prefix(MEMBER_PREFIX).unwrap_or(value).to_string();
        out.entry(account.to_string())
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .unwrap()
            .push(json!(uid));
    }
    out
}
