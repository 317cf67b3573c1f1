/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde_json::{json, Value};

/// One `[response_name, payload_object, client_tag]` triple. A single
/// invocation may produce more than one of these under the same tag (a
/// `*Updates` call that embeds a fetch appends a second response).
#[derive(Debug, Clone)]
pub struct Response {
    pub name: String,
    pub payload: Value,
    pub tag: String,
}

impl Response {
    pub fn new(name: impl Into<String>, payload: Value, tag: impl Into<String>) -> Self {
        Response {
            name: name.into(),
            payload,
            tag: tag.into(),
        }
    }

    pub fn error(code: &str, tag: impl Into<String>) -> Self {
        Response::new("error", json!({"type": code}), tag)
    }

    pub fn to_value(&self) -> Value {
        json!([self.name, self.payload, self.tag])
    }
}

pub fn serialize_batch(responses: &[Response]) -> Value {
    Value::Array(responses.iter().map(Response::to_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_shapes_as_a_triple() {
        let response = Response::error("unknownMethod", "t1");
        assert_eq!(
            response.to_value(),
            json!(["error", {"type": "unknownMethod"}, "t1"])
        );
    }

    #[test]
    fn serialize_batch_preserves_order() {
        let responses = vec![Response::new("a", json!({}), "1"), Response::new("b", json!({}), "2")];
        let value = serialize_batch(&responses);
        assert_eq!(value[0][0], json!("a"));
        assert_eq!(value[1][0], json!("b"));
    }
}
