/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde_json::Value;

/// One `[method_name, args_object, client_tag]` triple from the request
/// batch array.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub method: String,
    pub args: Value,
    pub tag: String,
}

/// Why the whole batch body was rejected before any invocation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    NotJson,
    NotArray,
}

/// Parse a raw JSON body into its invocations. Malformed individual triples
/// (missing tag, wrong arity, non-string method) are tolerated and simply
/// dropped from the result, per the executor's "skip silently" rule; only a
/// body that isn't a JSON array at all is a batch-level failure.
pub fn parse_batch(body: &[u8]) -> Result<Vec<Invocation>, BatchError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| BatchError::NotJson)?;
    let items = value.as_array().ok_or(BatchError::NotArray)?;

    let mut invocations = Vec::with_capacity(items.len());
    for item in items {
        let Some(triple) = item.as_array() else {
            continue;
        };
        let [method, args, tag] = triple.as_slice() else {
            continue;
        };
        let Some(method) = method.as_str() else {
            continue;
        };
        let Some(tag) = tag.as_str() else {
            continue;
        };
        invocations.push(Invocation {
            method: method.to_string(),
            args: args.clone(),
            tag: tag.to_string(),
        });
    }
    Ok(invocations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_batch() {
        let body = br#"[["getMailboxes", {}, "t1"]]"#;
        let invocations = parse_batch(body).unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].method, "getMailboxes");
        assert_eq!(invocations[0].tag, "t1");
    }

    #[test]
    fn rejects_non_array_body() {
        let body = br#"{"not": "an array"}"#;
        assert_eq!(parse_batch(body), Err(BatchError::NotArray));
    }

    #[test]
    fn drops_a_triple_missing_its_tag() {
        let body = br#"[["getMailboxes", {}], ["getMailboxes", {}, "t2"]]"#;
        let invocations = parse_batch(body).unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].tag, "t2");
    }
}
