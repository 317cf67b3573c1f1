/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use mail_builder::{headers::content_type::ContentType, MessageBuilder};
use mail_parser::MessageParser;

/// The RFC-822 envelope fields the set engine fixes for every vCard
/// message: subject is the card's `FN`, from is the mailbox owner,
/// message-id is derived from the card's UID, and the resource name is
/// preserved across updates when the caller supplies one.
pub struct VCardMessage<'a> {
    pub uid: &'a str,
    pub fn_name: &'a str,
    pub from_address: &'a str,
    pub hostname: &'a str,
    pub resource_name: Option<&'a str>,
}

impl<'a> VCardMessage<'a> {
    /// The resource (filename) this message is stored under: the caller's
    /// preserved name across an update, or `<uid>.vcf` for a fresh append.
    pub fn resource(&self) -> String {
        self.resource_name
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("{}.vcf", self.uid))
    }
}

/// Frame a serialized vCard body (already carrying its own `REV` stamp) as
/// an RFC-822 message suitable for `MailStore::append`.
pub fn build_vcard_message(meta: &VCardMessage<'_>, vcard_body: &str) -> trc::Result<Vec<u8>> {
    let resource = meta.resource();
    let content_type = ContentType::new("text/vcard").attribute("charset", "utf-8");
    let content_disposition = ContentType::new("inline").attribute("filename", resource.as_str());

    let message = MessageBuilder::new()
        .from((meta.fn_name, meta.from_address))
        .subject(meta.fn_name)
        .message_id(format!("<{}@{}>", meta.uid, meta.hostname))
        .header("Content-Type", content_type)
        .header("Content-Disposition", content_disposition)
        .text_body(vcard_body);

    let mut raw = Vec::with_capacity(vcard_body.len() + 256);
    message
        .write_to(&mut raw)
        .map_err(|e| trc::Error::store(format!("failed to build vCard message: {e}")))?;
    Ok(raw)
}

/// Recover the vCard text body from a previously-appended RFC-822 message,
/// the inverse of [`build_vcard_message`] used by the update engine to
/// re-parse a record before diffing it.
pub fn extract_vcard_body(rfc822: &[u8]) -> trc::Result<String> {
    let message = MessageParser::default()
        .parse(rfc822)
        .ok_or_else(|| trc::Error::parse("failed to parse stored vCard message"))?;
    let body = message
        .body_text(0)
        .ok_or_else(|| trc::Error::parse("stored vCard message has no text body"))?;
    Ok(body.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_rfc822_framing() {
        let meta = VCardMessage {
            uid: "11111111-1111-1111-1111-111111111111",
            fn_name: "Ada Lovelace",
            from_address: "alice@example.com",
            hostname: "mail.example.com",
            resource_name: None,
        };
        let vcard = "BEGIN:VCARD\r\nVERSION:3.0\r\nUID:11111111-1111-1111-1111-111111111111\r\nFN:Ada Lovelace\r\nEND:VCARD\r\n";
        let raw = build_vcard_message(&meta, vcard).unwrap();
        let recovered = extract_vcard_body(&raw).unwrap();
        assert!(recovered.contains("FN:Ada Lovelace"));
    }

    #[test]
    fn resource_name_defaults_to_uid_vcf() {
        let meta = VCardMessage {
            uid: "abc",
            fn_name: "X",
            from_address: "a@b.com",
            hostname: "h",
            resource_name: None,
        };
        assert_eq!(meta.resource(), "abc.vcf");
    }

    #[test]
    fn resource_name_preserved_across_update() {
        let meta = VCardMessage {
            uid: "abc",
            fn_name: "X",
            from_address: "a@b.com",
            hostname: "h",
            resource_name: Some("custom.vcf"),
        };
        assert_eq!(meta.resource(), "custom.vcf");
    }
}
