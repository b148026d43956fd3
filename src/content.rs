use crate::error::Error;
use crate::hasher::digest;
use crate::model::{BodyPart, DuplicateGroup, MessageContent};
use crate::storage::MboxStore;
use mail_parser::{HeaderValue, MessagePart, MessageParser};

/// Retrieve the full content of one group member for preview.
///
/// Out-of-range indices fail with a descriptive error instead of
/// panicking; the member's bytes are re-read from its owning store so the
/// preview reflects the file as it is now.
pub fn get_content(
    groups: &[DuplicateGroup],
    group_index: usize,
    member_index: usize,
) -> Result<MessageContent, Error> {
    let group = groups.get(group_index).ok_or_else(|| {
        Error::InvalidSelection(format!("Invalid group index: {}", group_index))
    })?;
    let member = group.members.get(member_index).ok_or_else(|| {
        Error::InvalidSelection(format!("Invalid message index: {}", member_index))
    })?;

    let store = MboxStore::open(&member.source_file)?;
    let raw = store.read(member.key)?;
    let message = MessageParser::new().parse(&raw[..]).ok_or_else(|| {
        Error::Mailbox(format!(
            "cannot parse message {} in {}",
            member_index,
            member.source_file.display()
        ))
    })?;

    let headers = message
        .headers()
        .iter()
        .map(|header| {
            (
                header.name().to_string(),
                render_header_value(header.value()),
            )
        })
        .collect();

    let body_parts = message
        .parts
        .iter()
        .filter(|part| part.is_text())
        .map(|part| BodyPart {
            content_type: content_type_of(part),
            text: part.text_contents().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(MessageContent {
        headers,
        body_parts,
    })
}

fn render_header_value(value: &HeaderValue<'_>) -> String {
    match value {
        HeaderValue::Text(text) => text.to_string(),
        HeaderValue::TextList(list) => list.join(", "),
        HeaderValue::Address(address) => digest::render_address_value(address),
        HeaderValue::DateTime(dt) => dt.to_string(),
        other => other.as_text().unwrap_or_default().to_string(),
    }
}

fn content_type_of(part: &MessagePart<'_>) -> String {
    match part.content_type() {
        Some(ct) => match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        },
        None => "text/plain".to_string(),
    }
}
