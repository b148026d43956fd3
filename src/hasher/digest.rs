use mail_parser::{Addr, Address, Message};
use serde::Deserialize;
use std::fmt;
use std::hash::Hasher as _;
use std::str::FromStr;
use twox_hash::XxHash64;

/// Equivalence criterion for duplicate detection. Each variant defines
/// exactly which message fields feed the digest; two messages are
/// duplicates under a criterion iff their digests match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum HashMethod {
    /// Message-ID + Date + From + Subject + all text body parts.
    Strict,
    /// Text body parts only; headers excluded.
    Content,
    /// Message-ID + Date + From + Subject only.
    Headers,
    /// Subject + From, the coarsest criterion.
    SubjectSender,
}

impl HashMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashMethod::Strict => "strict",
            HashMethod::Content => "content",
            HashMethod::Headers => "headers",
            HashMethod::SubjectSender => "subject-sender",
        }
    }

    pub fn all() -> [HashMethod; 4] {
        [
            HashMethod::Strict,
            HashMethod::Content,
            HashMethod::Headers,
            HashMethod::SubjectSender,
        ]
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(HashMethod::Strict),
            "content" => Ok(HashMethod::Content),
            "headers" => Ok(HashMethod::Headers),
            "subject-sender" => Ok(HashMethod::SubjectSender),
            other => Err(format!(
                "unknown criteria '{}' (expected strict, content, headers or subject-sender)",
                other
            )),
        }
    }
}

impl TryFrom<String> for HashMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Compute the digest of one message under the given criterion.
///
/// Pure: same message bytes and method always produce the same digest.
/// Missing headers contribute empty strings; non-text and undecodable body
/// parts are skipped, and skipped the same way on every run.
pub fn compute_digest(message: &Message<'_>, method: HashMethod) -> u64 {
    let mut hasher = XxHash64::with_seed(0);

    match method {
        HashMethod::SubjectSender => {
            hasher.write(subject_field(message).as_bytes());
            hasher.write(b"|");
            hasher.write(from_field(message).as_bytes());
        }
        HashMethod::Headers => {
            feed_header_tuple(&mut hasher, message);
        }
        HashMethod::Strict => {
            feed_header_tuple(&mut hasher, message);
            feed_text_parts(&mut hasher, message);
        }
        HashMethod::Content => {
            feed_text_parts(&mut hasher, message);
        }
    }

    hasher.finish()
}

fn feed_header_tuple(hasher: &mut XxHash64, message: &Message<'_>) {
    hasher.write(message.message_id().unwrap_or_default().as_bytes());
    hasher.write(b"|");
    hasher.write(date_field(message).as_bytes());
    hasher.write(b"|");
    hasher.write(from_field(message).as_bytes());
    hasher.write(b"|");
    hasher.write(subject_field(message).as_bytes());
}

/// Decoded text of every text part, in part-walk order.
fn feed_text_parts(hasher: &mut XxHash64, message: &Message<'_>) {
    for part in &message.parts {
        if part.is_text() {
            if let Some(text) = part.text_contents() {
                hasher.write(text.as_bytes());
            }
        }
    }
}

pub(crate) fn subject_field(message: &Message<'_>) -> &str {
    message.subject().unwrap_or_default()
}

pub(crate) fn date_field(message: &Message<'_>) -> String {
    message
        .date()
        .map(|d| d.to_timestamp().to_string())
        .unwrap_or_default()
}

/// Canonical rendering of the From header, "Name <addr>" per mailbox.
pub(crate) fn from_field(message: &Message<'_>) -> String {
    render_address(message.from())
}

fn render_address(address: Option<&Address<'_>>) -> String {
    match address {
        Some(address) => render_address_value(address),
        None => String::new(),
    }
}

/// "Name <addr>" rendering of an address header, list and group forms
/// flattened.
pub(crate) fn render_address_value(address: &Address<'_>) -> String {
    let addrs: Vec<String> = match address {
        Address::List(list) => list.iter().map(render_addr).collect(),
        Address::Group(groups) => groups
            .iter()
            .flat_map(|group| group.addresses.iter())
            .map(render_addr)
            .collect(),
    };
    addrs.join(", ")
}

fn render_addr(addr: &Addr<'_>) -> String {
    match (addr.name.as_deref(), addr.address.as_deref()) {
        (Some(name), Some(address)) => format!("{} <{}>", name, address),
        (None, Some(address)) => address.to_string(),
        (Some(name), None) => name.to_string(),
        (None, None) => String::new(),
    }
}
