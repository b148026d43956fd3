pub mod mbox;

pub use mbox::{MboxStore, MessageKey};
