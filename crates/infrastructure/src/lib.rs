//! Infrastructure adapters for Permwatch.

#![forbid(unsafe_code)]

mod http_chat_notifier;

pub use http_chat_notifier::HttpChatNotifier;
