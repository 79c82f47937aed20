//! Application services and ports.

#![forbid(unsafe_code)]

mod relay_ports;
mod relay_service;

pub use relay_ports::{ChatNotifier, NotifierReceipt};
pub use relay_service::{RelayOutcome, RelayService};
