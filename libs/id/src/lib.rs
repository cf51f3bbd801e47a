//! # unitrace-id
//!
//! Identifier types, parsing, and validation shared by the unitrace services.
//!
//! ## Identifier kinds
//!
//! - [`Serial`]: the unique serial of one manufactured unit. Allocated by the
//!   serialization service as a decimal number (`10000001`, `10000002`, ...),
//!   but legacy serials may carry non-digit characters.
//! - [`ContainerId`]: a caller-supplied name for a group of serials.
//! - [`TraceId`]: a per-request correlation id of the form `req_{ulid}`.
//! - [`LabelPayload`]: the text handed to a label renderer, `(21){serial}`.
//!
//! Every type has a strict parser and serializes as a plain JSON string.

mod error;
mod label;
mod macros;
mod serial;
mod types;

pub use error::IdError;
pub use label::{LabelPayload, MAX_LABEL_LEN};
pub use serial::{ContainerId, Serial, MAX_TOKEN_LEN, SERIAL_BASE};
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
