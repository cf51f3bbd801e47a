//! ULID-backed correlation identifiers.

use crate::define_id;

// Correlates every log line, error body, and outbound delivery attempt that
// belongs to one logical request.
define_id!(TraceId, "req");
