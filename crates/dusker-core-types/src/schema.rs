//! Canonical field keys and event names for structured logging
//!
//! Every log line emitted by the store facade uses these keys so that log
//! processors can filter on them without knowing the emitting module.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Entity identifiers
pub const FIELD_SESSION_ID: &str = "session_id";
pub const FIELD_WAVE_ID: &str = "wave_id";

// Aggregates
pub const FIELD_TOTAL_WAVES: &str = "total_waves";
pub const FIELD_RESULT_LEN: &str = "result_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_entity_fields_are_distinct() {
        assert_ne!(FIELD_SESSION_ID, FIELD_WAVE_ID);
    }
}
