//! Correlation identifiers for tying log lines and errors to one invocation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, time-ordered identifier (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an identifier received from elsewhere
            pub fn from_string(s: String) -> Self {
                Self(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifier of a single CLI invocation or store request
    RequestId
);

correlation_id!(
    /// Identifier shared by every request belonging to one logical flow
    /// (e.g. a background merge and the requests that produced its batch)
    TraceId
);

/// Context carried through an invocation for log/error correlation
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_display_matches_as_str() {
        let id = TraceId::new();
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn test_context_trace_id() {
        let ctx = RequestContext::new();
        assert!(ctx.trace_id.is_none());

        let trace = TraceId::from_string("trace-1".to_string());
        let ctx = ctx.with_trace_id(trace.clone());
        assert_eq!(ctx.trace_id, Some(trace));
    }

    #[test]
    fn test_serde_is_transparent_string() {
        let id = RequestId::from_string("req-42".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"req-42\"");
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
