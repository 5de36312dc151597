use dusker_core_types::RequestId;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using DuskerError
pub type Result<T> = std::result::Result<T, DuskerError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code that callers (CLI output, tests, any
/// future API surface) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    InvalidInput,
    NotFound,
    /// A write would break referential integrity (e.g. a wave without a session)
    ConstraintViolation,
    /// The persistence backend rejected a read or a commit
    Persistence,
    /// The schema could not be loaded or migrated
    SchemaLoad,
    Serialization,
    Config,
    Io,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::SchemaLoad => "ERR_SCHEMA_LOAD",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the caller may keep using the store after this error
    ///
    /// Schema failures happen at startup and leave nothing usable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ExErrorKind::SchemaLoad | ExErrorKind::Internal)
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context for diagnostics. Domain
/// code raises [`DuskerError`]; boundaries (logging, CLI) convert to this.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for session/wave persistence
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DuskerError {
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: Uuid },

    #[error("Wave not found: {wave_id}")]
    WaveNotFound { wave_id: Uuid },

    /// Update values were taken from a different record than the target
    #[error("Identifier mismatch: target is {expected}, values belong to {actual}")]
    IdMismatch { expected: Uuid, actual: Uuid },

    /// A wave references a session that does not exist
    #[error("Wave {wave_id} references missing session {session_id}")]
    OrphanedWave { wave_id: Uuid, session_id: Uuid },

    /// The backend rejected a read or a commit; nothing was written
    #[error("Persistence failure during {op}: {message}")]
    PersistenceFailure { op: String, message: String },

    #[error("Schema load failed: {message}")]
    SchemaLoad { message: String },

    #[error("Checksum mismatch for migration {migration_id}: expected {expected}, got {actual}")]
    MigrationChecksumMismatch {
        migration_id: String,
        expected: String,
        actual: String,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DuskerError {
    /// Shorthand for a backend failure attributed to `op`
    pub fn persistence(op: impl Into<String>, message: impl ToString) -> Self {
        DuskerError::PersistenceFailure {
            op: op.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        match self {
            DuskerError::SessionNotFound { .. } | DuskerError::WaveNotFound { .. } => {
                ExErrorKind::NotFound
            }
            DuskerError::IdMismatch { .. } | DuskerError::InvalidInput { .. } => {
                ExErrorKind::InvalidInput
            }
            DuskerError::OrphanedWave { .. } => ExErrorKind::ConstraintViolation,
            DuskerError::PersistenceFailure { .. } => ExErrorKind::Persistence,
            DuskerError::SchemaLoad { .. } | DuskerError::MigrationChecksumMismatch { .. } => {
                ExErrorKind::SchemaLoad
            }
            DuskerError::Serialization { .. } => ExErrorKind::Serialization,
            DuskerError::Config { .. } => ExErrorKind::Config,
            DuskerError::Io { .. } => ExErrorKind::Io,
            DuskerError::Internal { .. } => ExErrorKind::Internal,
        }
    }
}

impl From<DuskerError> for ExError {
    fn from(err: DuskerError) -> Self {
        let ex = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            DuskerError::SessionNotFound { session_id } => ex.with_entity_id(session_id.to_string()),
            DuskerError::WaveNotFound { wave_id } => ex.with_entity_id(wave_id.to_string()),
            DuskerError::IdMismatch { expected, .. } => ex.with_entity_id(expected.to_string()),
            DuskerError::OrphanedWave { wave_id, .. } => ex.with_entity_id(wave_id.to_string()),
            DuskerError::PersistenceFailure { op, .. } => ex.with_op(op),
            DuskerError::MigrationChecksumMismatch { migration_id, .. } => {
                ex.with_op("migration_checksum").with_entity_id(migration_id)
            }
            _ => ex,
        }
    }
}

impl From<serde_json::Error> for DuskerError {
    fn from(err: serde_json::Error) -> Self {
        DuskerError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for DuskerError {
    fn from(err: std::io::Error) -> Self {
        DuskerError::Io {
            message: err.to_string(),
        }
    }
}
