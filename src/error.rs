//! Error types for projdash.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=engine, 3=not_found, 4=validation, 6=persistence, etc.)
//! - Engine failure classification (constraint vs. statement vs. type)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for projdash operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Engine failure kinds ──────────────────────────────────────

/// Why the embedded engine rejected a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// UNIQUE / NOT NULL / CHECK / foreign key violation.
    Constraint,
    /// Malformed SQL, unknown table or column, wrong statement kind.
    Statement,
    /// Parameter binding or value conversion failure.
    TypeMismatch,
    /// Anything else the engine reports (I/O, corruption, misuse).
    Other,
}

impl EngineErrorKind {
    /// Classify a rusqlite error.
    #[must_use]
    pub fn classify(err: &rusqlite::Error) -> Self {
        use rusqlite::Error as E;

        match err {
            E::InvalidParameterCount(..)
            | E::InvalidParameterName(_)
            | E::InvalidColumnType(..)
            | E::InvalidColumnIndex(_)
            | E::InvalidColumnName(_)
            | E::FromSqlConversionFailure(..)
            | E::ToSqlConversionFailure(_)
            | E::IntegralValueOutOfRange(..) => Self::TypeMismatch,
            E::ExecuteReturnedResults | E::MultipleStatement => Self::Statement,
            _ => match err.sqlite_error_code() {
                Some(rusqlite::ErrorCode::ConstraintViolation) => Self::Constraint,
                Some(rusqlite::ErrorCode::TypeMismatch) => Self::TypeMismatch,
                // SQLITE_ERROR: syntax errors, "no such column", "no such table"
                Some(rusqlite::ErrorCode::Unknown) => Self::Statement,
                _ => Self::Other,
            },
        }
    }

    /// Lowercase label used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Constraint => "constraint",
            Self::Statement => "statement",
            Self::TypeMismatch => "type mismatch",
            Self::Other => "engine",
        }
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Engine (exit 2)
    NotInitialized,
    AlreadyInitialized,
    InitializationFailed,
    NotReady,
    ConstraintViolation,
    StatementError,
    TypeMismatch,
    DatabaseError,

    // Not Found (exit 3)
    ProjectNotFound,

    // Validation (exit 4)
    InvalidStatus,
    InvalidArgument,
    RequiredField,

    // Persistence (exit 6)
    PersistenceError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
    DecodeError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::InitializationFailed => "INITIALIZATION_FAILED",
            Self::NotReady => "NOT_READY",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
            Self::StatementError => "STATEMENT_ERROR",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::PersistenceError => "PERSISTENCE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::DecodeError => "DECODE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::InitializationFailed
            | Self::NotReady
            | Self::ConstraintViolation
            | Self::StatementError
            | Self::TypeMismatch
            | Self::DatabaseError => 2,
            Self::ProjectNotFound => 3,
            Self::InvalidStatus | Self::InvalidArgument | Self::RequiredField => 4,
            Self::PersistenceError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::DecodeError => 8,
        }
    }

    /// Whether the caller should retry (possibly with corrected input).
    ///
    /// Initialization and persistence failures leave live state intact, so
    /// repeating the call is safe. A `NotReady` error is a caller bug and is
    /// never retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InitializationFailed
                | Self::PersistenceError
                | Self::ConstraintViolation
                | Self::TypeMismatch
                | Self::InvalidStatus
                | Self::InvalidArgument
                | Self::RequiredField
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in projdash operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `pd init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    /// The engine could not be brought up (snapshot unreadable or corrupt,
    /// schema setup failed). Readiness was not resolved.
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// A query or mutation primitive ran before readiness resolved.
    #[error("Database is not ready: await initialization before issuing queries")]
    NotReady,

    /// The embedded engine rejected a statement.
    #[error("Engine rejected statement ({kind}): {source}")]
    Engine {
        kind: EngineErrorKind,
        #[source]
        source: rusqlite::Error,
    },

    /// Writing the snapshot to durable storage failed. In-memory state is
    /// unaffected.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Project not found: {id}")]
    ProjectNotFound { id: i64 },

    #[error("Invalid status: {value}")]
    InvalidStatus {
        value: String,
        suggestion: Option<String>,
    },

    #[error("Required field missing: {0}")]
    RequiredField(&'static str),

    #[error("Cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for Error {
    fn from(source: rusqlite::Error) -> Self {
        Self::Engine {
            kind: EngineErrorKind::classify(&source),
            source,
        }
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Initialization(_) => ErrorCode::InitializationFailed,
            Self::NotReady => ErrorCode::NotReady,
            Self::Engine { kind, .. } => match kind {
                EngineErrorKind::Constraint => ErrorCode::ConstraintViolation,
                EngineErrorKind::Statement => ErrorCode::StatementError,
                EngineErrorKind::TypeMismatch => ErrorCode::TypeMismatch,
                EngineErrorKind::Other => ErrorCode::DatabaseError,
            },
            Self::Persistence(_) => ErrorCode::PersistenceError,
            Self::ProjectNotFound { .. } => ErrorCode::ProjectNotFound,
            Self::InvalidStatus { .. } => ErrorCode::InvalidStatus,
            Self::RequiredField(_) => ErrorCode::RequiredField,
            Self::Decode { .. } => ErrorCode::DecodeError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// The engine failure kind, if this is an engine error.
    #[must_use]
    pub const fn engine_kind(&self) -> Option<EngineErrorKind> {
        match self {
            Self::Engine { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `pd init` to create the data directory".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "A snapshot already exists at {}. Use `--force` to start over.",
                path.display()
            )),

            Self::Initialization(_) => Some(
                "The stored snapshot could not be loaded. Retry, or move the snapshot \
                 aside and run `pd init --force` to start from an empty database."
                    .to_string(),
            ),

            Self::Persistence(_) => Some(
                "Changes are still held in memory for this process but were not saved. \
                 Check free space and permissions on the data directory."
                    .to_string(),
            ),

            Self::ProjectNotFound { id } => Some(format!(
                "No project with ID {id}. Use `pd project list` to see available projects."
            )),

            Self::InvalidStatus { suggestion, .. } => Some(match suggestion {
                Some(s) => format!("Did you mean '{s}'? Valid statuses: active, paused, completed"),
                None => "Valid statuses: active, paused, completed. \
                         Synonyms: done→completed, wip→active, hold→paused"
                    .to_string(),
            }),

            Self::Engine {
                kind: EngineErrorKind::Constraint,
                ..
            } => Some(
                "A column constraint was violated: name is required and status must be \
                 active, paused or completed."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) if msg.contains("date") => {
                Some("Dates use the YYYY-MM-DD format, e.g. 2025-03-31".to_string())
            }

            Self::InvalidArgument(_)
            | Self::NotReady
            | Self::Engine { .. }
            | Self::RequiredField(_)
            | Self::Decode { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn engine_error(conn: &Connection, sql: &str) -> Error {
        Error::from(conn.execute(sql, []).unwrap_err())
    }

    #[test]
    fn test_classify_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT NOT NULL)").unwrap();

        let err = engine_error(&conn, "INSERT INTO t (name) VALUES (NULL)");
        assert_eq!(err.engine_kind(), Some(EngineErrorKind::Constraint));
        assert_eq!(err.error_code(), ErrorCode::ConstraintViolation);
    }

    #[test]
    fn test_classify_unknown_column_as_statement() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT)").unwrap();

        let err = engine_error(&conn, "UPDATE t SET nope = 1");
        assert_eq!(err.engine_kind(), Some(EngineErrorKind::Statement));
    }

    #[test]
    fn test_classify_syntax_error_as_statement() {
        let conn = Connection::open_in_memory().unwrap();
        let err = engine_error(&conn, "INSERT INTO WHERE");
        assert_eq!(err.engine_kind(), Some(EngineErrorKind::Statement));
    }

    #[test]
    fn test_classify_parameter_count_as_type_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT)").unwrap();

        let err = Error::from(
            conn.execute("INSERT INTO t (name) VALUES (?1)", rusqlite::params!["a", "b"])
                .unwrap_err(),
        );
        assert_eq!(err.engine_kind(), Some(EngineErrorKind::TypeMismatch));
    }

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotReady.exit_code(), 2);
        assert_eq!(Error::Initialization("x".into()).exit_code(), 2);
        assert_eq!(Error::ProjectNotFound { id: 1 }.exit_code(), 3);
        assert_eq!(Error::InvalidArgument("x".into()).exit_code(), 4);
        assert_eq!(Error::Persistence("x".into()).exit_code(), 6);
        assert_eq!(Error::Other("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_not_ready_is_not_retryable() {
        assert!(!Error::NotReady.error_code().is_retryable());
        assert!(Error::Persistence("quota".into()).error_code().is_retryable());
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let json = Error::ProjectNotFound { id: 7 }.to_structured_json();
        assert_eq!(json["error"]["code"], "PROJECT_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert!(json["error"]["hint"].as_str().unwrap().contains("pd project list"));
    }
}
