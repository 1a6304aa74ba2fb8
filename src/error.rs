/// Error Handling Module
///
/// Unified error handling for the service:
/// 1. Domain-specific error types for each auth component
/// 2. A unified application error used for control flow in handlers
/// 3. HTTP response mapping with structured logging
/// 4. Error context enrichment

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Errors parsing the `Authorization` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    HeaderMissing,
    HeaderMalformed,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::HeaderMissing => write!(f, "Authorization header not found"),
            CredentialError::HeaderMalformed => write!(f, "Authorization header is malformed"),
        }
    }
}

impl StdError for CredentialError {}

/// Failure inside the password hashing primitive.
///
/// A password mismatch is not an error, see `verify_password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashingError(pub String);

impl fmt::Display for HashingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password hashing failed: {}", self.0)
    }
}

impl StdError for HashingError {}

/// Access token signing and verification errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenError {
    BadSignature,
    Expired,
    MalformedSubject,
    Malformed,
    SigningFailure(String),
}

impl fmt::Display for AccessTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTokenError::BadSignature => write!(f, "Access token signature is invalid"),
            AccessTokenError::Expired => write!(f, "Access token has expired"),
            AccessTokenError::MalformedSubject => {
                write!(f, "Access token subject is not a valid user ID")
            }
            AccessTokenError::Malformed => write!(f, "Access token is malformed"),
            AccessTokenError::SigningFailure(msg) => {
                write!(f, "Access token signing failed: {}", msg)
            }
        }
    }
}

impl StdError for AccessTokenError {}

/// Refresh token lifecycle errors
#[derive(Debug)]
pub enum RefreshTokenError {
    NotFound,
    Revoked,
    Expired,
    StorageFailure(DatabaseError),
    EntropyFailure(String),
}

impl fmt::Display for RefreshTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTokenError::NotFound => write!(f, "Refresh token not found"),
            RefreshTokenError::Revoked => write!(f, "Refresh token has been revoked"),
            RefreshTokenError::Expired => write!(f, "Refresh token has expired"),
            RefreshTokenError::StorageFailure(e) => write!(f, "{}", e),
            RefreshTokenError::EntropyFailure(msg) => {
                write!(f, "Random source unavailable: {}", msg)
            }
        }
    }
}

impl StdError for RefreshTokenError {}

impl From<DatabaseError> for RefreshTokenError {
    fn from(err: DatabaseError) -> Self {
        RefreshTokenError::StorageFailure(err)
    }
}

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug, Clone)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

const PG_UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                    DatabaseError::UniqueConstraintViolation(db_err.message().to_string())
                } else {
                    DatabaseError::QueryExecution(err.to_string())
                }
            }
            _ => DatabaseError::UnexpectedError(err.to_string()),
        }
    }
}

impl DatabaseError {
    /// Status and code shared by every path that surfaces a storage error
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            DatabaseError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "DUPLICATE_ENTRY"),
            DatabaseError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DatabaseError::ConnectionPool(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            DatabaseError::QueryExecution(_) | DatabaseError::UnexpectedError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        }
    }
}

/// Session-level authentication errors
#[derive(Debug)]
pub enum AuthError {
    Credentials(CredentialError),
    InvalidCredentials,
    Hashing(HashingError),
    AccessToken(AccessTokenError),
    RefreshToken(RefreshTokenError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Credentials(e) => write!(f, "{}", e),
            AuthError::InvalidCredentials => write!(f, "Incorrect email or password"),
            AuthError::Hashing(e) => write!(f, "{}", e),
            AuthError::AccessToken(e) => write!(f, "{}", e),
            AuthError::RefreshToken(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AuthError {}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        AuthError::Credentials(err)
    }
}

impl From<HashingError> for AuthError {
    fn from(err: HashingError) -> Self {
        AuthError::Hashing(err)
    }
}

impl From<AccessTokenError> for AuthError {
    fn from(err: AccessTokenError) -> Self {
        AuthError::AccessToken(err)
    }
}

impl From<RefreshTokenError> for AuthError {
    fn from(err: RefreshTokenError) -> Self {
        AuthError::RefreshToken(err)
    }
}

impl AuthError {
    /// Status and machine-readable code. Absent, malformed, expired and revoked
    /// credentials each get their own code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::Credentials(CredentialError::HeaderMissing) => {
                (StatusCode::UNAUTHORIZED, "MISSING_TOKEN")
            }
            AuthError::Credentials(CredentialError::HeaderMalformed) => {
                (StatusCode::UNAUTHORIZED, "MALFORMED_AUTHORIZATION")
            }
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::Hashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AuthError::AccessToken(e) => match e {
                AccessTokenError::Expired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
                AccessTokenError::SigningFailure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
                _ => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
            },
            AuthError::RefreshToken(e) => match e {
                RefreshTokenError::NotFound => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
                RefreshTokenError::Revoked => (StatusCode::UNAUTHORIZED, "TOKEN_REVOKED"),
                RefreshTokenError::Expired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
                RefreshTokenError::StorageFailure(db) => db.status_and_code(),
                RefreshTokenError::EntropyFailure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        }
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that handler errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Forbidden(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<RefreshTokenError> for AppError {
    fn from(err: RefreshTokenError) -> Self {
        AppError::Auth(AuthError::RefreshToken(err))
    }
}

impl From<HashingError> for AppError {
    fn from(err: HashingError) -> Self {
        AppError::Auth(AuthError::Hashing(err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.into())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body. `message` is always a plain string.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
            ),

            AppError::Database(e) => {
                let (status, code) = e.status_and_code();
                let message = match e {
                    DatabaseError::UniqueConstraintViolation(_) => {
                        "Resource already exists".to_string()
                    }
                    DatabaseError::NotFound(_) => e.to_string(),
                    DatabaseError::ConnectionPool(_) => {
                        "Database service temporarily unavailable".to_string()
                    }
                    _ => "Database error occurred".to_string(),
                };
                (status, code.to_string(), message)
            }

            AppError::Auth(e) => {
                let (status, code) = e.status_and_code();
                // Primitive and storage failures stay opaque to clients.
                let message = if status.is_server_error() {
                    "Internal server error".to_string()
                } else {
                    e.to_string()
                };
                (status, code.to_string(), message)
            }

            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN".to_string(),
                msg.clone(),
            ),
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code,
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => {
                    tracing::warn!(request_id = request_id, error = %e, "Invalid credentials attempt");
                }
                AuthError::Hashing(_)
                | AuthError::AccessToken(AccessTokenError::SigningFailure(_))
                | AuthError::RefreshToken(RefreshTokenError::StorageFailure(_))
                | AuthError::RefreshToken(RefreshTokenError::EntropyFailure(_)) => {
                    tracing::error!(request_id = request_id, error = %e, "Authentication failure");
                }
                _ => {
                    tracing::warn!(request_id = request_id, error = %e, "Authentication error");
                }
            },
            AppError::Forbidden(msg) => {
                tracing::warn!(request_id = request_id, error = %msg, "Forbidden");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => e.status_and_code().0,
            AppError::Auth(e) => e.status_and_code().0,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context carried through a handler for log correlation
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Log `error` with this context attached, then hand it back to the caller.
    pub fn log_error(&self, error: AppError) -> AppError {
        tracing::warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            user_id = ?self.user_id,
            error = %error,
            "Operation failed"
        );
        error
    }
}
