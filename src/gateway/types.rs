//! API response types, error codes and the auth-context extractor
//!
//! - `ApiResponse<T>`: unified response wrapper
//! - `ApiError`: HTTP-mapped error, built from [`LedgerError`]
//! - `Auth`: extracts the caller identity from `X-User-Id` / `X-User-Role`

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{AuthContext, Role};
use crate::error::LedgerError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;
    pub const STOCK_UNAVAILABLE: i32 = 1003;
    pub const INVALID_STATE_TRANSITION: i32 = 1004;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const FORBIDDEN: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// HTTP-mapped API error
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            msg,
        )
    }

    pub fn missing_auth(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::MISSING_AUTH, msg)
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        let code = match &e {
            LedgerError::InsufficientFunds { .. } => error_codes::INSUFFICIENT_FUNDS,
            LedgerError::StockUnavailable { .. } => error_codes::STOCK_UNAVAILABLE,
            LedgerError::InvalidStateTransition { .. } => error_codes::INVALID_STATE_TRANSITION,
            LedgerError::Unauthorized(_) => error_codes::FORBIDDEN,
            LedgerError::AccountNotFound { .. } => error_codes::NOT_FOUND,
            LedgerError::Validation(_) => error_codes::INVALID_PARAMETER,
            LedgerError::LedgerInconsistency(_) | LedgerError::Database(_) => {
                error_codes::INTERNAL_ERROR
            }
        };
        // Raw storage errors are not surfaced to end users
        let msg = match &e {
            LedgerError::Database(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.code, &self.msg));
        (self.status, body).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Success helper
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

// ============================================================================
// Auth extraction
// ============================================================================

/// Caller identity from `X-User-Id` / `X-User-Role` headers.
///
/// Authentication itself is an upstream concern; these headers are set by
/// the session layer and trusted here.
pub struct Auth(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| ApiError::missing_auth("missing or invalid X-User-Id header"))?;

        let role = parts
            .headers
            .get("X-User-Role")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or_else(|| ApiError::missing_auth("missing or invalid X-User-Role header"))?;

        Ok(Auth(AuthContext::new(user_id, role)))
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Transfer request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferApiRequest {
    pub to_user: i64,
    /// Amount as a decimal string, e.g. "25.00"
    #[schema(example = "25.00")]
    pub amount: String,
    /// Optional client idempotency key
    pub cid: Option<String>,
}

/// Admin recharge request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct RechargeApiRequest {
    pub user_id: i64,
    /// Amount as a decimal string
    #[schema(example = "100.00")]
    pub amount: String,
}

/// Admin dispute resolution body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveApiRequest {
    /// true settles the order, false cancels and refunds
    pub approve: bool,
}

/// Parse a decimal amount string from a request body
pub fn parse_amount(raw: &str) -> Result<rust_decimal::Decimal, ApiError> {
    raw.parse::<rust_decimal::Decimal>()
        .map_err(|_| ApiError::bad_request(format!("invalid amount: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let api: ApiError = LedgerError::insufficient_funds("wallet:1").into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.code, error_codes::INSUFFICIENT_FUNDS);
    }

    #[test]
    fn test_database_errors_are_masked() {
        let api: ApiError = LedgerError::Database("connection reset by peer".into()).into();
        assert_eq!(api.msg, "internal error");
        assert_eq!(api.code, error_codes::INTERNAL_ERROR);
    }

    #[test]
    fn test_parse_amount() {
        assert!(parse_amount("10.50").is_ok());
        assert!(parse_amount("abc").is_err());
    }
}
