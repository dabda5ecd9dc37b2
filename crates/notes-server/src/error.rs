use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use notes_core::error::NotesError;

pub const NOTE_INVALID_ID: &str = "woocommerce_admin_notes_invalid_id";
pub const ACTION_INVALID_ID: &str = "woocommerce_admin_note_action_invalid_id";
pub const NOTE_SAVE_FAILED: &str = "woocommerce_admin_note_save_failed";
pub const CANNOT_VIEW: &str = "woocommerce_rest_cannot_view";
pub const CANNOT_EDIT: &str = "woocommerce_rest_cannot_edit";
pub const INVALID_PARAM: &str = "rest_invalid_param";
pub const UNAUTHORIZED: &str = "rest_unauthorized";

const NO_RESOURCE_MESSAGE: &str = "Sorry, there is no resource with that ID.";

// ---------------------------------------------------------------------------
// Internal sentinel for boundary-level errors
// ---------------------------------------------------------------------------

/// Private sentinel carrying an explicit status and error code through the
/// `anyhow::Error` chain for failures that never reach `notes_core`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Rendered as `{ "code", "message", "data": { "status" } }`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn api(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self(
            ApiError {
                status,
                code,
                message: msg.into(),
            }
            .into(),
        )
    }

    /// 400 for malformed path or query parameters.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::api(StatusCode::BAD_REQUEST, INVALID_PARAM, msg)
    }

    /// 401 for a missing or unknown bearer token.
    pub fn unauthorized() -> Self {
        Self::api(
            StatusCode::UNAUTHORIZED,
            UNAUTHORIZED,
            "A valid bearer token is required.",
        )
    }

    /// 403 when the caller may not read notes.
    pub fn cannot_view() -> Self {
        Self::api(
            StatusCode::FORBIDDEN,
            CANNOT_VIEW,
            "Sorry, you cannot view this resource.",
        )
    }

    /// 403 when the caller may not mutate this note.
    pub fn cannot_edit() -> Self {
        Self::api(
            StatusCode::FORBIDDEN,
            CANNOT_EDIT,
            "Sorry, you are not allowed to edit this resource.",
        )
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        if let Some(e) = self.0.downcast_ref::<ApiError>() {
            return (e.status, e.code, e.message.clone());
        }

        let Some(e) = self.0.downcast_ref::<NotesError>() else {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_server_error",
                self.0.to_string(),
            );
        };
        match e {
            NotesError::NoteNotFound(_) => (
                StatusCode::NOT_FOUND,
                NOTE_INVALID_ID,
                NO_RESOURCE_MESSAGE.to_string(),
            ),
            NotesError::ActionNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ACTION_INVALID_ID,
                NO_RESOURCE_MESSAGE.to_string(),
            ),
            NotesError::InvalidStatus(_)
            | NotesError::InvalidNoteType(_)
            | NotesError::InvalidParam(_)
            | NotesError::NotSnoozable(_) => (StatusCode::BAD_REQUEST, INVALID_PARAM, e.to_string()),
            NotesError::NotInitialized => (
                StatusCode::BAD_REQUEST,
                "notes_not_initialized",
                e.to_string(),
            ),
            NotesError::Persistence { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                NOTE_SAVE_FAILED,
                e.to_string(),
            ),
            NotesError::Io(_) | NotesError::Yaml(_) | NotesError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_server_error",
                e.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, "request failed: {:#}", self.0);
        }
        let body = serde_json::json!({
            "code": code,
            "message": message,
            "data": { "status": status.as_u16() },
        });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Parse a non-negative integer path parameter.
pub fn parse_id(raw: &str, param: &str) -> Result<u64, AppError> {
    raw.parse::<u64>()
        .map_err(|_| AppError::bad_request(format!("Invalid parameter(s): {param}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn note_not_found_maps_to_404_with_note_code() {
        let (status, json) = body_json(AppError(NotesError::NoteNotFound(5).into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], NOTE_INVALID_ID);
        assert_eq!(json["message"], NO_RESOURCE_MESSAGE);
        assert_eq!(json["data"]["status"], 404);
    }

    #[tokio::test]
    async fn action_not_found_maps_to_404_with_action_code() {
        let err = NotesError::ActionNotFound {
            note_id: 1,
            action_id: 99,
        };
        let (status, json) = body_json(AppError(err.into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], ACTION_INVALID_ID);
    }

    #[tokio::test]
    async fn persistence_maps_to_500() {
        let err = NotesError::Persistence {
            note_id: 1,
            attempts: 3,
            source: Box::new(std::io::Error::other("disk full").into()),
        };
        let (status, json) = body_json(AppError(err.into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], NOTE_SAVE_FAILED);
    }

    #[tokio::test]
    async fn invalid_status_maps_to_400() {
        let (status, json) =
            body_json(AppError(NotesError::InvalidStatus("done".into()).into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], INVALID_PARAM);
    }

    #[tokio::test]
    async fn sentinel_constructors_keep_their_codes() {
        let (status, json) = body_json(AppError::unauthorized()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], UNAUTHORIZED);

        let (status, json) = body_json(AppError::cannot_edit()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], CANNOT_EDIT);
    }

    #[tokio::test]
    async fn foreign_error_maps_to_500() {
        let (status, _) = body_json(AppError(anyhow::anyhow!("something unexpected"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn parse_id_rejects_non_numeric_and_negative() {
        assert_eq!(parse_id("12", "note_id").unwrap(), 12);
        for raw in ["-1", "abc", "1.5", ""] {
            let status = parse_id(raw, "note_id").unwrap_err().parts().0;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{raw}");
        }
    }
}
