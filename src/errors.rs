use actix_web::HttpResponse;
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => AppError::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Conflict(info.message().to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |msg: &str| {
            serde_json::json!({
                "status": "error",
                "message": msg
            })
        };
        match self {
            AppError::Validation(_) => HttpResponse::BadRequest().json(body(&self.to_string())),
            AppError::Unauthenticated | AppError::InvalidCredentials => {
                HttpResponse::Unauthorized().json(body(&self.to_string()))
            }
            AppError::NotFound => HttpResponse::NotFound().json(body("Not found")),
            AppError::Conflict(_) => HttpResponse::Conflict().json(body(&self.to_string())),
            AppError::Internal(_) => {
                HttpResponse::InternalServerError().json(body("Internal server error"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn validation_returns_400() {
        let resp = AppError::Validation("price must be a non-negative integer".into())
            .error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthenticated_returns_401() {
        assert_eq!(
            AppError::Unauthenticated.error_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn invalid_credentials_returns_401() {
        assert_eq!(
            AppError::InvalidCredentials.error_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            AppError::NotFound.error_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn conflict_returns_409() {
        assert_eq!(
            AppError::Conflict("username already taken".into())
                .error_response()
                .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_returns_500_without_detail() {
        let resp = AppError::Internal("connection reset".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: AppError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn diesel_rollback_maps_to_internal() {
        let err: AppError = diesel::result::Error::RollbackTransaction.into();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
