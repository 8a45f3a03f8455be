use actix_web::{web, HttpRequest, HttpResponse};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::consumer::{Consumer, NewConsumer};
use crate::models::producer::{NewProducer, Producer};
use crate::passwords;
use crate::schema::{consumers, producers};
use crate::sessions::{self, Track};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub status: String,
    pub id: Uuid,
}

fn validate_registration(body: &RegisterRequest) -> Result<(), AppError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".into(),
        ));
    }
    if body.password != body.password_confirm {
        return Err(AppError::Validation("Passwords do not match".into()));
    }
    Ok(())
}

fn username_taken(username: &str) -> AppError {
    AppError::Conflict(format!("Username '{}' is already taken", username))
}

// ── Consumer handlers ────────────────────────────────────────────────────────

/// POST /api/consumers/register
#[utoipa::path(
    post,
    path = "/api/consumers/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Password mismatch or missing field"),
        (status = 409, description = "Username already taken"),
    ),
    tag = "auth"
)]
pub async fn register_consumer(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    validate_registration(&body)?;
    let password_hash = passwords::hash_password(&body.password)?;

    let id = web::block(move || {
        let mut conn = pool.get()?;
        let new = NewConsumer {
            id: Uuid::new_v4(),
            username: body.username.trim().to_string(),
            password_hash,
        };
        diesel::insert_into(consumers::table)
            .values(&new)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    username_taken(&new.username)
                }
                other => other.into(),
            })?;
        Ok::<_, AppError>(new.id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(RegisterResponse {
        status: "ok".to_string(),
        id,
    }))
}

/// POST /api/consumers/login
///
/// On success the response carries the session cookie. If the caller already
/// has a live session (e.g. signed in as a producer), the consumer track is
/// attached to that same session instead of replacing it.
#[utoipa::path(
    post,
    path = "/api/consumers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login_consumer(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);
    let body = body.into_inner();

    let token = web::block(move || {
        let mut conn = pool.get()?;
        let account = consumers::table
            .filter(consumers::username.eq(&body.username))
            .select(Consumer::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(AppError::InvalidCredentials)?;
        if !passwords::verify_password(&account.password_hash, &body.password)? {
            return Err(AppError::InvalidCredentials);
        }
        sessions::attach(&mut conn, token, Track::Consumer, account.id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok()
        .cookie(sessions::session_cookie(token))
        .json(json!({ "status": "ok", "message": "Logged in" })))
}

/// POST /api/consumers/logout
///
/// Clears the consumer track only; a producer signed in on the same session
/// stays signed in.
#[utoipa::path(
    post,
    path = "/api/consumers/logout",
    responses((status = 200, description = "Logged out")),
    tag = "auth"
)]
pub async fn logout_consumer(
    req: HttpRequest,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);

    web::block(move || {
        let mut conn = pool.get()?;
        sessions::clear(&mut conn, token, Track::Consumer)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "status": "ok", "message": "Logged out" })))
}

// ── Producer handlers ────────────────────────────────────────────────────────

/// POST /api/producers/register
#[utoipa::path(
    post,
    path = "/api/producers/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Password mismatch or missing field"),
        (status = 409, description = "Username already taken"),
    ),
    tag = "auth"
)]
pub async fn register_producer(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    validate_registration(&body)?;
    let password_hash = passwords::hash_password(&body.password)?;

    let id = web::block(move || {
        let mut conn = pool.get()?;
        let new = NewProducer {
            id: Uuid::new_v4(),
            username: body.username.trim().to_string(),
            password_hash,
        };
        diesel::insert_into(producers::table)
            .values(&new)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    username_taken(&new.username)
                }
                other => other.into(),
            })?;
        Ok::<_, AppError>(new.id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(RegisterResponse {
        status: "ok".to_string(),
        id,
    }))
}

/// POST /api/producers/login
#[utoipa::path(
    post,
    path = "/api/producers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login_producer(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);
    let body = body.into_inner();

    let token = web::block(move || {
        let mut conn = pool.get()?;
        let account = producers::table
            .filter(producers::username.eq(&body.username))
            .select(Producer::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(AppError::InvalidCredentials)?;
        if !passwords::verify_password(&account.password_hash, &body.password)? {
            return Err(AppError::InvalidCredentials);
        }
        sessions::attach(&mut conn, token, Track::Producer, account.id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok()
        .cookie(sessions::session_cookie(token))
        .json(json!({ "status": "ok", "message": "Logged in" })))
}

/// POST /api/producers/logout
#[utoipa::path(
    post,
    path = "/api/producers/logout",
    responses((status = 200, description = "Logged out")),
    tag = "auth"
)]
pub async fn logout_producer(
    req: HttpRequest,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);

    web::block(move || {
        let mut conn = pool.get()?;
        sessions::clear(&mut conn, token, Track::Producer)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "status": "ok", "message": "Logged out" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
        }
    }

    #[test]
    fn matching_passwords_pass_validation() {
        assert!(validate_registration(&request("alice", "pw", "pw")).is_ok());
    }

    #[test]
    fn mismatched_passwords_fail_validation() {
        assert!(matches!(
            validate_registration(&request("alice", "pw", "other")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn blank_username_fails_validation() {
        assert!(matches!(
            validate_registration(&request("   ", "pw", "pw")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn empty_password_fails_validation() {
        assert!(matches!(
            validate_registration(&request("alice", "", "")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn register_response_wire_format() {
        // The 201 body is exactly the documented DTO: {status, id}.
        let value = serde_json::to_value(RegisterResponse {
            status: "ok".to_string(),
            id: Uuid::nil(),
        })
        .unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(value["status"], "ok");
        assert!(value["id"].is_string());
    }
}
