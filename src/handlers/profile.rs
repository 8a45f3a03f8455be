use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpRequest, HttpResponse};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::producer::{Producer, ProducerProfileChangeset};
use crate::schema::producers;
use crate::sessions;
use crate::uploads::MediaStore;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, MultipartForm)]
pub struct UpdateProfileForm {
    #[multipart(rename = "displayName")]
    pub display_name: Option<Text<String>>,
    pub bio: Option<Text<String>>,
    #[multipart(rename = "videoLink")]
    pub video_link: Option<Text<String>>,
    /// Direct image URL; ignored when a file is uploaded alongside it.
    #[multipart(rename = "profileImageUrl")]
    pub profile_image_url: Option<Text<String>>,
    #[multipart(rename = "profileImage", limit = "10MB")]
    pub profile_image: Option<TempFile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileUpdateResponse {
    pub status: String,
    pub message: String,
    pub profile: ProfileResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub video_link: Option<String>,
}

fn profile_response(producer: Producer) -> ProfileResponse {
    ProfileResponse {
        id: producer.id,
        username: producer.username,
        display_name: producer.display_name,
        bio: producer.bio,
        profile_image: producer.profile_image,
        video_link: producer.video_link,
    }
}

fn non_empty(field: Option<Text<String>>) -> Option<String> {
    field
        .map(Text::into_inner)
        .filter(|s| !s.trim().is_empty())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/producers/profile
#[utoipa::path(
    get,
    path = "/api/producers/profile",
    responses(
        (status = 200, description = "Own profile", body = ProfileResponse),
        (status = 401, description = "No producer session"),
        (status = 404, description = "Producer account no longer exists"),
    ),
    tag = "profile"
)]
pub async fn get_profile(
    req: HttpRequest,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);

    let producer = web::block(move || {
        let mut conn = pool.get()?;
        let producer_id = sessions::require_producer(&mut conn, token)?;
        producers::table
            .find(producer_id)
            .select(Producer::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(AppError::NotFound)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(profile_response(producer)))
}

/// POST /api/producers/profile
///
/// Multipart form; every field is optional and absent fields are left
/// untouched. The profile image comes either as a direct URL
/// (profileImageUrl) or as an uploaded file (profileImage); the file wins
/// when both are sent and is stored under a server-generated name.
#[utoipa::path(
    post,
    path = "/api/producers/profile",
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdateResponse),
        (status = 400, description = "Disallowed image extension"),
        (status = 401, description = "No producer session"),
        (status = 404, description = "Producer account no longer exists"),
    ),
    tag = "profile"
)]
pub async fn update_profile(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
    MultipartForm(form): MultipartForm<UpdateProfileForm>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);

    let display_name = non_empty(form.display_name);
    let bio = non_empty(form.bio);
    let video_link = non_empty(form.video_link);
    let image_url = non_empty(form.profile_image_url);
    let image_file = form.profile_image;

    let producer = web::block(move || {
        let mut conn = pool.get()?;
        let producer_id = sessions::require_producer(&mut conn, token)?;

        let profile_image = match &image_file {
            Some(file) => Some(media.store_image(file)?),
            None => image_url,
        };

        let changeset = ProducerProfileChangeset {
            display_name,
            bio,
            profile_image,
            video_link,
        };

        if !changeset.is_empty() {
            diesel::update(producers::table.find(producer_id))
                .set(&changeset)
                .execute(&mut conn)?;
        }

        producers::table
            .find(producer_id)
            .select(Producer::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(AppError::NotFound)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProfileUpdateResponse {
        status: "ok".to_string(),
        message: "Profile updated".to_string(),
        profile: profile_response(producer),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_response_wire_format() {
        // The 200 body is exactly the documented DTO: {status, message, profile}.
        let value = serde_json::to_value(ProfileUpdateResponse {
            status: "ok".to_string(),
            message: "Profile updated".to_string(),
            profile: ProfileResponse {
                id: Uuid::nil(),
                username: "potter".to_string(),
                display_name: None,
                bio: None,
                profile_image: None,
                video_link: None,
            },
        })
        .unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(value["status"], "ok");
        assert_eq!(value["profile"]["username"], "potter");
    }
}
