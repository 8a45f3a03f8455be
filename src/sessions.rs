//! Opaque-token sessions backed by the `sessions` table.
//!
//! A single cookie carries one token; the row behind it has independent
//! consumer and producer tracks, so both roles can be signed in at once and
//! signing out of one leaves the other intact.

use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use diesel::prelude::*;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::{NewSession, Session};
use crate::schema::sessions;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Consumer,
    Producer,
}

/// Parse the session token out of the request cookie, if any.
pub fn token_from_request(req: &HttpRequest) -> Option<Uuid> {
    req.cookie(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

pub fn session_cookie(token: Uuid) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .finish()
}

fn load(conn: &mut PgConnection, token: Option<Uuid>) -> Result<Option<Session>, AppError> {
    let Some(token) = token else {
        return Ok(None);
    };
    Ok(sessions::table
        .find(token)
        .select(Session::as_select())
        .first(conn)
        .optional()?)
}

/// Resolve the token to a signed-in consumer id, or fail with `Unauthenticated`.
pub fn require_consumer(conn: &mut PgConnection, token: Option<Uuid>) -> Result<Uuid, AppError> {
    load(conn, token)?
        .and_then(|s| s.consumer_id)
        .ok_or(AppError::Unauthenticated)
}

/// Resolve the token to a signed-in producer id, or fail with `Unauthenticated`.
pub fn require_producer(conn: &mut PgConnection, token: Option<Uuid>) -> Result<Uuid, AppError> {
    load(conn, token)?
        .and_then(|s| s.producer_id)
        .ok_or(AppError::Unauthenticated)
}

/// Record a successful login on the given track.
///
/// Reuses the caller's existing session row when the cookie still resolves
/// (the other track stays signed in); otherwise issues a fresh token.
/// Returns the token the response cookie must carry.
pub fn attach(
    conn: &mut PgConnection,
    token: Option<Uuid>,
    track: Track,
    account_id: Uuid,
) -> Result<Uuid, AppError> {
    if let Some(token) = token {
        let updated = match track {
            Track::Consumer => diesel::update(sessions::table.find(token))
                .set(sessions::consumer_id.eq(Some(account_id)))
                .execute(conn)?,
            Track::Producer => diesel::update(sessions::table.find(token))
                .set(sessions::producer_id.eq(Some(account_id)))
                .execute(conn)?,
        };
        if updated > 0 {
            return Ok(token);
        }
    }

    let new = NewSession {
        token: Uuid::new_v4(),
        consumer_id: (track == Track::Consumer).then_some(account_id),
        producer_id: (track == Track::Producer).then_some(account_id),
    };
    diesel::insert_into(sessions::table)
        .values(&new)
        .execute(conn)?;
    Ok(new.token)
}

/// Sign out of one track. Idempotent: a missing or stale token is a no-op.
/// The row is dropped once both tracks are signed out.
pub fn clear(conn: &mut PgConnection, token: Option<Uuid>, track: Track) -> Result<(), AppError> {
    let Some(session) = load(conn, token)? else {
        return Ok(());
    };

    let other_track_empty = match track {
        Track::Consumer => session.producer_id.is_none(),
        Track::Producer => session.consumer_id.is_none(),
    };

    if other_track_empty {
        diesel::delete(sessions::table.find(session.token)).execute(conn)?;
        return Ok(());
    }

    match track {
        Track::Consumer => {
            diesel::update(sessions::table.find(session.token))
                .set(sessions::consumer_id.eq(None::<Uuid>))
                .execute(conn)?;
        }
        Track::Producer => {
            diesel::update(sessions::table.find(session.token))
                .set(sessions::producer_id.eq(None::<Uuid>))
                .execute(conn)?;
        }
    }
    Ok(())
}
