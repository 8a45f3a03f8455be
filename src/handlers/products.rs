use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpRequest, HttpResponse};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::producer::Producer;
use crate::models::product::{NewProduct, Product};
use crate::schema::{producers, products};
use crate::sessions;
use crate::uploads::MediaStore;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, MultipartForm)]
pub struct CreateProductForm {
    #[multipart(rename = "productName")]
    pub name: Text<String>,
    /// Decimal string; must parse as a non-negative integer.
    #[multipart(rename = "productPrice")]
    pub price: Text<String>,
    #[multipart(rename = "productDescription")]
    pub description: Text<String>,
    #[multipart(rename = "productImage", limit = "10MB")]
    pub image: Option<TempFile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProducerSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub image: Option<String>,
    pub producer: ProducerSummary,
    pub created_at: String,
}

fn product_response(product: Product, producer: Producer) -> ProductResponse {
    ProductResponse {
        id: product.id,
        name: product.name,
        price: product.price,
        description: product.description,
        image: product.image,
        producer: ProducerSummary {
            id: producer.id,
            username: producer.username,
            display_name: producer.display_name,
        },
        created_at: product.created_at.to_rfc3339(),
    }
}

pub(crate) fn parse_price(raw: &str) -> Result<i64, AppError> {
    let price: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid price '{}'", raw)))?;
    if price < 0 {
        return Err(AppError::Validation(format!("Invalid price '{}'", raw)));
    }
    Ok(price)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/products
///
/// Multipart form: productName, productPrice, productDescription and an
/// optional productImage file. Requires a producer session.
#[utoipa::path(
    post,
    path = "/api/products",
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid price or missing field"),
        (status = 401, description = "No producer session"),
        (status = 404, description = "Producer account no longer exists"),
    ),
    tag = "products"
)]
pub async fn create_product(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
    MultipartForm(form): MultipartForm<CreateProductForm>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);

    let name = form.name.into_inner().trim().to_string();
    let description = form.description.into_inner().trim().to_string();
    if name.is_empty() || description.is_empty() {
        return Err(AppError::Validation(
            "Product name and description are required".into(),
        ));
    }
    let price = parse_price(&form.price.into_inner())?;
    let image = form.image;

    let product_id = web::block(move || {
        let mut conn = pool.get()?;
        let producer_id = sessions::require_producer(&mut conn, token)?;

        // The session may outlive the account row it points at.
        producers::table
            .find(producer_id)
            .select(producers::id)
            .first::<Uuid>(&mut conn)
            .optional()?
            .ok_or(AppError::NotFound)?;

        let image_ref = match &image {
            Some(file) => Some(media.store_image(file)?),
            None => None,
        };

        let new = NewProduct {
            id: Uuid::new_v4(),
            producer_id,
            name,
            price,
            description,
            image: image_ref,
        };
        diesel::insert_into(products::table)
            .values(&new)
            .execute(&mut conn)?;
        Ok::<_, AppError>(new.id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(json!({
        "status": "ok",
        "message": "Product created",
        "product_id": product_id
    })))
}

/// GET /api/products
///
/// All products joined with their producer, newest first. No pagination.
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products", body = [ProductResponse]),
    ),
    tag = "products"
)]
pub async fn list_products(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let items = web::block(move || {
        let mut conn = pool.get()?;
        let rows: Vec<(Product, Producer)> = products::table
            .inner_join(producers::table)
            .order(products::created_at.desc())
            .select((Product::as_select(), Producer::as_select()))
            .load(&mut conn)?;
        Ok::<_, AppError>(
            rows.into_iter()
                .map(|(product, producer)| product_response(product, producer))
                .collect::<Vec<_>>(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    let found = web::block(move || {
        let mut conn = pool.get()?;
        let row: Option<(Product, Producer)> = products::table
            .inner_join(producers::table)
            .filter(products::id.eq(product_id))
            .select((Product::as_select(), Producer::as_select()))
            .first(&mut conn)
            .optional()?;
        Ok::<_, AppError>(row.map(|(product, producer)| product_response(product, producer)))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match found {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound),
    }
}

/// DELETE /api/products/{id}
///
/// Only the owning producer may delete. Cart lines referencing the product go
/// with it via the foreign-key cascade.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 401, description = "No producer session"),
        (status = 404, description = "Product missing or owned by another producer"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);
    let product_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let producer_id = sessions::require_producer(&mut conn, token)?;

        let deleted = diesel::delete(
            products::table
                .filter(products::id.eq(product_id))
                .filter(products::producer_id.eq(producer_id)),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "status": "ok", "message": "Product deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer_parses() {
        assert_eq!(parse_price("300").unwrap(), 300);
    }

    #[test]
    fn zero_is_a_valid_price() {
        assert_eq!(parse_price("0").unwrap(), 0);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(parse_price(" 42 ").unwrap(), 42);
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(matches!(parse_price("-1"), Err(AppError::Validation(_))));
    }

    #[test]
    fn decimal_price_is_rejected() {
        assert!(matches!(parse_price("9.99"), Err(AppError::Validation(_))));
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        assert!(matches!(parse_price("free"), Err(AppError::Validation(_))));
        assert!(matches!(parse_price(""), Err(AppError::Validation(_))));
    }
}
