use actix_web::{web, HttpRequest, HttpResponse};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::cart_line::{CartLine, NewCartLine};
use crate::models::product::Product;
use crate::schema::{cart_lines, products};
use crate::sessions;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    /// Defaults to 1 when absent.
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFromCartRequest {
    pub cart_item_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total_price: i64,
}

fn total_price<I: IntoIterator<Item = (i32, i64)>>(lines: I) -> i64 {
    lines
        .into_iter()
        .map(|(quantity, price)| i64::from(quantity) * price)
        .sum()
}

// ── Cart operations ──────────────────────────────────────────────────────────

/// Merge semantics: if the consumer already has a line for this product the
/// quantities are summed, never replaced. The upsert relies on the unique
/// (consumer_id, product_id) constraint, so two racing adds both land as a
/// single accumulated line instead of duplicate rows. A missing product
/// surfaces through the foreign key as `NotFound`, which also covers a
/// product deleted while the request is in flight.
pub(crate) fn upsert_line(
    conn: &mut PgConnection,
    consumer_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<(), AppError> {
    let new = NewCartLine {
        id: Uuid::new_v4(),
        consumer_id,
        product_id,
        quantity,
    };
    diesel::insert_into(cart_lines::table)
        .values(&new)
        .on_conflict((cart_lines::consumer_id, cart_lines::product_id))
        .do_update()
        .set(cart_lines::quantity.eq(cart_lines::quantity + quantity))
        .execute(conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                AppError::NotFound
            }
            other => other.into(),
        })?;
    Ok(())
}

/// The delete is filtered on both the line id and the calling consumer, so a
/// valid line id belonging to someone else reads as not found.
pub(crate) fn remove_line(
    conn: &mut PgConnection,
    consumer_id: Uuid,
    cart_item_id: Uuid,
) -> Result<(), AppError> {
    let deleted = diesel::delete(
        cart_lines::table
            .filter(cart_lines::id.eq(cart_item_id))
            .filter(cart_lines::consumer_id.eq(consumer_id)),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Lines joined with their product, oldest first, plus the cart total. The
/// inner join means a concurrently deleted product can never be counted.
pub(crate) fn load_cart(
    conn: &mut PgConnection,
    consumer_id: Uuid,
) -> Result<CartResponse, AppError> {
    let rows: Vec<(CartLine, Product)> = cart_lines::table
        .inner_join(products::table)
        .filter(cart_lines::consumer_id.eq(consumer_id))
        .order(cart_lines::created_at.asc())
        .select((CartLine::as_select(), Product::as_select()))
        .load(conn)?;

    let items: Vec<CartItemResponse> = rows
        .into_iter()
        .map(|(line, product)| CartItemResponse {
            id: line.id,
            product_id: product.id,
            name: product.name,
            price: product.price,
            image: product.image,
            quantity: line.quantity,
            line_total: i64::from(line.quantity) * product.price,
        })
        .collect();

    let total = total_price(items.iter().map(|i| (i.quantity, i.price)));
    Ok(CartResponse {
        items,
        total_price: total,
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /add_to_cart
#[utoipa::path(
    post,
    path = "/add_to_cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Line created or quantity accumulated"),
        (status = 400, description = "Missing product id or quantity below 1"),
        (status = 401, description = "No consumer session"),
        (status = 404, description = "Product does not exist"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);
    let body = body.into_inner();

    if body.quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }

    web::block(move || {
        let mut conn = pool.get()?;
        let consumer_id = sessions::require_consumer(&mut conn, token)?;
        upsert_line(&mut conn, consumer_id, body.product_id, body.quantity)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "status": "ok", "message": "Added to cart" })))
}

/// POST /remove_from_cart
#[utoipa::path(
    post,
    path = "/remove_from_cart",
    request_body = RemoveFromCartRequest,
    responses(
        (status = 200, description = "Line deleted"),
        (status = 401, description = "No consumer session"),
        (status = 404, description = "Line missing or owned by another consumer"),
    ),
    tag = "cart"
)]
pub async fn remove_from_cart(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    body: web::Json<RemoveFromCartRequest>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);
    let body = body.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let consumer_id = sessions::require_consumer(&mut conn, token)?;
        remove_line(&mut conn, consumer_id, body.cart_item_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "status": "ok", "message": "Removed from cart" })))
}

/// GET /cart
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart contents and total", body = CartResponse),
        (status = 401, description = "No consumer session"),
    ),
    tag = "cart"
)]
pub async fn view_cart(
    req: HttpRequest,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let token = sessions::token_from_request(&req);

    let cart = web::block(move || {
        let mut conn = pool.get()?;
        let consumer_id = sessions::require_consumer(&mut conn, token)?;
        load_cart(&mut conn, consumer_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(cart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db::{insert_consumer, insert_producer, insert_product, setup_db};

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(total_price(std::iter::empty::<(i32, i64)>()), 0);
    }

    #[test]
    fn single_line_total() {
        // qty 2 then qty 3 of a 300-unit product merge into one line of 5
        assert_eq!(total_price([(5, 300)]), 1500);
    }

    #[test]
    fn multi_line_total() {
        assert_eq!(total_price([(2, 300), (1, 50), (4, 10)]), 690);
    }

    #[test]
    fn free_products_contribute_nothing() {
        assert_eq!(total_price([(10, 0)]), 0);
    }

    #[test]
    fn quantity_defaults_to_one() {
        let body: AddToCartRequest =
            serde_json::from_str(r#"{"product_id":"8b9c7a8e-8f07-4f67-bb7e-5ef3f0e1d2c3"}"#)
                .unwrap();
        assert_eq!(body.quantity, 1);
    }

    #[test]
    fn explicit_quantity_is_kept() {
        let body: AddToCartRequest = serde_json::from_str(
            r#"{"product_id":"8b9c7a8e-8f07-4f67-bb7e-5ef3f0e1d2c3","quantity":4}"#,
        )
        .unwrap();
        assert_eq!(body.quantity, 4);
    }

    #[tokio::test]
    async fn repeated_adds_accumulate_quantity() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let consumer_id = insert_consumer(&mut conn);
        let producer_id = insert_producer(&mut conn);
        let product_id = insert_product(&mut conn, producer_id, 300);

        upsert_line(&mut conn, consumer_id, product_id, 2).expect("first add failed");
        upsert_line(&mut conn, consumer_id, product_id, 3).expect("second add failed");

        let cart = load_cart(&mut conn, consumer_id).expect("load failed");
        assert_eq!(cart.items.len(), 1, "repeated adds must merge into one line");
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].line_total, 1500);
        assert_eq!(cart.total_price, 1500);
    }

    #[tokio::test]
    async fn remove_is_owner_scoped() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let owner = insert_consumer(&mut conn);
        let intruder = insert_consumer(&mut conn);
        let producer_id = insert_producer(&mut conn);
        let product_id = insert_product(&mut conn, producer_id, 50);

        upsert_line(&mut conn, owner, product_id, 1).expect("add failed");
        let line_id = load_cart(&mut conn, owner).expect("load failed").items[0].id;

        // A valid line id is not enough; the line must belong to the caller.
        assert!(matches!(
            remove_line(&mut conn, intruder, line_id),
            Err(AppError::NotFound)
        ));
        assert_eq!(load_cart(&mut conn, owner).unwrap().items.len(), 1);

        remove_line(&mut conn, owner, line_id).expect("owner remove failed");
        let cart = load_cart(&mut conn, owner).unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_price, 0);
    }

    #[tokio::test]
    async fn product_delete_cascades_to_lines() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let consumer_id = insert_consumer(&mut conn);
        let producer_id = insert_producer(&mut conn);
        let product_id = insert_product(&mut conn, producer_id, 120);

        upsert_line(&mut conn, consumer_id, product_id, 2).expect("add failed");

        diesel::delete(products::table.find(product_id))
            .execute(&mut conn)
            .expect("product delete failed");

        let cart = load_cart(&mut conn, consumer_id).expect("load failed");
        assert!(cart.items.is_empty(), "no dangling lines may survive");
        assert_eq!(cart.total_price, 0);
    }

    #[tokio::test]
    async fn add_for_missing_product_is_not_found() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let consumer_id = insert_consumer(&mut conn);

        // The foreign key rejects the insert; it must read as 404, not 500.
        assert!(matches!(
            upsert_line(&mut conn, consumer_id, Uuid::new_v4(), 1),
            Err(AppError::NotFound)
        ));
    }
}
