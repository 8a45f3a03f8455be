pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod passwords;
pub mod schema;
pub mod sessions;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_db;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};
pub use uploads::MediaStore;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register_consumer,
        handlers::auth::login_consumer,
        handlers::auth::logout_consumer,
        handlers::auth::register_producer,
        handlers::auth::login_producer,
        handlers::auth::logout_producer,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::delete_product,
        handlers::cart::add_to_cart,
        handlers::cart::remove_from_cart,
        handlers::cart::view_cart,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
    ),
    components(schemas(
        handlers::auth::RegisterRequest,
        handlers::auth::LoginRequest,
        handlers::auth::RegisterResponse,
        handlers::cart::AddToCartRequest,
        handlers::cart::RemoveFromCartRequest,
        handlers::cart::CartItemResponse,
        handlers::cart::CartResponse,
        handlers::products::ProducerSummary,
        handlers::products::ProductResponse,
        handlers::profile::ProfileResponse,
        handlers::profile::ProfileUpdateResponse,
    )),
    tags(
        (name = "auth", description = "Consumer and producer accounts"),
        (name = "products", description = "Producer-owned catalog"),
        (name = "cart", description = "Per-consumer shopping cart"),
        (name = "profile", description = "Producer profile and media"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    media: MediaStore,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(media.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/api/consumers")
                    .route("/register", web::post().to(handlers::auth::register_consumer))
                    .route("/login", web::post().to(handlers::auth::login_consumer))
                    .route("/logout", web::post().to(handlers::auth::logout_consumer)),
            )
            .service(
                web::scope("/api/producers")
                    .route("/register", web::post().to(handlers::auth::register_producer))
                    .route("/login", web::post().to(handlers::auth::login_producer))
                    .route("/logout", web::post().to(handlers::auth::logout_producer))
                    .route("/profile", web::get().to(handlers::profile::get_profile))
                    .route("/profile", web::post().to(handlers::profile::update_profile)),
            )
            .service(
                web::scope("/api/products")
                    .route("", web::post().to(handlers::products::create_product))
                    .route("", web::get().to(handlers::products::list_products))
                    .route("/{id}", web::get().to(handlers::products::get_product))
                    .route("/{id}", web::delete().to(handlers::products::delete_product)),
            )
            .route("/add_to_cart", web::post().to(handlers::cart::add_to_cart))
            .route(
                "/remove_from_cart",
                web::post().to(handlers::cart::remove_from_cart),
            )
            .route("/cart", web::get().to(handlers::cart::view_cart))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
