//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness
//! GET    /health/ready               - Readiness (database ping)
//!
//! # Admin
//! POST   /admin/login                - Operator login, returns {token}
//!
//! # Categories
//! POST   /category                   - Create (admin)
//! GET    /category/all               - Category tree
//! GET    /category/subcategory/all   - Every category with a parent
//! GET    /category/{id}              - Category with parent, children, products
//! PUT    /category/{id}              - Replace (admin)
//! DELETE /category/{id}              - Delete (admin)
//!
//! # Products
//! POST   /product                    - Create with variants and features (admin)
//! GET    /product/all                - Product listing
//! GET    /product/{id}               - Product detail
//! PUT    /product/{id}               - Partial update (admin)
//! DELETE /product/{id}               - Delete (admin)
//! POST   /product/variant            - Add variant (admin)
//! PUT    /product/variant/{id}       - Partial variant update (admin)
//! DELETE /product/variant/{id}       - Delete variant (admin)
//! POST   /product/feature            - Add feature (admin)
//! PUT    /product/feature/{id}       - Partial feature update (admin)
//! DELETE /product/feature/{id}       - Delete feature (admin)
//!
//! # Customers
//! POST   /customer                   - Register on a cart, returns {token}
//! POST   /customer/login             - Login, returns {token}
//! GET    /customer                   - Current customer (customer token)
//! GET    /customer/{id}              - Customer (admin or owner)
//! PUT    /customer/{id}/info         - Replace profile (admin or owner)
//! PUT    /customer/{id}/password     - Change password (admin or owner)
//! PUT    /customer/{id}/active       - Activate/deactivate (admin)
//! DELETE /customer/{id}              - Delete (admin)
//!
//! # Carts
//! POST   /cart                       - Open an empty cart
//! GET    /cart/customer/{id}         - Customer's cart (admin or owner)
//! GET    /cart/{id}                  - Cart by UUID
//! POST   /cart/items/add             - Add units of a variant
//! PUT    /cart/items/update          - Set a line's quantity
//! DELETE /cart/items/delete          - Remove a line
//!
//! # Orders
//! POST   /order                      - Guest order
//! POST   /order/customer/{id}        - Customer order (admin or owner)
//! GET    /order/all                  - Every order (admin)
//! GET    /order/customer/{id}        - Customer's orders (admin or owner)
//! GET    /order/{id}                 - Order (admin)
//! DELETE /order/{id}                 - Delete (admin)
//! ```

pub mod admin;
pub mod cart;
pub mod category;
pub mod customer;
pub mod health;
pub mod order;
pub mod product;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, Request, Response, header},
    middleware::from_fn,
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{REQUEST_ID_HEADER, request_id_middleware};
use crate::state::AppState;

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/login", post(admin::login))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(category::create))
        .route("/all", get(category::list))
        .route("/subcategory/all", get(category::list_subcategories))
        .route(
            "/{id}",
            get(category::show)
                .put(category::update)
                .delete(category::delete),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(product::create))
        .route("/all", get(product::list))
        .route(
            "/{id}",
            get(product::show)
                .put(product::update)
                .delete(product::delete),
        )
        .route("/variant", post(product::create_variant))
        .route(
            "/variant/{id}",
            put(product::update_variant).delete(product::delete_variant),
        )
        .route("/feature", post(product::create_feature))
        .route(
            "/feature/{id}",
            put(product::update_feature).delete(product::delete_feature),
        )
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(customer::register).get(customer::current))
        .route("/login", post(customer::login))
        .route("/{id}", get(customer::show).delete(customer::delete))
        .route("/{id}/info", put(customer::update_info))
        .route("/{id}/password", put(customer::update_password))
        .route("/{id}/active", put(customer::update_active))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(cart::create))
        .route("/customer/{id}", get(cart::for_customer))
        .route("/{id}", get(cart::show))
        .route("/items/add", post(cart::add_item))
        .route("/items/update", put(cart::update_item))
        .route("/items/delete", axum::routing::delete(cart::delete_item))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(order::create_guest))
        .route("/all", get(order::list))
        .route(
            "/customer/{id}",
            post(order::create_for_customer).get(order::list_for_customer),
        )
        .route("/{id}", get(order::show).delete(order::delete))
}

/// All application routes, without state or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/admin", admin_routes())
        .nest("/category", category_routes())
        .nest("/product", product_routes())
        .nest("/customer", customer_routes())
        .nest("/cart", cart_routes())
        .nest("/order", order_routes())
}

/// Build the complete application: routes, middleware and state.
///
/// Sentry layers are added by the binary so tests can drive this router
/// without a Sentry client.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    routes()
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}
