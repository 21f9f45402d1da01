//! End-to-end flows against PostgreSQL.
//!
//! Run with `PRICEWORTH_TEST_DATABASE_URL` set and `--ignored`. Names, SKUs
//! and emails are unique per run so the database need not be reset.

use axum::http::{Method, StatusCode};
use priceworth_integration_tests::{TestApp, request};
use serde_json::{Value, json};
use uuid::Uuid;

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

async fn create_category(app: &TestApp, admin: &str, parent: Option<i64>) -> i64 {
    let (status, body) = app
        .send(request(
            Method::POST,
            "/category",
            Some(admin),
            Some(&json!({ "name": unique("category"), "parentCategoryId": parent })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap_or_default()
}

/// Create a product with one variant at `price`; returns (product id, variant id).
async fn create_product(app: &TestApp, admin: &str, price: &str) -> (i64, i64) {
    let category = create_category(app, admin, None).await;
    let (status, body) = app
        .send(request(
            Method::POST,
            "/product",
            Some(admin),
            Some(&json!({
                "name": "Linen Shirt",
                "model": "LS-1",
                "productCategoryId": category,
                "features": [{ "key": "material", "value": "linen" }],
                "productVariants": [{
                    "name": "Linen Shirt M",
                    "sku": unique("sku"),
                    "price": price,
                }],
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["id"].as_i64().unwrap_or_default(),
        body["productVariants"][0]["id"].as_i64().unwrap_or_default(),
    )
}

async fn create_cart(app: &TestApp) -> String {
    let (status, body) = app.send(request(Method::POST, "/cart", None, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], "0.00");
    body["id"].as_str().unwrap_or_default().to_string()
}

/// Register a customer on a fresh cart; returns (customer id, token, cart id).
async fn register(app: &TestApp) -> (i64, String, String) {
    let cart = create_cart(app).await;
    let (status, body) = app
        .send(request(
            Method::POST,
            "/customer",
            None,
            Some(&json!({
                "email": format!("{}@example.com", unique("shopper")),
                "password": "Str0ng!pass",
                "firstName": "Sam",
                "shoppingCartId": cart,
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let token = body["token"].as_str().unwrap_or_default().to_string();
    let (status, me) = app
        .send(request(Method::GET, "/customer", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["shoppingCartId"], cart.as_str());
    (me["id"].as_i64().unwrap_or_default(), token, cart)
}

async fn add_to_cart(app: &TestApp, cart: &str, variant: i64, quantity: i32) -> Value {
    let (status, body) = app
        .send(request(
            Method::POST,
            "/cart/items/add",
            None,
            Some(&json!({
                "shoppingCartId": cart,
                "productVariantId": variant,
                "quantity": quantity,
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_cart_totals_and_duplicate_lines() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let (_, variant) = create_product(&app, &admin, "19.99").await;
    let cart = create_cart(&app).await;

    let body = add_to_cart(&app, &cart, variant, 2).await;
    assert_eq!(body["total"], "39.98");

    // Adding the same variant again increments the existing line
    let body = add_to_cart(&app, &cart, variant, 1).await;
    let items = body["shoppingCartItems"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(body["shoppingCartItems"][0]["quantity"], 3);
    assert_eq!(body["shoppingCartItems"][0]["subtotal"], "59.97");
    assert_eq!(body["total"], "59.97");

    let (status, body) = app
        .send(request(
            Method::PUT,
            "/cart/items/update",
            None,
            Some(&json!({ "shoppingCartId": cart, "productVariantId": variant, "quantity": 1 })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], "19.99");

    let (status, body) = app
        .send(request(
            Method::DELETE,
            "/cart/items/delete",
            None,
            Some(&json!({ "shoppingCartId": cart, "productVariantId": variant })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "0.00");

    // Removing an absent line is not an error
    let (status, _) = app
        .send(request(
            Method::DELETE,
            "/cart/items/delete",
            None,
            Some(&json!({ "shoppingCartId": cart, "productVariantId": variant })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_update_of_absent_line_is_not_found() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let (_, variant) = create_product(&app, &admin, "5.00").await;
    let cart = create_cart(&app).await;

    let (status, _) = app
        .send(request(
            Method::PUT,
            "/cart/items/update",
            None,
            Some(&json!({ "shoppingCartId": cart, "productVariantId": variant, "quantity": 2 })),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_zero_amounts_render_with_two_places() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let (product, variant) = create_product(&app, &admin, "0").await;

    let (status, body) = app
        .send(request(
            Method::GET,
            &format!("/product/{product}"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["productVariants"][0]["price"], "0.00");

    let cart = create_cart(&app).await;
    let body = add_to_cart(&app, &cart, variant, 4).await;
    assert_eq!(body["total"], "0.00");
    assert_eq!(body["shoppingCartItems"][0]["subtotal"], "0.00");
    assert_eq!(body["shoppingCartItems"][0]["productVariant"]["price"], "0.00");

    let (status, body) = app
        .send(request(Method::GET, &format!("/cart/{cart}"), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "0.00");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_amounts_beyond_stored_precision_are_rejected() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let (_, expensive) = create_product(&app, &admin, "99999.99").await;
    let (_, cheap) = create_product(&app, &admin, "10.00").await;
    let cart = create_cart(&app).await;

    // 99999.99 * 2000 does not fit NUMERIC(10,2)
    let (status, _) = app
        .send(request(
            Method::POST,
            "/cart/items/add",
            None,
            Some(&json!({ "shoppingCartId": cart, "productVariantId": expensive, "quantity": 2000 })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = add_to_cart(&app, &cart, expensive, 1000).await;
    assert_eq!(body["total"], "99999990.00");

    let (status, _) = app
        .send(request(
            Method::PUT,
            "/cart/items/update",
            None,
            Some(&json!({ "shoppingCartId": cart, "productVariantId": expensive, "quantity": 2000 })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Each line fits but the total would reach 100000000.00
    let (status, _) = app
        .send(request(
            Method::POST,
            "/cart/items/add",
            None,
            Some(&json!({ "shoppingCartId": cart, "productVariantId": cheap, "quantity": 1 })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(request(Method::GET, &format!("/cart/{cart}"), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "99999990.00");
    assert_eq!(body["shoppingCartItems"][0]["quantity"], 1000);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_customer_owns_cart_and_orders() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let (_, variant) = create_product(&app, &admin, "10.50").await;
    let (customer, token, cart) = register(&app).await;
    let (other, other_token, _) = register(&app).await;

    add_to_cart(&app, &cart, variant, 2).await;

    let (status, body) = app
        .send(request(
            Method::GET,
            &format!("/cart/customer/{customer}"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "21.00");

    // Another customer cannot read it
    let (status, _) = app
        .send(request(
            Method::GET,
            &format!("/cart/customer/{customer}"),
            Some(&other_token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, order) = app
        .send(request(
            Method::POST,
            &format!("/order/customer/{customer}"),
            Some(&token),
            Some(&json!({
                "billingAddress": "1 George St, Sydney",
                "shippingMethodId": 1,
                "items": [{ "productVariantId": variant, "quantity": 2 }],
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["customerId"], customer);
    assert_eq!(order["paymentStatus"], "pending");

    let (status, orders) = app
        .send(request(
            Method::GET,
            &format!("/order/customer/{customer}"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().map(Vec::len), Some(1));

    let (status, orders) = app
        .send(request(
            Method::GET,
            &format!("/order/customer/{other}"),
            Some(&other_token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_registration_and_login_rules() {
    let app = TestApp::with_database().await;
    let (_, _, cart) = register(&app).await;

    // The cart is already claimed
    let (status, body) = app
        .send(request(
            Method::POST,
            "/customer",
            None,
            Some(&json!({
                "email": format!("{}@example.com", unique("late")),
                "password": "Str0ng!pass",
                "shoppingCartId": cart,
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This shopping cart is invalid");

    let (status, body) = app
        .send(request(
            Method::POST,
            "/customer/login",
            None,
            Some(&json!({ "email": "nobody@example.com", "password": "Str0ng!pass" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "This email is not registered with us, please register first"
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_deactivated_customer_cannot_login() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let cart = create_cart(&app).await;
    let email = format!("{}@example.com", unique("inactive"));

    let (status, _) = app
        .send(request(
            Method::POST,
            "/customer",
            None,
            Some(&json!({ "email": email, "password": "Str0ng!pass", "shoppingCartId": cart })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, token) = app
        .send(request(
            Method::POST,
            "/customer/login",
            None,
            Some(&json!({ "email": email, "password": "Str0ng!pass" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = token["token"].as_str().unwrap_or_default().to_string();
    let (_, me) = app
        .send(request(Method::GET, "/customer", Some(&token), None))
        .await;
    let id = me["id"].as_i64().unwrap_or_default();

    let (status, _) = app
        .send(request(
            Method::PUT,
            &format!("/customer/{id}/active"),
            Some(&admin),
            Some(&json!({ "active": false })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(request(
            Method::POST,
            "/customer/login",
            None,
            Some(&json!({ "email": email, "password": "Str0ng!pass" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This account has been deactivated");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_category_cannot_become_its_own_ancestor() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let root = create_category(&app, &admin, None).await;
    let child = create_category(&app, &admin, Some(root)).await;

    let (status, _) = app
        .send(request(
            Method::PUT,
            &format!("/category/{root}"),
            Some(&admin),
            Some(&json!({ "name": unique("renamed"), "parentCategoryId": child })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(request(
            Method::PUT,
            &format!("/category/{root}"),
            Some(&admin),
            Some(&json!({ "name": unique("renamed"), "parentCategoryId": root })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, detail) = app
        .send(request(Method::GET, &format!("/category/{root}"), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["children"][0]["id"], child);
    assert_eq!(detail["parent"], Value::Null);

    let (status, detail) = app
        .send(request(Method::GET, &format!("/category/{child}"), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["parent"]["id"], root);
    assert_eq!(detail["children"], json!([]));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_deleting_variant_recomputes_cart_total() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();
    let (_, cheap) = create_product(&app, &admin, "1.25").await;
    let (_, dear) = create_product(&app, &admin, "100.00").await;
    let cart = create_cart(&app).await;

    add_to_cart(&app, &cart, cheap, 2).await;
    let body = add_to_cart(&app, &cart, dear, 1).await;
    assert_eq!(body["total"], "102.50");

    let (status, _) = app
        .send(request(
            Method::DELETE,
            &format!("/product/variant/{dear}"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .send(request(Method::GET, &format!("/cart/{cart}"), None, None))
        .await;
    assert_eq!(body["total"], "2.50");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (PRICEWORTH_TEST_DATABASE_URL)"]
async fn test_deleting_missing_order_is_not_found() {
    let app = TestApp::with_database().await;
    let admin = app.admin_token();

    let (status, body) = app
        .send(request(Method::DELETE, "/order/2147483000", Some(&admin), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order with id #2147483000 not found");
}
