//! The cart, order placement and the delivery workflow.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use little_lemon_integration_tests::TestContext;

/// Place an order from `user`'s cart and return its id.
async fn place(ctx: &TestContext, user: &str) -> i64 {
    let resp = ctx.send(Method::POST, "/api/orders", Some(user), None).await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    resp.body["id"].as_i64().unwrap()
}

/// Buzz orders two Bruschetta, Bo Peep one Negroni.
async fn two_orders(ctx: &TestContext) -> (i64, i64) {
    ctx.add_to_cart("Buzz", 4, 2).await;
    let buzz = place(ctx, "Buzz").await;
    ctx.add_to_cart("Bo_Peep", 3, 1).await;
    let bo_peep = place(ctx, "Bo_Peep").await;
    (buzz, bo_peep)
}

fn order_ids(resp: &little_lemon_integration_tests::TestResponse) -> Vec<i64> {
    resp.results()
        .iter()
        .map(|order| order["id"].as_i64().unwrap())
        .collect()
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_cart_needs_login() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/api/cart/menu-items", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = ctx
        .post("/api/cart/menu-items", None, json!({ "menuitem_id": 1, "quantity": 1 }))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_to_cart_prices_the_line() {
    let ctx = TestContext::new().await;

    let resp = ctx.add_to_cart("Buzz", 4, 2).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["menuitem"]["title"], "Bruschetta");
    assert_eq!(resp.body["quantity"], 2);
    assert_eq!(resp.body["unit_price"], "10.00");
    assert_eq!(resp.body["price"], "20.00");

    // Adding the same item again merges into one line
    let again = ctx.add_to_cart("Buzz", 4, 1).await;
    assert_eq!(again.status, StatusCode::CREATED);
    assert_eq!(again.body["id"], resp.body["id"]);
    assert_eq!(again.body["quantity"], 3);
    assert_eq!(again.body["price"], "30.00");

    let cart = ctx.get("/api/cart/menu-items", Some("Buzz")).await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["count"], 1);

    // Carts are private
    let other = ctx.get("/api/cart/menu-items", Some("Bo_Peep")).await;
    assert_eq!(other.body["count"], 0);
}

#[tokio::test]
async fn test_add_to_cart_accepts_menuitem_alias() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            "/api/cart/menu-items",
            Some("Buzz"),
            json!({ "menuitem": 2, "quantity": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["menuitem"]["title"], "Cheese Sticks");
}

#[tokio::test]
async fn test_add_to_cart_validation() {
    let ctx = TestContext::new().await;

    assert_eq!(
        ctx.add_to_cart("Buzz", 4, 0).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ctx.add_to_cart("Buzz", 4, -3).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ctx.add_to_cart("Buzz", 99, 1).await.status,
        StatusCode::BAD_REQUEST
    );

    let cart = ctx.get("/api/cart/menu-items", Some("Buzz")).await;
    assert_eq!(cart.body["count"], 0);
}

#[tokio::test]
async fn test_clear_cart() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart("Buzz", 1, 1).await;
    ctx.add_to_cart("Buzz", 2, 1).await;

    let resp = ctx.delete("/api/cart/menu-items", Some("Buzz")).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let cart = ctx.get("/api/cart/menu-items", Some("Buzz")).await;
    assert_eq!(cart.body["count"], 0);

    // Clearing an empty cart is fine
    let again = ctx.delete("/api/cart/menu-items", Some("Buzz")).await;
    assert_eq!(again.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_deleted_menu_item_leaves_carts() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart("Buzz", 6, 2).await;
    ctx.add_to_cart("Buzz", 1, 1).await;

    let deleted = ctx.delete("/api/menu-items/6", Some("Woody")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let cart = ctx.get("/api/cart/menu-items", Some("Buzz")).await;
    assert_eq!(cart.body["count"], 1);
    assert_eq!(cart.results()[0]["menuitem"]["title"], "Beef Pasta");
}

// ============================================================================
// Placing orders
// ============================================================================

#[tokio::test]
async fn test_place_order_from_cart() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart("Buzz", 4, 2).await;
    ctx.add_to_cart("Buzz", 5, 1).await;

    let resp = ctx.send(Method::POST, "/api/orders", Some("Buzz"), None).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["user"]["username"], "Buzz");
    assert_eq!(resp.body["status"], false);
    assert_eq!(resp.body["delivery_crew"], Value::Null);
    assert_eq!(resp.body["total"], "27.50");
    let items = resp.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["menuitem"]["title"], "Bruschetta");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["price"], "20.00");

    // The cart was emptied in the same step
    let cart = ctx.get("/api/cart/menu-items", Some("Buzz")).await;
    assert_eq!(cart.body["count"], 0);
}

#[tokio::test]
async fn test_empty_cart_cannot_be_ordered() {
    let ctx = TestContext::new().await;

    let resp = ctx.send(Method::POST, "/api/orders", Some("Buzz"), None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.message(), "Cart is empty");

    let orders = ctx.get("/api/orders", Some("Woody")).await;
    assert_eq!(orders.body["count"], 0);
}

#[tokio::test]
async fn test_concurrent_placements_create_one_order() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart("Buzz", 4, 2).await;

    let (a, b) = tokio::join!(
        ctx.send(Method::POST, "/api/orders", Some("Buzz"), None),
        ctx.send(Method::POST, "/api/orders", Some("Buzz"), None),
    );
    let mut statuses = [a.status, b.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    let loser = if a.status == StatusCode::BAD_REQUEST { a } else { b };
    assert_eq!(loser.message(), "Cart is empty");

    let orders = ctx.get("/api/orders", Some("Buzz")).await;
    assert_eq!(orders.body["count"], 1);
}

#[tokio::test]
async fn test_cart_add_during_placement_is_kept() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart("Buzz", 4, 2).await;

    let (placed, added) = tokio::join!(
        ctx.send(Method::POST, "/api/orders", Some("Buzz"), None),
        ctx.add_to_cart("Buzz", 3, 1),
    );
    assert_eq!(placed.status, StatusCode::CREATED);
    assert_eq!(added.status, StatusCode::CREATED);

    // The Negroni is either in the order or still in the cart, never lost
    let ordered = placed.body["items"].as_array().unwrap().len();
    let cart = ctx.get("/api/cart/menu-items", Some("Buzz")).await;
    let in_cart = usize::try_from(cart.body["count"].as_u64().unwrap()).unwrap();
    assert_eq!(ordered + in_cart, 2);
}

#[tokio::test]
async fn test_order_prices_are_frozen() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart("Buzz", 4, 1).await;
    let id = place(&ctx, "Buzz").await;

    let repriced = ctx
        .patch("/api/menu-items/4", Some("Woody"), json!({ "price": "12.00" }))
        .await;
    assert_eq!(repriced.status, StatusCode::OK);

    let detail = ctx.get(&format!("/api/orders/{id}"), Some("Buzz")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["total"], "10.00");
    assert_eq!(detail.body["items"][0]["unit_price"], "10.00");
}

#[tokio::test]
async fn test_ordered_menu_item_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart("Buzz", 4, 1).await;
    place(&ctx, "Buzz").await;

    let resp = ctx.delete("/api/menu-items/4", Some("Woody")).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

// ============================================================================
// Visibility
// ============================================================================

#[tokio::test]
async fn test_order_visibility_by_role() {
    let ctx = TestContext::new().await;
    let (buzz, bo_peep) = two_orders(&ctx).await;

    let manager = ctx.get("/api/orders", Some("Woody")).await;
    assert_eq!(order_ids(&manager), [buzz, bo_peep]);

    let customer = ctx.get("/api/orders", Some("Buzz")).await;
    assert_eq!(order_ids(&customer), [buzz]);

    // Nothing assigned yet
    let crew = ctx.get("/api/orders", Some("Slinky")).await;
    assert_eq!(crew.body["count"], 0);

    let anonymous = ctx.get("/api/orders", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_order_detail_is_owner_only() {
    let ctx = TestContext::new().await;
    let (buzz, _) = two_orders(&ctx).await;

    let own = ctx.get(&format!("/api/orders/{buzz}"), Some("Buzz")).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["items"].as_array().unwrap().len(), 1);

    let other = ctx.get(&format!("/api/orders/{buzz}"), Some("Bo_Peep")).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);

    let missing = ctx.get("/api/orders/99", Some("Buzz")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Delivery workflow
// ============================================================================

#[tokio::test]
async fn test_assign_and_deliver() {
    let ctx = TestContext::new().await;
    let (buzz, bo_peep) = two_orders(&ctx).await;
    let uri = format!("/api/orders/{buzz}");

    let assigned = ctx
        .patch(&uri, Some("Woody"), json!({ "delivery_crew_id": 2 }))
        .await;
    assert_eq!(assigned.status, StatusCode::OK);
    assert_eq!(assigned.body["delivery_crew"]["username"], "Slinky");
    assert_eq!(assigned.body["status"], false);

    let slinky = ctx.get("/api/orders", Some("Slinky")).await;
    assert_eq!(order_ids(&slinky), [buzz]);
    let rex = ctx.get("/api/orders", Some("Rex")).await;
    assert_eq!(rex.body["count"], 0);

    let delivered = ctx
        .patch(&uri, Some("Slinky"), json!({ "status": true }))
        .await;
    assert_eq!(delivered.status, StatusCode::OK);
    assert_eq!(delivered.body["status"], true);

    // Marking it delivered again changes nothing
    let again = ctx.put(&uri, Some("Slinky"), json!({ "status": true })).await;
    assert_eq!(again.status, StatusCode::OK);

    // Delivered orders stay delivered
    let reopen = ctx
        .patch(&uri, Some("Woody"), json!({ "status": false }))
        .await;
    assert_eq!(reopen.status, StatusCode::BAD_REQUEST);

    let untouched = ctx.get(&format!("/api/orders/{bo_peep}"), Some("Bo_Peep")).await;
    assert_eq!(untouched.body["status"], false);
}

#[tokio::test]
async fn test_racing_reopen_cannot_undo_delivery() {
    let ctx = TestContext::new().await;
    let (buzz, _) = two_orders(&ctx).await;
    let uri = format!("/api/orders/{buzz}");
    ctx.patch(&uri, Some("Woody"), json!({ "delivery_crew_id": 2 }))
        .await;

    let (delivered, reopened) = tokio::join!(
        ctx.patch(&uri, Some("Slinky"), json!({ "status": true })),
        ctx.patch(&uri, Some("Woody"), json!({ "status": false })),
    );
    assert_eq!(delivered.status, StatusCode::OK);
    assert!(
        reopened.status == StatusCode::OK || reopened.status == StatusCode::BAD_REQUEST,
        "{:?}",
        reopened.body
    );

    let detail = ctx.get("/api/orders", Some("Woody")).await;
    let order = detail
        .results()
        .iter()
        .find(|o| o["id"].as_i64() == Some(buzz))
        .unwrap();
    assert_eq!(order["status"], true);
}

#[tokio::test]
async fn test_order_update_permissions() {
    let ctx = TestContext::new().await;
    let (buzz, _) = two_orders(&ctx).await;
    let uri = format!("/api/orders/{buzz}");
    ctx.patch(&uri, Some("Woody"), json!({ "delivery_crew_id": 2 }))
        .await;

    let customer = ctx
        .patch(&uri, Some("Buzz"), json!({ "status": true }))
        .await;
    assert_eq!(customer.status, StatusCode::FORBIDDEN);

    // Rex is crew but the order is Slinky's
    let other_crew = ctx.patch(&uri, Some("Rex"), json!({ "status": true })).await;
    assert_eq!(other_crew.status, StatusCode::FORBIDDEN);

    // Crew may not reassign, even to themselves
    let reassign = ctx
        .patch(&uri, Some("Slinky"), json!({ "status": true, "delivery_crew_id": 2 }))
        .await;
    assert_eq!(reassign.status, StatusCode::FORBIDDEN);

    let anonymous = ctx.patch(&uri, None, json!({ "status": true })).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let still_pending = ctx.get(&uri, Some("Buzz")).await;
    assert_eq!(still_pending.body["status"], false);
}

#[tokio::test]
async fn test_order_update_validation() {
    let ctx = TestContext::new().await;
    let (buzz, _) = two_orders(&ctx).await;
    let uri = format!("/api/orders/{buzz}");

    // Buzz is a customer, not delivery crew
    let not_crew = ctx
        .patch(&uri, Some("Woody"), json!({ "delivery_crew_id": 4 }))
        .await;
    assert_eq!(not_crew.status, StatusCode::BAD_REQUEST);

    let unknown = ctx
        .patch(&uri, Some("Woody"), json!({ "delivery_crew_id": 99 }))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let empty = ctx.patch(&uri, Some("Woody"), json!({})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let missing = ctx
        .patch("/api/orders/99", Some("Woody"), json!({ "status": true }))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_order() {
    let ctx = TestContext::new().await;
    let (buzz, _) = two_orders(&ctx).await;
    let uri = format!("/api/orders/{buzz}");

    let customer = ctx.delete(&uri, Some("Buzz")).await;
    assert_eq!(customer.status, StatusCode::FORBIDDEN);

    let crew = ctx.delete(&uri, Some("Slinky")).await;
    assert_eq!(crew.status, StatusCode::FORBIDDEN);

    let manager = ctx.delete(&uri, Some("Woody")).await;
    assert_eq!(manager.status, StatusCode::NO_CONTENT);

    let gone = ctx.delete(&uri, Some("Woody")).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let orders = ctx.get("/api/orders", Some("Woody")).await;
    assert_eq!(orders.body["count"], 1);

    // With the order gone its menu item can be deleted
    let item = ctx.delete("/api/menu-items/4", Some("Woody")).await;
    assert_eq!(item.status, StatusCode::NO_CONTENT);
}
