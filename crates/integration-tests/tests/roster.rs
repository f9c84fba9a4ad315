//! Manager and delivery crew rosters.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use little_lemon_integration_tests::{TestContext, TestResponse};

fn usernames(resp: &TestResponse) -> Vec<&str> {
    resp.results()
        .iter()
        .map(|user| user["username"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_rosters_are_manager_only() {
    let ctx = TestContext::new().await;

    let anonymous = ctx.get("/api/groups/manager/users", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let customer = ctx.get("/api/groups/manager/users", Some("Buzz")).await;
    assert_eq!(customer.status, StatusCode::FORBIDDEN);

    let crew = ctx
        .post("/api/groups/delivery-crew/users", Some("Slinky"), json!({ "username": "Buzz" }))
        .await;
    assert_eq!(crew.status, StatusCode::FORBIDDEN);

    let managers = ctx.get("/api/groups/manager/users", Some("Woody")).await;
    assert_eq!(managers.status, StatusCode::OK);
    assert_eq!(usernames(&managers), ["Woody"]);
}

#[tokio::test]
async fn test_add_and_remove_delivery_crew() {
    let ctx = TestContext::new().await;

    let added = ctx
        .post("/api/groups/delivery-crew/users", Some("Woody"), json!({ "username": "Buzz" }))
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.message(), "user Buzz added to group Delivery Crew");

    // Adding twice is harmless
    let again = ctx
        .post("/api/groups/delivery-crew/users", Some("Woody"), json!({ "username": "Buzz" }))
        .await;
    assert_eq!(again.status, StatusCode::CREATED);

    let crew = ctx.get("/api/groups/delivery-crew/users", Some("Woody")).await;
    assert_eq!(crew.body["count"], 3);

    let removed = ctx
        .delete("/api/groups/delivery-crew/users/Buzz", Some("Woody"))
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.message(), "user Buzz removed from group Delivery Crew");

    let not_member = ctx
        .delete("/api/groups/delivery-crew/users/Buzz", Some("Woody"))
        .await;
    assert_eq!(not_member.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roster_ordering() {
    let ctx = TestContext::new().await;
    ctx.post("/api/groups/delivery-crew/users", Some("Woody"), json!({ "username": "Bo_Peep" }))
        .await;

    let ascending = ctx
        .get("/api/groups/delivery-crew/users?ordering=username", Some("Woody"))
        .await;
    assert_eq!(usernames(&ascending), ["Bo_Peep", "Rex", "Slinky"]);

    let descending = ctx
        .get("/api/groups/delivery-crew/users?ordering=-username", Some("Woody"))
        .await;
    assert_eq!(usernames(&descending), ["Slinky", "Rex", "Bo_Peep"]);

    let unknown = ctx
        .get("/api/groups/delivery-crew/users?ordering=email", Some("Woody"))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_group_or_user() {
    let ctx = TestContext::new().await;

    let group = ctx.get("/api/groups/chefs/users", Some("Woody")).await;
    assert_eq!(group.status, StatusCode::NOT_FOUND);

    let user = ctx
        .post("/api/groups/manager/users", Some("Woody"), json!({ "username": "Zurg" }))
        .await;
    assert_eq!(user.status, StatusCode::NOT_FOUND);

    let remove = ctx
        .delete("/api/groups/manager/users/Zurg", Some("Woody"))
        .await;
    assert_eq!(remove.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promotion_takes_effect_immediately() {
    let ctx = TestContext::new().await;
    let category = json!({ "slug": "dessert", "title": "Dessert" });

    let before = ctx
        .post("/api/categories", Some("Bo_Peep"), category.clone())
        .await;
    assert_eq!(before.status, StatusCode::FORBIDDEN);

    ctx.post("/api/groups/manager/users", Some("Woody"), json!({ "username": "Bo_Peep" }))
        .await;

    let after = ctx.post("/api/categories", Some("Bo_Peep"), category).await;
    assert_eq!(after.status, StatusCode::CREATED);

    let me = ctx.get("/api/users/me", Some("Bo_Peep")).await;
    assert_eq!(me.body["groups"], json!(["Manager"]));
}
