//! Product inventory over HTTP: ownership, validation and timestamps.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;

use cellarbook_core::{Price, ProductId};
use cellarbook_integration_tests::{TestServer, assert_redirect, product_form};
use cellarbook_web::db::ProductRepository;
use cellarbook_web::models::Product;

async fn product_id(server: &TestServer, name: &str) -> ProductId {
    let (id,): (i64,) = sqlx::query_as("SELECT id FROM products WHERE name = ?")
        .bind(name)
        .fetch_one(server.pool())
        .await
        .unwrap();
    ProductId::new(id)
}

async fn stored(server: &TestServer, id: ProductId) -> Option<Product> {
    ProductRepository::new(server.pool()).get(id).await.unwrap()
}

#[tokio::test]
async fn test_vodka_round_trip() {
    let server = TestServer::spawn().await;
    let client = server.logged_in_client("alice").await;

    let resp = server
        .post(&client, "/products/add", &product_form("Vodka", "10", "599.0"))
        .await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&client, &resp).await;
    assert!(body.contains("Product added successfully!"));
    assert!(body.contains("Vodka"));
    assert!(body.contains("599.00"));
    assert!(body.contains("0.7 l"));
    assert!(body.contains("40.0%"));

    let id = product_id(&server, "Vodka").await;
    let created = stored(&server, id).await.unwrap();
    assert_eq!(created.category, "Spirits");
    assert_eq!(created.kind, "Vodka");
    assert_eq!(created.quantity, 10);
    assert_eq!(created.price, Price::parse("599").unwrap());
    assert_eq!(created.created_at, created.updated_at);

    let body = server
        .get(&client, &format!("/products/edit/{id}"))
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#"value="Vodka""#));
    assert!(body.contains(r#"value="10""#));

    tokio::time::sleep(Duration::from_millis(10)).await;

    let resp = server
        .post(
            &client,
            &format!("/products/edit/{id}"),
            &product_form("Vodka", "5", "599.0"),
        )
        .await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&client, &resp).await;
    assert!(body.contains("Product updated successfully!"));

    let edited = stored(&server, id).await.unwrap();
    assert_eq!(edited.quantity, 5);
    assert_eq!(edited.created_at, created.created_at);
    assert!(edited.updated_at > created.updated_at);
}

#[tokio::test]
async fn test_products_are_listed_only_for_their_owner() {
    let server = TestServer::spawn().await;
    let alice = server.logged_in_client("alice").await;
    let bob = server.logged_in_client("bob").await;

    server
        .post(&alice, "/products/add", &product_form("Vodka", "10", "599"))
        .await;
    server
        .post(&bob, "/products/add", &product_form("Rum", "2", "25"))
        .await;

    let alices = server.get(&alice, "/products").await.text().await.unwrap();
    assert!(alices.contains("Vodka"));
    assert!(!alices.contains("Rum"));

    let bobs = server.get(&bob, "/products").await.text().await.unwrap();
    assert!(bobs.contains("Rum"));
    assert!(!bobs.contains("Vodka"));
}

#[tokio::test]
async fn test_other_users_product_cannot_be_edited_or_deleted() {
    let server = TestServer::spawn().await;
    let alice = server.logged_in_client("alice").await;
    let bob = server.logged_in_client("bob").await;

    server
        .post(&alice, "/products/add", &product_form("Vodka", "10", "599"))
        .await;
    let id = product_id(&server, "Vodka").await;
    let before = stored(&server, id).await.unwrap();

    let resp = server.get(&bob, &format!("/products/edit/{id}")).await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&bob, &resp).await;
    assert!(body.contains("You do not have permission to edit this product"));

    let resp = server
        .post(
            &bob,
            &format!("/products/edit/{id}"),
            &product_form("Water", "0", "0"),
        )
        .await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&bob, &resp).await;
    assert!(body.contains("You do not have permission to edit this product"));

    let resp = server
        .post(&bob, &format!("/products/delete/{id}"), &[])
        .await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&bob, &resp).await;
    assert!(body.contains("You do not have permission to delete this product"));

    assert_eq!(stored(&server, id).await, Some(before));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let server = TestServer::spawn().await;
    let client = server.logged_in_client("alice").await;

    let resp = server.get(&client, "/products/edit/999").await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&client, &resp).await;
    assert!(body.contains("Product not found"));

    let resp = server
        .post(
            &client,
            "/products/edit/999",
            &product_form("Vodka", "1", "1"),
        )
        .await;
    assert_redirect(&resp, "/products");

    let resp = server.post(&client, "/products/delete/999", &[]).await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&client, &resp).await;
    assert!(body.contains("Product not found"));
}

#[tokio::test]
async fn test_delete_removes_product() {
    let server = TestServer::spawn().await;
    let client = server.logged_in_client("alice").await;

    server
        .post(&client, "/products/add", &product_form("Gin", "3", "24.90"))
        .await;
    let id = product_id(&server, "Gin").await;

    let resp = server
        .post(&client, &format!("/products/delete/{id}"), &[])
        .await;
    assert_redirect(&resp, "/products");
    let body = server.follow(&client, &resp).await;
    assert!(body.contains("Product deleted successfully!"));
    assert!(body.contains("You have no products yet."));

    assert!(stored(&server, id).await.is_none());
}

#[tokio::test]
async fn test_invalid_product_returns_to_form() {
    let server = TestServer::spawn().await;
    let client = server.logged_in_client("alice").await;

    let mut form = product_form("Vodka", "10", "599");
    form[3] = ("volume", "lots");
    let resp = server.post(&client, "/products/add", &form).await;
    assert_redirect(&resp, "/products/add");
    let body = server.follow(&client, &resp).await;
    assert!(body.contains("Volume must be a number"));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(server.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);

    server
        .post(&client, "/products/add", &product_form("Vodka", "10", "599"))
        .await;
    let id = product_id(&server, "Vodka").await;

    let resp = server
        .post(
            &client,
            &format!("/products/edit/{id}"),
            &product_form("Vodka", "-1", "599"),
        )
        .await;
    assert_redirect(&resp, &format!("/products/edit/{id}"));
    let body = server.follow(&client, &resp).await;
    assert!(body.contains("Quantity cannot be negative"));
    assert_eq!(stored(&server, id).await.unwrap().quantity, 10);
}

#[tokio::test]
async fn test_non_numeric_id_is_rejected() {
    let server = TestServer::spawn().await;
    let client = server.logged_in_client("alice").await;

    let resp = server.get(&client, "/products/edit/abc").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
