mod common;

use chrono::{Duration, Utc};
use common::{client_for, client_with, listing};
use rentify::config::{ClientOptions, MissingRecordPolicy};
use rentify::error::Error;
use rentify::listing::FilterField;
use rentify_auth::{Session, User};
use serde_json::{json, Value};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn two_owners() -> Value {
    json!({
        "owner-a": {
            "role": "seller",
            "properties": {
                "-Na1": listing("Garden flat", "Apartment", "2", "1500"),
                "-Na2": listing("City condo", "Condo", "3", "2500")
            }
        },
        "owner-b": {
            "role": "seller",
            "properties": {
                "-Nb1": listing("Family home", "House", "3", "abc")
            }
        },
        "buyer-c": { "role": "buyer" }
    })
}

#[tokio::test]
async fn test_load_and_filter_two_owners() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_owners()))
        .expect(1)
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let mut query = rentify.listings().query().await.unwrap();

    assert_eq!(query.records().len(), 3);
    assert_eq!(query.summary(), "3 appear from 3 Results");

    query.select(FilterField::PropertyType, "House").unwrap();
    let houses = query.filtered();
    assert_eq!(houses.len(), 1);
    assert_eq!(houses[0].owner_id, "owner-b");
    assert_eq!(houses[0].property_id, "-Nb1");
    assert_eq!(query.total_pages(), 1);

    query.select(FilterField::PropertyType, "Property").unwrap();
    query.select(FilterField::Price, "1000-2000").unwrap();
    let titles: Vec<_> = query.visible().iter().map(|r| r.form.title.clone()).collect();
    assert_eq!(titles, vec!["Garden flat"]);

    query.select(FilterField::Price, "2000+").unwrap();
    query.select(FilterField::Bedrooms, "3").unwrap();
    assert_eq!(query.filtered()[0].form.title, "City condo");
    assert_eq!(query.current_page(), 1);
}

#[tokio::test]
async fn test_empty_store_loads_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .mount(&server)
        .await;

    let records = client_for(&server).listings().load_all().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_read_failure_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Permission denied" })))
        .mount(&server)
        .await;

    match client_for(&server).listings().load_all().await {
        Err(Error::Fetch(message)) => assert!(message.contains("Permission denied")),
        other => panic!("Expected Fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_page_size_from_options() {
    let server = MockServer::start().await;
    let properties: serde_json::Map<String, Value> = (0..5)
        .map(|i| (format!("-N{}", i), listing(&format!("Flat {}", i), "Apartment", "1", "900")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/users.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "owner": { "properties": properties } })))
        .mount(&server)
        .await;

    let rentify = client_with(&server, ClientOptions::default().with_page_size(2));
    let mut query = rentify.listings().query().await.unwrap();
    assert_eq!(query.total_pages(), 3);
    query.go_to_page(3);
    assert_eq!(query.summary(), "1 appear from 5 Results");
}

#[tokio::test]
async fn test_detail_resolution_policies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/owner-a/properties/-Na1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Garden flat",
            "rentPrice": 123456,
            "amenities": "Gym,Lift, Garden",
            "sellerName": "Meera",
            "images": ["https://cdn.example.com/1.jpg", "https://cdn.example.com/2.jpg"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/owner-a/properties/-Gone.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let details = rentify.details();

    let found = details.resolve("owner-a", "-Na1").await.unwrap();
    assert_eq!(found.title, "Garden flat");
    assert_eq!(found.amenities, vec!["Gym", "Lift", "Garden"]);
    assert_eq!(found.images.len(), 2);

    let card = details.card("owner-a", "-Na1").await.unwrap();
    assert_eq!(card.price_label(), "1,23,000");

    let missing = details.resolve("owner-a", "-Gone").await.unwrap();
    assert!(missing.is_empty());

    let strict = client_with(
        &server,
        ClientOptions::default().with_missing_record_policy(MissingRecordPolicy::NotFound),
    );
    match strict.details().resolve("owner-a", "-Gone").await {
        Err(Error::NotFound { owner_id, property_id }) => {
            assert_eq!(owner_id, "owner-a");
            assert_eq!(property_id, "-Gone");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_detail_needs_both_ids() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server).details().resolve("", "-Na1").await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_reads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .and(query_param("key", "test_api_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "fresh_id_token",
            "refresh_token": "fresh_refresh_token",
            "expires_in": "3600"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users.json"))
        .and(query_param("auth", "fresh_id_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "owner-1": { "properties": { "-Na1": listing("Garden flat", "Apartment", "2", "1500") } }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    rentify.auth().set_session(Session {
        id_token: "stale_id_token".to_string(),
        refresh_token: "test_refresh_token".to_string(),
        expires_at: Utc::now() - Duration::minutes(5),
        user: User {
            id: "owner-1".to_string(),
            email: None,
            display_name: None,
        },
    });

    let listings = rentify.listings();
    assert_eq!(listings.load_all().await.unwrap().len(), 1);
    // the refreshed token is reused without another refresh
    assert_eq!(listings.load_all().await.unwrap().len(), 1);
    assert_eq!(rentify.auth().get_session().unwrap().id_token, "fresh_id_token");
}
