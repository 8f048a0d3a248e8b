#![allow(dead_code)]

use chrono::{Duration, Utc};
use rentify::config::{ClientOptions, FirebaseConfig};
use rentify::Rentify;
use rentify_auth::{Session, User};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const BUCKET: &str = "rentify-test.appspot.com";
pub const ID_TOKEN: &str = "test_id_token";

pub fn config_for(server: &MockServer) -> FirebaseConfig {
    FirebaseConfig {
        api_key: "test_api_key".to_string(),
        auth_domain: "rentify-test.firebaseapp.com".to_string(),
        database_url: server.uri(),
        project_id: "rentify-test".to_string(),
        storage_bucket: BUCKET.to_string(),
        messaging_sender_id: None,
        app_id: None,
    }
}

/// Every service of the client points at `server`
pub fn client_with(server: &MockServer, options: ClientOptions) -> Rentify {
    let options = options.with_service_host(&server.uri());
    Rentify::new_with_options(config_for(server), options).unwrap()
}

pub fn client_for(server: &MockServer) -> Rentify {
    client_with(server, ClientOptions::default())
}

/// Install a session without talking to the identity service
pub fn sign_in_locally(rentify: &Rentify, uid: &str) {
    rentify.auth().set_session(Session {
        id_token: ID_TOKEN.to_string(),
        refresh_token: "test_refresh_token".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        user: User {
            id: uid.to_string(),
            email: Some(format!("{}@example.com", uid)),
            display_name: None,
        },
    });
}

pub fn token_body(local_id: &str, email: &str) -> Value {
    json!({
        "idToken": ID_TOKEN,
        "email": email,
        "refreshToken": "test_refresh_token",
        "expiresIn": "3600",
        "localId": local_id
    })
}

pub fn object_body(name: &str, token: &str) -> Value {
    json!({
        "name": name,
        "bucket": BUCKET,
        "contentType": "image/jpeg",
        "size": "3",
        "downloadTokens": token
    })
}

/// The durable URL the storage client builds for `name`
pub fn download_url(server: &MockServer, name: &str, token: &str) -> String {
    format!(
        "{}/v0/b/{}/o/{}?alt=media&token={}",
        server.uri(),
        BUCKET,
        name.replace('/', "%2F"),
        token
    )
}

pub fn objects_path() -> String {
    format!("/v0/b/{}/o", BUCKET)
}

pub fn listing(title: &str, property_type: &str, bedrooms: &str, rent_price: &str) -> Value {
    json!({
        "title": title,
        "propertyType": property_type,
        "bedrooms": bedrooms,
        "rentPrice": rent_price,
        "furnished": "Yes",
        "petFriendly": "No",
        "city": "Pune",
        "images": ["https://cdn.example.com/a.jpg"]
    })
}
