mod common;

use common::{client_for, sign_in_locally, token_body, ID_TOKEN};
use rentify::account::{LoginForm, RegistrationForm, Role};
use rentify::error::Error;
use rentify::interest::{express_interest, InterestRequest};
use rentify::seller::PropertyUpdate;
use serde_json::json;
use wiremock::matchers::{any, body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registration(email: &str) -> RegistrationForm {
    RegistrationForm {
        first_name: "Meera".into(),
        last_name: "Iyer".into(),
        phone_number: "9123456780".into(),
        email: email.into(),
        password: "secret12".into(),
        role: Role::Seller,
    }
}

#[tokio::test]
async fn test_register_stores_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(query_param("key", "test_api_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("uid-9", "meera@example.com")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:update"))
        .and(body_partial_json(json!({ "idToken": ID_TOKEN, "displayName": "Meera Iyer" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-9",
            "email": "meera@example.com",
            "displayName": "Meera Iyer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/uid-9.json"))
        .and(query_param("auth", ID_TOKEN))
        .and(body_json(json!({
            "uid": "uid-9",
            "email": "meera@example.com",
            "firstName": "Meera",
            "lastName": "Iyer",
            "phoneNumber": "9123456780",
            "role": "seller"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let mut session = rentify.session();

    let profile = rentify.accounts().register(&registration("meera@example.com")).await.unwrap();
    assert_eq!(profile.uid, "uid-9");
    assert_eq!(profile.role, Role::Seller);

    let identity = session.sync().cloned().unwrap();
    assert_eq!(identity.id, "uid-9");
    assert_eq!(identity.display_name.as_deref(), Some("Meera Iyer"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "EMAIL_EXISTS" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let err = rentify
        .accounts()
        .register(&registration("taken@example.com"))
        .await
        .unwrap_err();

    match &err {
        Error::DuplicateIdentity(email) => assert_eq!(email, "taken@example.com"),
        other => panic!("Expected DuplicateIdentity, got {:?}", other),
    }
    assert_eq!(err.notice().message, "Email is already in use. Please use a different email.");
}

#[tokio::test]
async fn test_invalid_forms_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let accounts = rentify.accounts();

    let mut form = registration("meera@example.com");
    form.phone_number = "12345".into();
    let err = accounts.register(&form).await.unwrap_err();
    assert_eq!(err.notice().message, "Phone number is invalid");

    let login = LoginForm {
        email: "meera@example.com".into(),
        password: "123".into(),
    };
    let err = accounts.sign_in(&login).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.notice().message, "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_sign_in_lands_by_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(body_partial_json(json!({ "email": "seller@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("uid-s", "seller@example.com")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(body_partial_json(json!({ "email": "buyer@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("uid-b", "buyer@example.com")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/uid-s/role.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("seller")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/uid-b/role.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("buyer")))
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let accounts = rentify.accounts();

    let landing = accounts
        .sign_in(&LoginForm {
            email: "seller@example.com".into(),
            password: "secret12".into(),
        })
        .await
        .unwrap();
    assert_eq!(landing.identity.id, "uid-s");
    assert_eq!(landing.role, Role::Seller);
    assert_eq!(landing.route(), Some("/seller"));

    let landing = accounts
        .sign_in(&LoginForm {
            email: "buyer@example.com".into(),
            password: "secret12".into(),
        })
        .await
        .unwrap();
    assert_eq!(landing.route(), Some("/"));

    accounts.sign_out().unwrap();
    assert!(rentify.auth().current_user().is_none());
    assert!(matches!(accounts.sign_out(), Err(Error::Unauthenticated)));
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_LOGIN_CREDENTIALS" }
        })))
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let err = rentify
        .accounts()
        .sign_in(&LoginForm {
            email: "nobody@example.com".into(),
            password: "secret12".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert_eq!(err.notice().message, "User doesn't exist. Please get registered first.");
}

#[tokio::test]
async fn test_seller_manages_own_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/owner-1/properties.json"))
        .and(query_param("auth", ID_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "-Na1": { "title": "Garden flat", "rentPrice": "1500" },
            "-Na2": { "title": "Roof studio", "rentPrice": "900" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/users/owner-1/properties/-Na1.json"))
        .and(body_json(json!({ "rentPrice": "1600" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rentPrice": "1600" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/users/owner-1/properties/-Na2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let seller = rentify.seller();

    let anonymous = rentify.session();
    assert!(matches!(seller.mine(&anonymous).await, Err(Error::Unauthenticated)));

    sign_in_locally(&rentify, "owner-1");
    let session = rentify.session();

    let mine = seller.mine(&session).await.unwrap();
    let titles: Vec<_> = mine.iter().map(|r| r.form.title.as_str()).collect();
    assert_eq!(titles, vec!["Garden flat", "Roof studio"]);
    assert!(mine.iter().all(|r| r.owner_id == "owner-1"));

    seller
        .update(&session, "-Na1", &PropertyUpdate::new().with_rent_price("1600"))
        .await
        .unwrap();
    seller.delete(&session, "-Na2").await.unwrap();
}

#[tokio::test]
async fn test_interest_needs_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/owner-1/properties/-Na1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Garden flat",
            "rentPrice": "15000",
            "sellerName": "Meera",
            "contactPhone": "9123456780"
        })))
        .mount(&server)
        .await;

    let rentify = client_for(&server);
    let details = rentify.details().resolve("owner-1", "-Na1").await.unwrap();
    let request = InterestRequest {
        time: "10:00 AM".into(),
        name: "Ravi".into(),
        phone: "9000000000".into(),
        email: "ravi@example.com".into(),
        in_person: true,
    };

    let mut session = rentify.session();
    assert!(matches!(
        express_interest(&session, &details, &request),
        Err(Error::Unauthenticated)
    ));

    sign_in_locally(&rentify, "buyer-1");
    session.sync();
    let contact = express_interest(&session, &details, &request).unwrap();
    assert_eq!(contact.seller_name, "Meera");
    assert_eq!(contact.rent_label, "15,000");
}
