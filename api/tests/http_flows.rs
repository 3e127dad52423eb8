use api::{create_router, ApiConfig, AppState, Environment};
use authz::Role;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use database::{Database, NewCategory, NewProduct};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use user::NewUser;

struct TestApp {
    _dir: TempDir,
    router: Router,
    state: AppState,
    garden: i64,
    lighting: i64,
    lamp: i64,
    rake: i64,
}

async fn app() -> TestApp {
    app_in(Environment::Test).await
}

async fn app_in(environment: Environment) -> TestApp {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("showcase.db").to_str().unwrap())
        .await
        .unwrap();
    db.migrate().await.unwrap();
    let db = Arc::new(db);

    let config = ApiConfig::new()
        .with_environment(environment)
        .with_uploads_path(dir.path().join("uploads"));
    let state = AppState::new(db.clone(), config).await.unwrap();

    let category = |name: &str| NewCategory {
        name: name.to_string(),
        description: None,
    };
    let garden = db.create_category(category("Garden")).await.unwrap().id;
    let lighting = db.create_category(category("Lighting")).await.unwrap().id;

    let product = |name: &str, category_id: i64, price: f64| NewProduct {
        name: name.to_string(),
        category_id,
        image: None,
        sku: format!("SKU-{}", name),
        description: None,
        price,
    };
    let lamp = db.create_product(product("Lamp", lighting, 19.5)).await.unwrap().id;
    let rake = db.create_product(product("Rake", garden, 8.0)).await.unwrap().id;

    for (username, role) in [("root", Role::Super), ("ann", Role::Admin)] {
        state
            .directory
            .create_user(NewUser {
                name: username.to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: "correct horse".to_string(),
                role,
            })
            .await
            .unwrap();
    }

    TestApp {
        _dir: dir,
        router: create_router(state.clone()),
        state,
        garden,
        lighting,
        lamp,
        rake,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, set_cookie, json)
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        let (status, _, json) = self.send(Method::GET, uri, cookie, None).await;
        (status, json)
    }

    async fn login(&self, username: &str) -> String {
        let (status, cookie, json) = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"username": username, "password": "correct horse"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", json);
        cookie.expect("login sets a session cookie")
    }

    async fn user_id(&self, username: &str) -> i64 {
        self.state
            .directory
            .find_by_username(username)
            .await
            .unwrap()
            .unwrap()
            .id
    }
}

fn ids(json: &Value, key: &str) -> Vec<i64> {
    json[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn anonymous_sees_everything_without_prices() {
    let app = app().await;

    let (status, json) = app.get("/api/v1/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json, "categories"), vec![app.garden, app.lighting]);

    let uri = format!("/api/v1/products?category_id={}", app.lighting);
    let (status, json) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["show_price"], false);
    assert_eq!(ids(&json, "products"), vec![app.lamp]);
    assert!(json["products"][0].get("price").is_none());
}

#[tokio::test]
async fn malformed_category_id_is_a_bad_request() {
    let app = app().await;
    let (status, json) = app.get("/api/v1/products?category_id=lamps", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn super_grants_shape_the_admin_view() {
    let app = app().await;
    let root = app.login("root").await;
    let ann_id = app.user_id("ann").await;

    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/permissions",
            Some(&root),
            Some(json!({"user_id": ann_id, "categories": [app.garden], "products": [app.lamp, app.lamp]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["summary"]["categories_granted"], 1);
    assert_eq!(json["summary"]["products_granted"], 1);

    let uri = format!("/api/v1/permissions?user_id={}", ann_id);
    let (status, json) = app.get(&uri, Some(&root)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["categories"], json!([app.garden]));
    assert_eq!(json["products"], json!([app.lamp]));

    let ann = app.login("ann").await;
    let (_, json) = app.get("/api/v1/categories", Some(&ann)).await;
    assert_eq!(ids(&json, "categories"), vec![app.garden]);

    let uri = format!("/api/v1/products?category_id={}", app.lighting);
    let (_, json) = app.get(&uri, Some(&ann)).await;
    assert_eq!(json["show_price"], true);
    assert_eq!(ids(&json, "products"), vec![app.lamp]);
    assert_eq!(json["products"][0]["price"], 19.5);

    let uri = format!("/api/v1/products?category_id={}", app.garden);
    let (_, json) = app.get(&uri, Some(&ann)).await;
    assert!(ids(&json, "products").is_empty());

    let (_, json) = app.get("/api/v1/auth/permissions", Some(&ann)).await;
    assert_eq!(json["all_access"], false);
    assert_eq!(json["products"], json!([app.lamp]));
}

#[tokio::test]
async fn permission_endpoints_check_the_caller() {
    let app = app().await;
    let body = json!({"user_id": 2, "categories": [app.garden]});

    let (status, _, json) = app
        .send(Method::POST, "/api/v1/permissions", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHENTICATED");

    let ann = app.login("ann").await;
    let (status, _, json) = app
        .send(Method::POST, "/api/v1/permissions", Some(&ann), Some(body))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let root = app.login("root").await;
    let (status, json) = app.get("/api/v1/permissions", Some(&root)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "User ID is required");

    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/permissions",
            Some(&root),
            Some(json!({"user_id": 9999, "products": [app.rake]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "User not found");
}

#[tokio::test]
async fn login_failures_and_logout() {
    let app = app().await;

    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "ann", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid username or password");

    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "", "password": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Username and password cannot be empty");

    let ann = app.login("ann").await;
    let (_, json) = app.get("/api/v1/auth/session", Some(&ann)).await;
    assert_eq!(json["logged_in"], true);
    assert_eq!(json["user"]["username"], "ann");
    assert_eq!(json["user"]["role"], "admin");

    let (status, _, _) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(&ann), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = app.get("/api/v1/auth/session", Some(&ann)).await;
    assert_eq!(json["logged_in"], false);
}

#[tokio::test]
async fn signup_creates_an_admin() {
    let app = app().await;
    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"name": "Bo", "username": "bo", "email": "bo@example.com", "password": "correct horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);

    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"name": "Bo", "username": "bo", "email": "bo@example.com", "password": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");

    let bo = app.login("bo").await;
    let (_, json) = app.get("/api/v1/auth/session", Some(&bo)).await;
    assert_eq!(json["user"]["role"], "admin");
}

#[tokio::test]
async fn catalog_management_requires_login() {
    let app = app().await;

    let (status, _, _) = app
        .send(
            Method::POST,
            "/api/v1/manage/categories",
            None,
            Some(json!({"name": "Tools"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ann = app.login("ann").await;
    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/manage/categories",
            Some(&ann),
            Some(json!({"name": "Tools", "description": "Hand tools"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    let tools = json["category"]["id"].as_i64().unwrap();

    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/manage/products",
            Some(&ann),
            Some(json!({"name": "Saw", "category_id": tools, "sku": "SAW-1", "price": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Price must be greater than zero");

    let (status, json) = app.get("/api/v1/manage/products", Some(&ann)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["products"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p.get("price").is_some()));

    let uri = format!("/api/v1/manage/products/{}", app.rake);
    let (status, _, _) = app.send(Method::DELETE, &uri, Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = app.get(&uri, Some(&ann)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (status, json) = app.get("/api/v1/manage/categories/abc", Some(&ann)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn user_management_is_super_only() {
    let app = app().await;
    let ann = app.login("ann").await;
    let (status, _) = app.get("/api/v1/users", Some(&ann)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let root = app.login("root").await;
    let (status, _, json) = app
        .send(
            Method::POST,
            "/api/v1/users",
            Some(&root),
            Some(json!({"name": "Cy", "username": "cy", "email": "cy@example.com", "password": "pw", "role": "super"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    assert_eq!(json["user"]["role"], "super");

    let (_, json) = app.get("/api/v1/users", Some(&root)).await;
    assert_eq!(json["users"].as_array().unwrap().len(), 3);

    let root_id = app.user_id("root").await;
    let uri = format!("/api/v1/users/{}", root_id);
    let (status, _, json) = app.send(Method::DELETE, &uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Cannot delete your own account");

    let ann_id = app.user_id("ann").await;
    let uri = format!("/api/v1/users/{}", ann_id);
    let (status, _, _) = app.send(Method::DELETE, &uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);

    // The deleted account's session no longer carries a role.
    let (_, json) = app.get("/api/v1/auth/session", Some(&ann)).await;
    assert_eq!(json["logged_in"], false);
}

#[tokio::test]
async fn health_reports_connected_store() {
    let app = app().await;
    let (status, json) = app.get("/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["database"]["connected"], true);
}

#[tokio::test]
async fn production_hides_store_errors() {
    let prd = app_in(Environment::Prd).await;
    // A router built later in the same process must not change the first one
    let dev = app_in(Environment::Dev).await;

    prd.state.db.close().await;
    dev.state.db.close().await;

    let (status, json) = prd.get("/api/v1/categories", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "UNAVAILABLE");
    assert_eq!(json["message"], "Service temporarily unavailable");

    let (status, json) = dev.get("/api/v1/categories", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with("Service temporarily unavailable ("), "{}", message);
}
