//! Router-level handler tests.
//!
//! Each test gets its own in-memory SQLite database with the schema applied,
//! and drives the full application router with `tower::ServiceExt::oneshot`.

use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::{Value, json};
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tower::ServiceExt;

use crate::{api::app, db};

const FLIGHT: &str = "gives the wielder the ability to fly through the skies at supersonic speed";
const ELASTICITY: &str = "can stretch the human body to extreme lengths";

struct TestApp {
    router: Router,
    pool: SqlitePool,
}

impl TestApp {
    /// Single long-lived connection so the in-memory database survives between requests.
    async fn new() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("invalid in-memory dsn")?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("failed to open in-memory database")?;
        db::apply_schema(&pool).await?;

        Ok(Self {
            router: app(pool.clone()),
            pool,
        })
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok((status, value))
    }

    async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(body)).await
    }

    async fn patch(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, None).await
    }

    async fn count(&self, table: &str) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS total FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }

    /// Seeds one hero, two powers and one `Strong` link between the hero and the first power.
    async fn seed(&self) -> Result<()> {
        let (status, _) = self
            .post("/heroes", json!({"name": "Kamala Khan", "super_name": "Ms. Marvel"}))
            .await?;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .post("/powers", json!({"name": "flight", "description": FLIGHT}))
            .await?;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .post("/powers", json!({"name": "elasticity", "description": ELASTICITY}))
            .await?;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .post(
                "/hero_powers",
                json!({"strength": "Strong", "hero_id": 1, "power_id": 1}),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED);
        Ok(())
    }
}

fn validation_body() -> Value {
    json!({"errors": ["validation errors"]})
}

#[tokio::test]
async fn root_serves_banner() -> Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("<h1>Code Challenge</h1>".to_string()));
    Ok(())
}

#[tokio::test]
async fn health_reports_database() -> Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app.get("/openapi.json").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/heroes/{id}"].is_object());
    assert!(body["paths"]["/hero_powers"].is_object());
    Ok(())
}

#[tokio::test]
async fn create_and_get_hero() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, created) = app
        .post("/heroes", json!({"name": "Doreen Green", "super_name": "Squirrel Girl"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Doreen Green");
    assert_eq!(created["hero_powers"], json!([]));

    let (status, fetched) = app.get(&format!("/heroes/{}", created["id"])).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, list) = app.get("/heroes").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        list,
        json!([{"id": created["id"], "name": "Doreen Green", "super_name": "Squirrel Girl"}])
    );
    Ok(())
}

#[tokio::test]
async fn hero_validation_rejects_missing_and_blank_fields() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.post("/heroes", json!({"name": "Kamala Khan"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());

    let (status, body) = app
        .post("/heroes", json!({"name": "   ", "super_name": "Ms. Marvel"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());

    let (status, body) = app.request(Method::POST, "/heroes", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());

    assert_eq!(app.count("heroes").await?, 0);
    Ok(())
}

#[tokio::test]
async fn missing_records_return_not_found() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.get("/heroes/99").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Hero not found"}));

    let (status, body) = app.get("/powers/99").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Power not found"}));

    let (status, body) = app.get("/hero_powers/99").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "HeroPower not found"}));

    let (status, body) = app.patch("/heroes/99", json!({"name": "Nobody"})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Hero not found"}));

    let (status, body) = app.delete("/powers/99").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Power not found"}));
    Ok(())
}

#[tokio::test]
async fn hero_update_keeps_omitted_fields() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app.patch("/heroes/1", json!({"super_name": "Kamala"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Kamala Khan");
    assert_eq!(body["super_name"], "Kamala");
    assert_eq!(body["hero_powers"][0]["power"]["name"], "flight");

    let (status, body) = app
        .request(Method::PUT, "/heroes/1", Some(json!({"name": "K. Khan"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "K. Khan");
    assert_eq!(body["super_name"], "Kamala");

    let (status, body) = app.patch("/heroes/1", json!({"name": ""})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());
    Ok(())
}

#[tokio::test]
async fn create_hero_power_nests_hero_and_power() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app
        .post(
            "/hero_powers",
            json!({"strength": "Average", "hero_id": 1, "power_id": 2}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["strength"], "Average");
    assert_eq!(body["hero"]["super_name"], "Ms. Marvel");
    assert_eq!(body["power"]["name"], "elasticity");

    let (status, hero) = app.get("/heroes/1").await?;
    assert_eq!(status, StatusCode::OK);
    let powers = hero["hero_powers"].as_array().cloned().unwrap_or_default();
    assert_eq!(powers.len(), 2);
    assert!(powers.iter().all(|hp| hp.get("hero").is_none()));

    let (status, power) = app.get("/powers/2").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(power["hero_powers"][0]["hero"]["name"], "Kamala Khan");
    assert!(power["hero_powers"][0].get("power").is_none());

    let (status, list) = app.get("/hero_powers").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn hero_power_rejects_unknown_strength() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    for strength in ["Mighty", "strong", ""] {
        let (status, body) = app
            .post(
                "/hero_powers",
                json!({"strength": strength, "hero_id": 1, "power_id": 2}),
            )
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "strength {strength:?}");
        assert_eq!(body, validation_body());
    }

    let (status, body) = app
        .post("/hero_powers", json!({"strength": "Weak", "hero_id": 1}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());

    assert_eq!(app.count("hero_powers").await?, 1);
    Ok(())
}

#[tokio::test]
async fn hero_power_with_dangling_reference_is_a_constraint_violation() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app
        .post(
            "/hero_powers",
            json!({"strength": "Weak", "hero_id": 42, "power_id": 1}),
        )
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Constraint violation"}));
    assert_eq!(app.count("hero_powers").await?, 1);
    Ok(())
}

#[tokio::test]
async fn power_create_requires_long_description() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .post("/powers", json!({"name": "blink", "description": "teleports"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());
    assert_eq!(app.count("powers").await?, 0);
    Ok(())
}

#[tokio::test]
async fn rejected_power_update_changes_nothing() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app
        .patch("/powers/1", json!({"name": "hover", "description": "too short"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());

    let (status, power) = app.get("/powers/1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(power["name"], "flight");
    assert_eq!(power["description"], FLIGHT);
    Ok(())
}

#[tokio::test]
async fn power_update_accepts_valid_changes() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app
        .patch("/powers/1", json!({"description": "soars above the clouds without any help"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "flight");
    assert_eq!(body["description"], "soars above the clouds without any help");
    assert_eq!(body["hero_powers"][0]["hero"]["name"], "Kamala Khan");

    let (status, body) = app
        .request(Method::PUT, "/powers/2", Some(json!({"name": "stretch"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "stretch");
    assert_eq!(body["description"], ELASTICITY);
    Ok(())
}

#[tokio::test]
async fn deleting_hero_removes_its_hero_powers() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app.delete("/heroes/1").await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    assert_eq!(app.count("heroes").await?, 0);
    assert_eq!(app.count("hero_powers").await?, 0);
    assert_eq!(app.count("powers").await?, 2);

    let (status, _) = app.get("/heroes/1").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deleting_power_removes_its_hero_powers() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, _) = app.delete("/powers/1").await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(app.count("powers").await?, 1);
    assert_eq!(app.count("hero_powers").await?, 0);

    let (status, hero) = app.get("/heroes/1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hero["hero_powers"], json!([]));
    Ok(())
}

#[tokio::test]
async fn deleting_hero_power_keeps_hero_and_power() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, _) = app.delete("/hero_powers/1").await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.delete("/hero_powers/1").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "HeroPower not found"}));

    assert_eq!(app.count("heroes").await?, 1);
    assert_eq!(app.count("powers").await?, 2);
    Ok(())
}

#[tokio::test]
async fn responses_carry_request_id() -> Result<()> {
    let app = TestApp::new().await?;

    let request = Request::builder()
        .uri("/heroes")
        .header("x-request-id", "01HZX3J0000000000000000000")
        .body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("01HZX3J0000000000000000000")
    );

    let request = Request::builder().uri("/powers").body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn update_of_missing_record_is_not_found_even_with_bad_body() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app
        .patch("/powers/99", json!({"description": "too short"}))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Power not found"}));

    let (status, body) = app.request(Method::PATCH, "/powers/99", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Power not found"}));

    let (status, body) = app
        .request(Method::PUT, "/heroes/99", Some(json!({"name": ""})))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Hero not found"}));

    let (status, body) = app.request(Method::PATCH, "/heroes/99", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Hero not found"}));

    // Existing records still report the bad body.
    let (status, body) = app.request(Method::PATCH, "/powers/1", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());

    let (status, body) = app
        .request(Method::PUT, "/heroes/1", Some(json!({"name": ""})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());
    Ok(())
}

#[tokio::test]
async fn power_rename_keeps_stored_description() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed().await?;

    let (status, body) = app.patch("/powers/1", json!({"name": "soaring"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "soaring");
    assert_eq!(body["description"], FLIGHT);

    let (status, body) = app.patch("/powers/1", json!({"name": ""})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, validation_body());

    let (_, power) = app.get("/powers/1").await?;
    assert_eq!(power["name"], "soaring");
    Ok(())
}

#[tokio::test]
async fn health_sets_app_header() -> Result<()> {
    let app = TestApp::new().await?;

    let request = Request::builder().uri("/health").body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let short_hash = crate::GIT_COMMIT_HASH
        .get(..7)
        .unwrap_or(crate::GIT_COMMIT_HASH);
    let expected = format!(
        "{}:{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_hash
    );
    assert_eq!(
        response
            .headers()
            .get("X-App")
            .and_then(|value| value.to_str().ok()),
        Some(expected.as_str())
    );

    let request = Request::builder()
        .method(Method::HEAD)
        .uri("/health")
        .body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
    Ok(())
}
