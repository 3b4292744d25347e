use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use crate::db::{self, queries::questions::create_question, NewQuestion};
use crate::server::app::{build_router, AppState};

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
}

pub async fn test_app() -> TestApp {
    let pool = db::in_memory().await.unwrap();
    let app = build_router(AppState::new(pool.clone()));
    TestApp { app, pool }
}

pub async fn create_category(pool: &SqlitePool, kind: &str) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO categories (type) VALUES (?1)
        "#,
    )
    .bind(kind)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Inserts the six standard categories (ids 1..=6) and `questions` questions
/// numbered from 1, assigned to the categories round robin.
pub async fn seed(pool: &SqlitePool, questions: i64) {
    for kind in ["Science", "Art", "Geography", "History", "Entertainment", "Sports"] {
        create_category(pool, kind).await.unwrap();
    }
    for i in 1..=questions {
        let question = format!("Question {i}");
        let answer = format!("Answer {i}");
        create_question(
            pool,
            NewQuestion {
                question: &question,
                answer: &answer,
                difficulty: i % 5 + 1,
                category: (i - 1) % 6 + 1,
            },
        )
        .await
        .unwrap();
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
