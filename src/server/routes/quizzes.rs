use axum::{extract::State, routing::post, Json, Router};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::questions::{get_all_questions, get_questions_for_category},
        Question,
    },
    server::{
        app::AppState, deserializers::deserialize_optional_int, error::ApiError,
        extract::ApiJson,
    },
    telemetry::QUIZ_CNTR,
};

use super::ApiResponse;

#[derive(Deserialize)]
struct QuizBody {
    #[serde(default)]
    previous_questions: Option<Vec<Value>>,
    #[serde(default)]
    quiz_category: Option<QuizCategory>,
}

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(default, deserialize_with = "deserialize_optional_int")]
    id: Option<i64>,
}

#[derive(Serialize)]
struct QuizQuestion {
    success: bool,
    question: Question,
}

/// Picks a random candidate whose serialized form is not among `previous`.
/// Entries are compared as whole JSON values, so anything other than an exact
/// formatted question never matches. `None` once every candidate has been asked.
fn pick_unseen(
    candidates: Vec<Question>,
    previous: &[Value],
) -> Result<Option<Question>, serde_json::Error> {
    let mut unseen = Vec::with_capacity(candidates.len());
    for question in candidates {
        if !previous.contains(&serde_json::to_value(&question)?) {
            unseen.push(question);
        }
    }
    Ok(unseen.choose(&mut rand::thread_rng()).cloned())
}

async fn next_question(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<QuizBody>,
) -> ApiResponse<Json<QuizQuestion>> {
    let previous = body.previous_questions.unwrap_or_default();

    // category 0 is the frontend's "all categories"
    let category = body.quiz_category.and_then(|c| c.id).filter(|id| *id != 0);
    let candidates = match category {
        Some(id) => get_questions_for_category(&pool, id).await?,
        None => get_all_questions(&pool).await?,
    };
    tracing::debug!(
        "Quiz over {} candidates, {} already asked",
        candidates.len(),
        previous.len()
    );

    let question = pick_unseen(candidates, &previous)?.ok_or(ApiError::QuizExhausted)?;
    let label = category.map_or_else(|| "all".to_owned(), |id| id.to_string());
    QUIZ_CNTR.with_label_values(&[label.as_str()]).inc();

    Ok(Json(QuizQuestion {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_question))
        .with_state(state)
}
