use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::{get_all_categories, to_category_map, CategoryMap},
            questions::{self, get_all_questions},
        },
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::deserialize_optional_int,
        error::ApiError,
        extract::{ApiJson, ApiPath, ApiQuery},
        pagination::{paginate, PageQuery},
    },
};

use super::ApiResponse;

// fields are optional so that a missing one is reported as a validation
// failure rather than a malformed body
#[derive(Deserialize)]
struct NewQuestionBody {
    question: Option<String>,
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_int")]
    difficulty: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_int")]
    category: Option<i64>,
}

impl NewQuestionBody {
    fn validate(&self) -> Result<NewQuestion<'_>, ApiError> {
        fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
            value.ok_or_else(|| ApiError::Validation(format!("{field} is required")))
        }
        Ok(NewQuestion {
            question: required(self.question.as_deref(), "question")?,
            answer: required(self.answer.as_deref(), "answer")?,
            difficulty: required(self.difficulty, "difficulty")?,
            category: required(self.category, "category")?,
        })
    }
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm", default)]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    categories: CategoryMap,
}

#[derive(Serialize)]
struct SearchResults {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct Deleted {
    success: bool,
    deleted: i64,
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct Created {
    success: bool,
    created: i64,
    questions: Vec<Question>,
    total_questions: usize,
}

async fn questions_page(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResponse<Json<QuestionsPage>> {
    let selection = get_all_questions(&pool).await?;
    let questions = paginate(query.page(), &selection);
    let categories = get_all_categories(&pool).await?;
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(QuestionsPage {
        success: true,
        questions,
        total_questions: selection.len(),
        categories: to_category_map(categories),
    }))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResponse<Json<Deleted>> {
    if questions::get_question_by_id(&pool, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    // another request may have removed it since the lookup
    if questions::delete_question(&pool, id).await? == 0 {
        return Err(ApiError::NotFound);
    }
    tracing::info!("Deleted question {id}");

    let selection = get_all_questions(&pool).await?;
    Ok(Json(Deleted {
        success: true,
        deleted: id,
        questions: paginate(query.page(), &selection),
        total_questions: selection.len(),
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
    ApiJson(body): ApiJson<NewQuestionBody>,
) -> ApiResponse<Json<Created>> {
    let id = questions::create_question(&pool, body.validate()?).await?;
    tracing::info!("Created question {id}");

    let selection = get_all_questions(&pool).await?;
    Ok(Json(Created {
        success: true,
        created: id,
        questions: paginate(query.page(), &selection),
        total_questions: selection.len(),
    }))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<Json<SearchResults>> {
    let term = body.search_term.unwrap_or_default();
    let selection = questions::search_questions(&pool, &term).await?;
    tracing::debug!("Search for {term:?} matched {} questions", selection.len());
    Ok(Json(SearchResults {
        success: true,
        questions: paginate(query.page(), &selection),
        total_questions: selection.len(),
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(questions_page).post(create_question))
        .route("/questions/{id}", delete(delete_question))
        .route("/questions/search", post(search_questions))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::testing::{seed, send, test_app, TestApp};

    fn ids(body: &Value) -> Vec<i64> {
        body["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn questions_are_paginated_by_ten() {
        let TestApp { app, pool } = test_app().await;
        seed(&pool, 25).await;

        let (status, body) = send(&app, "GET", "/questions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["total_questions"], 25);
        assert_eq!(ids(&body), (1..=10).collect::<Vec<_>>());
        assert_eq!(body["categories"]["1"], "Science");
        assert_eq!(
            body["questions"][0],
            json!({
                "id": 1,
                "question": "Question 1",
                "answer": "Answer 1",
                "difficulty": 2,
                "category": 1
            })
        );

        let (_, body) = send(&app, "GET", "/questions?page=3", None).await;
        assert_eq!(ids(&body), (21..=25).collect::<Vec<_>>());

        let (_, body) = send(&app, "GET", "/questions?page=abc", None).await;
        assert_eq!(ids(&body), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn page_past_the_end_is_404() {
        let TestApp { app, pool } = test_app().await;
        seed(&pool, 25).await;

        let (status, body) = send(&app, "GET", "/questions?page=4", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 404);

        let (status, _) = send(&app, "GET", "/questions?page=0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_question() {
        let TestApp { app, pool } = test_app().await;
        seed(&pool, 15).await;

        let (status, body) = send(&app, "DELETE", "/questions/5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["deleted"], 5);
        assert_eq!(body["total_questions"], 14);
        assert!(!ids(&body).contains(&5));

        let (_, first) = send(&app, "GET", "/questions", None).await;
        let (_, second) = send(&app, "GET", "/questions?page=2", None).await;
        assert_eq!(first["total_questions"], 14);
        assert!(!ids(&first).contains(&5));
        assert!(!ids(&second).contains(&5));

        let (status, body) = send(&app, "DELETE", "/questions/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Resource not found!");
    }

    #[tokio::test]
    async fn delete_uses_requested_page() {
        let TestApp { app, pool } = test_app().await;
        seed(&pool, 15).await;

        let (status, body) = send(&app, "DELETE", "/questions/1?page=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), (12..=15).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn create_appends_question() {
        let TestApp { app, pool } = test_app().await;
        seed(&pool, 10).await;

        let (status, body) = send(
            &app,
            "POST",
            "/questions",
            Some(json!({
                "question": "What is the heaviest organ in the human body?",
                "answer": "The liver",
                "difficulty": 4,
                "category": "1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["created"], 11);
        assert_eq!(body["total_questions"], 11);

        let (status, body) = send(&app, "GET", "/questions?page=2", None).await;
        assert_eq!(status, StatusCode::OK);
        let created: Vec<&Value> = body["questions"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|q| q["id"] == 11)
            .collect();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["answer"], "The liver");
        assert_eq!(created[0]["category"], 1);
    }

    #[tokio::test]
    async fn create_with_missing_or_malformed_fields_is_422() {
        let TestApp { app, .. } = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/questions",
            Some(json!({"question": "No answer?", "difficulty": 1, "category": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"success": false, "error": 422, "message": "Unprocessable Request!"})
        );

        let (status, _) = send(
            &app,
            "POST",
            "/questions",
            Some(json!({"question": "q", "answer": "a", "difficulty": "hard", "category": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn search_matches_substring_case_insensitively() {
        let TestApp { app, pool } = test_app().await;
        seed(&pool, 3).await;
        for question in [
            "Whose autobiography is entitled 'I Know Why the Caged Bird Sings'?",
            "What was the TITLE of the 1990 fantasy directed by Tim Burton?",
        ] {
            let (status, _) = send(
                &app,
                "POST",
                "/questions",
                Some(json!({"question": question, "answer": "a", "difficulty": 1, "category": 4})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            &app,
            "POST",
            "/questions/search",
            Some(json!({"searchTerm": "title"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_questions"], 2);
        assert_eq!(ids(&body), vec![4, 5]);
        assert!(body["questions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|q| q["question"].as_str().unwrap().to_lowercase().contains("title")));

        let (_, body) = send(&app, "POST", "/questions/search", Some(json!({"searchTerm": ""}))).await;
        assert_eq!(body["total_questions"], 5);

        let (_, body) = send(&app, "POST", "/questions/search", Some(json!({}))).await;
        assert_eq!(body["total_questions"], 5);

        let (status, body) = send(
            &app,
            "POST",
            "/questions/search",
            Some(json!({"searchTerm": "nothing like this"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_questions"], 0);
        assert_eq!(ids(&body), Vec::<i64>::new());
    }
}
