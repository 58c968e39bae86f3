use std::ops::Range;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, questions},
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::{deserialize_lenient_page, deserialize_search_term},
        error::{ApiError, ApiResponse},
        extract::{AppJson, AppPath, AppQuery},
    },
    telemetry::QUESTION_CREATED_CNTR,
};

use super::{category_map, CategoryMap, QuestionList};

pub const QUESTIONS_PER_PAGE: usize = 10;

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default, deserialize_with = "deserialize_lenient_page")]
    page: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionsPage {
    questions: Vec<Question>,
    total_questions: usize,
    categories: CategoryMap,
    current_category: String,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm", default)]
    #[serde(deserialize_with = "deserialize_search_term")]
    search_term: Option<String>,
}

// `POST /questions` serves both creation and search, chosen by the presence of `searchTerm`
#[derive(Deserialize)]
struct QuestionsBody {
    #[serde(rename = "searchTerm", default)]
    #[serde(deserialize_with = "deserialize_search_term")]
    search_term: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
}

enum QuestionsRequest {
    Search(String),
    Create(NewQuestion),
}

impl TryFrom<QuestionsBody> for QuestionsRequest {
    type Error = ApiError;

    fn try_from(body: QuestionsBody) -> Result<Self, Self::Error> {
        if let Some(term) = body.search_term {
            return Ok(QuestionsRequest::Search(term));
        }
        match (body.question, body.answer, body.category, body.difficulty) {
            (Some(question), Some(answer), Some(category), Some(difficulty)) => {
                Ok(QuestionsRequest::Create(NewQuestion {
                    question,
                    answer,
                    category,
                    difficulty,
                }))
            }
            _ => Err(ApiError::Unprocessable),
        }
    }
}

#[derive(Serialize)]
struct Created {
    success: bool,
    created: i64,
}

#[derive(Serialize)]
struct Deleted {
    success: bool,
    question_id: i64,
}

#[derive(Serialize)]
#[serde(untagged)]
enum QuestionsResponse {
    Created(Created),
    Found(QuestionList),
}

/// Index range of `page` (1-based) among `total` items, `None` if the page is empty.
fn page_bounds(page: i64, total: usize) -> Option<Range<usize>> {
    let start = usize::try_from(page.checked_sub(1)?)
        .ok()?
        .checked_mul(QUESTIONS_PER_PAGE)?;
    if start >= total {
        return None;
    }
    Some(start..total.min(start + QUESTIONS_PER_PAGE))
}

async fn get_questions(
    State(pool): State<SqlitePool>,
    AppQuery(PageQuery { page }): AppQuery<PageQuery>,
) -> ApiResponse<QuestionsPage> {
    let mut all = questions::get_all_questions(&pool).await?;
    let total_questions = all.len();
    let range = page_bounds(page.unwrap_or(1), total_questions).ok_or(ApiError::NotFound)?;
    let page: Vec<Question> = all.drain(range).collect();

    let categories = category_map(categories::get_all_categories(&pool).await?);
    // the label follows the last question shown, not the whole listing
    let last_category = page.last().map(|q| q.category).ok_or(ApiError::NotFound)?;
    let current_category = categories.get(&last_category).cloned().ok_or_else(|| {
        ApiError::ServerError(format!(
            "question references unknown category {last_category}"
        ))
    })?;

    Ok(Json(QuestionsPage {
        questions: page,
        total_questions,
        categories,
        current_category,
    }))
}

async fn search(pool: &SqlitePool, term: &str) -> Result<QuestionList, ApiError> {
    let found = questions::search_questions(pool, term).await?;
    let last_category = found
        .last()
        .map(|q| q.category)
        .ok_or(ApiError::Unprocessable)?;
    let current_category = categories::find_category(pool, last_category)
        .await?
        .ok_or(ApiError::Unprocessable)?;
    tracing::debug!(term, found = found.len(), "Searched questions");
    Ok(QuestionList {
        total_questions: found.len(),
        questions: found,
        current_category: current_category.kind,
    })
}

async fn create(pool: &SqlitePool, question: NewQuestion) -> Result<Created, ApiError> {
    let id = questions::create_question(pool, &question).await?;
    QUESTION_CREATED_CNTR.inc();
    tracing::info!(id, category = question.category, "Created question");
    Ok(Created {
        success: true,
        created: id,
    })
}

async fn create_or_search_question(
    State(pool): State<SqlitePool>,
    AppJson(body): AppJson<QuestionsBody>,
) -> ApiResponse<QuestionsResponse> {
    let response = match QuestionsRequest::try_from(body)? {
        QuestionsRequest::Search(term) => QuestionsResponse::Found(search(&pool, &term).await?),
        QuestionsRequest::Create(question) => {
            QuestionsResponse::Created(create(&pool, question).await?)
        }
    };
    Ok(Json(response))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    AppJson(body): AppJson<SearchBody>,
) -> ApiResponse<QuestionList> {
    let term = body.search_term.ok_or(ApiError::BadRequest)?;
    Ok(Json(search(&pool, &term).await?))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    AppPath(question_id): AppPath<i64>,
) -> ApiResponse<Deleted> {
    questions::find_question(&pool, question_id)
        .await?
        .ok_or(ApiError::Unprocessable)?;
    if !questions::delete_question(&pool, question_id).await? {
        // removed by someone else in between
        return Err(ApiError::Unprocessable);
    }
    tracing::info!(question_id, "Deleted question");
    Ok(Json(Deleted {
        success: true,
        question_id,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/questions",
            get(get_questions).post(create_or_search_question),
        )
        .route("/questions/search", post(search_questions))
        .route("/questions/{question_id}", delete(delete_question))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> QuestionsBody {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn pages_are_sliced_by_ten() {
        assert_eq!(page_bounds(1, 19), Some(0..10));
        assert_eq!(page_bounds(2, 19), Some(10..19));
        assert_eq!(page_bounds(3, 19), None);
        assert_eq!(page_bounds(2, 20), Some(10..20));
        assert_eq!(page_bounds(1, 0), None);
        assert_eq!(page_bounds(0, 19), None);
        assert_eq!(page_bounds(-4, 19), None);
        assert_eq!(page_bounds(i64::MAX, 19), None);
    }

    #[test]
    fn search_term_wins_over_fields() {
        let request = QuestionsRequest::try_from(body(serde_json::json!({
            "searchTerm": "title",
            "question": "Q?",
        })))
        .unwrap();
        assert!(matches!(request, QuestionsRequest::Search(term) if term == "title"));
    }

    #[test]
    fn empty_search_term_means_create() {
        let request = QuestionsRequest::try_from(body(serde_json::json!({
            "searchTerm": "",
            "question": "Q?",
            "answer": "A",
            "category": "4",
            "difficulty": 1,
        })))
        .unwrap();
        match request {
            QuestionsRequest::Create(q) => {
                assert_eq!(q.question, "Q?");
                assert_eq!(q.category, 4);
                assert_eq!(q.difficulty, 1);
            }
            QuestionsRequest::Search(_) => panic!("expected create"),
        }
    }

    #[test]
    fn whitespace_search_term_still_searches() {
        let request =
            QuestionsRequest::try_from(body(serde_json::json!({"searchTerm": " "}))).unwrap();
        assert!(matches!(request, QuestionsRequest::Search(term) if term == " "));
    }

    #[test]
    fn missing_fields_are_unprocessable() {
        let result = QuestionsRequest::try_from(body(serde_json::json!({
            "question": "Q?",
            "answer": "A",
        })));
        assert!(matches!(result, Err(ApiError::Unprocessable)));
    }
}
