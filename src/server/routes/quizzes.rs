use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, questions},
        Question,
    },
    server::{
        app::AppState,
        error::{ApiError, ApiResponse},
        extract::AppJson,
    },
    telemetry::QUIZ_QUESTION_CNTR,
};

/// Category id the quiz page sends when the player picks "All".
pub const ALL_CATEGORIES: i64 = 0;

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(rename = "type")]
    kind: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    id: i64,
}

#[derive(Deserialize)]
struct QuizBody {
    previous_questions: Vec<i64>,
    quiz_category: QuizCategory,
}

/// `question` is `null` once every question of the category was played.
#[derive(Serialize)]
struct QuizQuestion {
    question: Option<Question>,
}

fn next_question(pool: Vec<Question>, previous: &[i64]) -> Option<Question> {
    pool.into_iter().find(|q| !previous.contains(&q.id))
}

async fn play_quiz(
    State(pool): State<SqlitePool>,
    AppJson(body): AppJson<QuizBody>,
) -> ApiResponse<QuizQuestion> {
    let QuizBody {
        previous_questions,
        quiz_category,
    } = body;

    let (candidates, label) = if quiz_category.id == ALL_CATEGORIES {
        (questions::get_questions_by_id(&pool).await?, "all".to_owned())
    } else {
        let category = categories::find_category_by_type(&pool, &quiz_category.kind)
            .await?
            .ok_or(ApiError::Unprocessable)?;
        if category.id != quiz_category.id {
            tracing::debug!(
                requested = quiz_category.id,
                stored = category.id,
                "Quiz category id does not match its type"
            );
            return Err(ApiError::Unprocessable);
        }
        (
            questions::get_questions_for_category(&pool, category.id).await?,
            category.kind,
        )
    };

    let question = next_question(candidates, &previous_questions);
    match &question {
        Some(q) => {
            QUIZ_QUESTION_CNTR.with_label_values(&[label.as_str()]).inc();
            tracing::debug!(id = q.id, category = %label, "Next quiz question");
        }
        None => tracing::debug!(category = %label, "Quiz exhausted"),
    }
    Ok(Json(QuizQuestion { question }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(play_quiz))
        .with_state(state)
}
