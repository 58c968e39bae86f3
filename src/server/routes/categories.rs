use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::queries::{categories, questions},
    server::{
        app::AppState,
        error::{ApiError, ApiResponse},
        extract::AppPath,
    },
};

use super::{category_map, CategoryMap, QuestionList};

#[derive(Serialize)]
struct CategoriesBody {
    categories: CategoryMap,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<CategoriesBody> {
    let categories = category_map(categories::get_all_categories(&pool).await?);
    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(CategoriesBody { categories }))
}

async fn get_category_questions(
    State(pool): State<SqlitePool>,
    AppPath(category_id): AppPath<i64>,
) -> ApiResponse<QuestionList> {
    let category = categories::find_category(&pool, category_id)
        .await?
        .ok_or(ApiError::Unprocessable)?;
    let questions = questions::get_questions_for_category(&pool, category.id).await?;
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(QuestionList {
        total_questions: questions.len(),
        questions,
        current_category: category.kind,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/{category_id}/questions", get(get_category_questions))
        .with_state(state)
}
