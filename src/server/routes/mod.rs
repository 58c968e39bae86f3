mod categories;
mod questions;
mod quizzes;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::{Category, Question};

pub use categories::category_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;

/// Category id to label, serialized as a json object keyed by id.
pub type CategoryMap = BTreeMap<i64, String>;

fn category_map(categories: Vec<Category>) -> CategoryMap {
    categories.into_iter().map(|c| (c.id, c.kind)).collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionList {
    questions: Vec<Question>,
    total_questions: usize,
    current_category: String,
}
