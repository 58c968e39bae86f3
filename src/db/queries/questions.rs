use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY category, id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_questions_by_id(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await
}

pub async fn find_question(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Case-insensitive substring match on the question text.
///
/// sqlite `LIKE` only folds ASCII letters, so rows are matched here with
/// unicode lowercasing.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Question>> {
    let needle = term.to_lowercase();
    let questions = get_questions_by_id(pool).await?;
    Ok(questions
        .into_iter()
        .filter(|q| q.question.to_lowercase().contains(&needle))
        .collect())
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> sqlx::Result<i64> {
    let mut conn = pool.acquire().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Returns `false` when no row had the given id.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let mut conn = pool.acquire().await?;

    let affected = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    Ok(affected > 0)
}

/// Inserts questions keeping their ids, overwriting existing rows with the same id.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for question in questions {
        sqlx::query(
            r#"
            INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                category = excluded.category,
                difficulty = excluded.difficulty
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(&question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory;

    fn new_question(text: &str, category: i64) -> NewQuestion {
        NewQuestion {
            question: text.to_owned(),
            answer: "answer".to_owned(),
            category,
            difficulty: 1,
        }
    }

    #[tokio::test]
    async fn questions_are_listed_by_category() {
        let pool = in_memory().await.unwrap();
        let a = create_question(&pool, &new_question("a", 4)).await.unwrap();
        let b = create_question(&pool, &new_question("b", 1)).await.unwrap();
        let c = create_question(&pool, &new_question("c", 4)).await.unwrap();

        let ids: Vec<i64> = get_all_questions(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, [b, a, c]);

        let history: Vec<i64> = get_questions_for_category(&pool, 4)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(history, [a, c]);
    }

    #[tokio::test]
    async fn search_ignores_case_and_treats_wildcards_literally() {
        let pool = in_memory().await.unwrap();
        create_question(&pool, &new_question("What is the TITLE of the book?", 2))
            .await
            .unwrap();
        create_question(&pool, &new_question("Who scored 100% in maths?", 1))
            .await
            .unwrap();

        assert_eq!(search_questions(&pool, "title").await.unwrap().len(), 1);
        assert_eq!(search_questions(&pool, "100%").await.unwrap().len(), 1);
        assert!(search_questions(&pool, "%%%x").await.unwrap().is_empty());
        assert!(search_questions(&pool, "_o_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let pool = in_memory().await.unwrap();
        let id = create_question(&pool, &new_question("Who painted Émile Zola?", 2))
            .await
            .unwrap();
        create_question(&pool, &new_question("Who wrote Germinal?", 2))
            .await
            .unwrap();

        let found = search_questions(&pool, "ÉMILE").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(search_questions(&pool, "émile zola").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_then_delete_keeps_count() {
        let pool = in_memory().await.unwrap();
        create_question(&pool, &new_question("kept", 3)).await.unwrap();
        let before = count_questions(&pool).await.unwrap();

        let id = create_question(&pool, &new_question("temporary", 3))
            .await
            .unwrap();
        assert_eq!(find_question(&pool, id).await.unwrap().unwrap().question, "temporary");
        assert!(delete_question(&pool, id).await.unwrap());
        assert!(find_question(&pool, id).await.unwrap().is_none());
        assert!(!delete_question(&pool, id).await.unwrap());

        assert_eq!(count_questions(&pool).await.unwrap(), before);
    }
}
