//! CSV import/export of the trivia tables.
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::queries::categories::{get_all_categories, import_categories};
use crate::db::queries::questions::{get_questions_by_id, import_questions};
use crate::db::{Category, Question};

const CATEGORIES_FILE: &str = "categories.csv";
const QUESTIONS_FILE: &str = "questions.csv";

fn write_to(path: &Path, data: Vec<impl Serialize>) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    let mut wtr = csv::Writer::from_writer(file);
    for line in data {
        wtr.serialize(line)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_from<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut out = Vec::new();
    for record in rdr.deserialize() {
        let record: T = record.with_context(|| format!("Bad record in {}", path.display()))?;
        out.push(record);
    }
    Ok(out)
}

pub async fn export_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories = get_all_categories(pool).await?;
    let questions = get_questions_by_id(pool).await?;
    if !dir.exists() {
        std::fs::create_dir_all(dir)?
    }
    tracing::info!(
        categories = categories.len(),
        questions = questions.len(),
        "Exporting to {}",
        dir.display()
    );
    write_to(&dir.join(CATEGORIES_FILE), categories)?;
    write_to(&dir.join(QUESTIONS_FILE), questions)?;
    Ok(())
}

/// Categories go first so imported questions can reference them.
pub async fn import_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories: Vec<Category> = read_from(&dir.join(CATEGORIES_FILE))?;
    let questions: Vec<Question> = read_from(&dir.join(QUESTIONS_FILE))?;
    tracing::info!(
        categories = categories.len(),
        questions = questions.len(),
        "Importing from {}",
        dir.display()
    );
    import_categories(pool, categories).await?;
    import_questions(pool, questions).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::questions::{count_questions, create_question, find_question};
    use crate::db::{in_memory, NewQuestion};

    #[tokio::test]
    async fn exported_data_imports_into_fresh_database() {
        let source = in_memory().await.unwrap();
        let id = create_question(
            &source,
            &NewQuestion {
                question: "Which planet is closest to the sun?".to_owned(),
                answer: "Mercury".to_owned(),
                category: 1,
                difficulty: 2,
            },
        )
        .await
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dump");
        export_data(&source, &out).await.unwrap();
        assert!(out.join(CATEGORIES_FILE).is_file());

        let target = in_memory().await.unwrap();
        import_data(&target, &out).await.unwrap();
        assert_eq!(count_questions(&target).await.unwrap(), 1);
        assert_eq!(
            find_question(&target, id).await.unwrap().unwrap().answer,
            "Mercury"
        );
        assert_eq!(get_all_categories(&target).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn import_fails_without_files() {
        let pool = in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(import_data(&pool, dir.path()).await.is_err());
    }
}
