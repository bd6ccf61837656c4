//! Answer repository.

use std::sync::Arc;

use crate::entities::{Answer, answer};
use formkit_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Answer repository for database operations.
///
/// Answers are written only through
/// [`ResponseRepository::create_with_answers`](super::ResponseRepository::create_with_answers)
/// and never updated, so this repository only reads.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an answer by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an answer by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<answer::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Answer {id}")))
    }

    /// List answers, optionally restricted to one response.
    pub async fn find_all(&self, response_id: Option<&str>) -> AppResult<Vec<answer::Model>> {
        let mut query = Answer::find();

        if let Some(response_id) = response_id {
            query = query.filter(answer::Column::ResponseId.eq(response_id));
        }

        query
            .order_by_asc(answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Answers belonging to one response.
    pub async fn find_by_response(&self, response_id: &str) -> AppResult<Vec<answer::Model>> {
        self.find_all(Some(response_id)).await
    }

    /// Every answer given to one question, in submission order.
    pub async fn find_by_question(&self, question_id: &str) -> AppResult<Vec<answer::Model>> {
        Answer::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .order_by_asc(answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every answer given to any of the questions, in submission order.
    ///
    /// IDs are ULIDs, so ordering by ID follows insertion time.
    pub async fn find_by_questions(&self, question_ids: &[String]) -> AppResult<Vec<answer::Model>> {
        if question_ids.is_empty() {
            return Ok(vec![]);
        }

        Answer::find()
            .filter(answer::Column::QuestionId.is_in(question_ids.to_vec()))
            .order_by_asc(answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn create_test_answer(id: &str, response_id: &str, question_id: &str) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            response_id: response_id.to_string(),
            question_id: question_id.to_string(),
            value: json!(["A", "B"]),
        }
    }

    #[tokio::test]
    async fn test_find_by_questions_empty_skips_query() {
        // No query results appended: hitting the database would error
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = AnswerRepository::new(db);
        let answers = repo.find_by_questions(&[]).await.unwrap();

        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_questions() {
        let a1 = create_test_answer("a1", "r1", "q1");
        let a2 = create_test_answer("a2", "r2", "q2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a1, a2]])
                .into_connection(),
        );

        let repo = AnswerRepository::new(db);
        let answers = repo
            .find_by_questions(&["q1".to_string(), "q2".to_string()])
            .await
            .unwrap();

        assert_eq!(answers.len(), 2);
        assert_eq!(answers[1].question_id, "q2");
    }

    #[tokio::test]
    async fn test_find_by_response() {
        let a1 = create_test_answer("a1", "r1", "q1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a1]])
                .into_connection(),
        );

        let repo = AnswerRepository::new(db);
        let answers = repo.find_by_response("r1").await.unwrap();

        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].response_id, "r1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<answer::Model>::new()])
                .into_connection(),
        );

        let repo = AnswerRepository::new(db);
        assert!(matches!(
            repo.get_by_id("a9").await,
            Err(AppError::NotFound(_))
        ));
    }
}
