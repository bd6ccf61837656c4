//! Question repository.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entities::{Form, Question, question};
use formkit_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};

/// Capacity rule: receives the form's current question count and the number
/// being added.
pub type CapacityCheck = fn(u64, u64) -> AppResult<()>;

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

/// Unique index hits on `(form_id, display_order)` surface as conflicts.
fn map_write_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => {
            AppError::Conflict(format!("Question order already taken: {msg}"))
        }
        _ => AppError::Database(e.to_string()),
    }
}

fn target_form(model: &question::ActiveModel) -> AppResult<String> {
    match &model.form_id {
        ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Ok(id.clone()),
        ActiveValue::NotSet => Err(AppError::Internal(
            "Question write without a form".to_string(),
        )),
    }
}

/// Lock the form row, then run `check` against its question count.
async fn reserve(
    txn: &DatabaseTransaction,
    form_id: &str,
    adding: u64,
    check: CapacityCheck,
) -> AppResult<()> {
    Form::find_by_id(form_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::FormNotFound(form_id.to_string()))?;

    let existing = Question::find()
        .filter(question::Column::FormId.eq(form_id))
        .count(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    check(existing, adding)
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a question by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a question by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<question::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(id.to_string()))
    }

    /// List every question, grouped by form and ordered within it.
    pub async fn find_all(&self) -> AppResult<Vec<question::Model>> {
        Question::find()
            .order_by_asc(question::Column::FormId)
            .order_by_asc(question::Column::DisplayOrder)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Questions of a form in display order.
    pub async fn find_by_form(&self, form_id: &str) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::FormId.eq(form_id))
            .order_by_asc(question::Column::DisplayOrder)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count questions on a form.
    pub async fn count_by_form(&self, form_id: &str) -> AppResult<u64> {
        Question::find()
            .filter(question::Column::FormId.eq(form_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether another question on the form already sits at `order`.
    pub async fn exists_with_order(
        &self,
        form_id: &str,
        order: i32,
        excluding: Option<&str>,
    ) -> AppResult<bool> {
        let mut query = Question::find()
            .filter(question::Column::FormId.eq(form_id))
            .filter(question::Column::DisplayOrder.eq(order));

        if let Some(id) = excluding {
            query = query.filter(question::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Create a new question, holding the form's capacity lock while inserting.
    pub async fn create(
        &self,
        model: question::ActiveModel,
        check: CapacityCheck,
    ) -> AppResult<question::Model> {
        self.create_many(vec![model], check)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Question insert returned no row".to_string()))
    }

    /// Insert a batch of questions in one transaction. Either all rows land or none do.
    ///
    /// Each target form row is locked before its questions are counted, so
    /// concurrent writers to one form are serialized and `check` sees the
    /// committed count.
    pub async fn create_many(
        &self,
        models: Vec<question::ActiveModel>,
        check: CapacityCheck,
    ) -> AppResult<Vec<question::Model>> {
        // BTreeMap keeps lock order stable across writers
        let mut additions: BTreeMap<String, u64> = BTreeMap::new();
        for model in &models {
            *additions.entry(target_form(model)?).or_default() += 1;
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for (form_id, adding) in &additions {
            reserve(&txn, form_id, *adding, check).await?;
        }

        let mut created = Vec::with_capacity(models.len());
        for model in models {
            // Dropping `txn` on error rolls the batch back
            created.push(model.insert(&txn).await.map_err(map_write_err)?);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Update a question in place.
    pub async fn update(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Update a question that moves to another form, under that form's capacity lock.
    pub async fn relocate(
        &self,
        model: question::ActiveModel,
        check: CapacityCheck,
    ) -> AppResult<question::Model> {
        let form_id = target_form(&model)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        reserve(&txn, &form_id, 1, check).await?;
        let updated = model.update(&txn).await.map_err(map_write_err)?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Delete a question and its answers.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Question::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::form;
    use question::QuestionType;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};
    use serde_json::json;

    fn create_test_question(id: &str, form_id: &str, order: i32) -> question::Model {
        question::Model {
            id: id.to_string(),
            form_id: form_id.to_string(),
            text: format!("Question {order}"),
            question_type: QuestionType::Checkbox,
            options: Some(json!(["A", "B", "C"])),
            display_order: order,
            is_required: false,
            help_text: None,
        }
    }

    fn to_active(model: &question::Model) -> question::ActiveModel {
        question::ActiveModel {
            id: Set(model.id.clone()),
            form_id: Set(model.form_id.clone()),
            text: Set(model.text.clone()),
            question_type: Set(model.question_type),
            options: Set(model.options.clone()),
            display_order: Set(model.display_order),
            is_required: Set(model.is_required),
            help_text: Set(model.help_text.clone()),
        }
    }

    #[tokio::test]
    async fn test_find_by_form_keeps_order() {
        let q1 = create_test_question("q1", "form1", 0);
        let q2 = create_test_question("q2", "form1", 1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[q1, q2]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let questions = repo.find_by_form("form1").await.unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[1].display_order, 1);
    }

    #[tokio::test]
    async fn test_count_by_form() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(100))
                }]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        assert_eq!(repo.count_by_form("form1").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_exists_with_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(1)) }],
                    [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(0)) }],
                ])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        assert!(repo.exists_with_order("form1", 0, None).await.unwrap());
        assert!(!repo.exists_with_order("form1", 0, Some("q1")).await.unwrap());
    }

    fn create_test_form(id: &str) -> form::Model {
        form::Model {
            id: id.to_string(),
            title: "Survey".to_string(),
            description: None,
            status: form::FormStatus::Draft,
            deadline: None,
            created_by: None,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    fn insert_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn at_most_three(existing: u64, adding: u64) -> AppResult<()> {
        if existing + adding > 3 {
            return Err(AppError::LimitExceeded(format!("{existing} + {adding}")));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_create_many_commits_batch() {
        let q1 = create_test_question("q1", "form1", 0);
        let q2 = create_test_question("q2", "form1", 1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_form("form1")]])
                .append_query_results([count_row(1)])
                .append_query_results([[q1.clone()], [q2.clone()]])
                .append_exec_results([insert_ok(), insert_ok()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let created = repo
            .create_many(vec![to_active(&q1), to_active(&q2)], at_most_three)
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[1].id, "q2");
    }

    #[tokio::test]
    async fn test_create_counts_under_form_lock() {
        let q1 = create_test_question("q1", "form1", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_form("form1")]])
                .append_query_results([count_row(0)])
                .append_query_results([[q1.clone()]])
                .append_exec_results([insert_ok()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(Arc::clone(&db));
        repo.create(to_active(&q1), at_most_three).await.unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let rendered = format!("{log:?}");
        assert!(rendered.contains("FOR UPDATE"), "{rendered}");
    }

    #[tokio::test]
    async fn test_create_many_over_capacity_inserts_nothing() {
        // A concurrent writer filled the form after the caller's own checks
        let q1 = create_test_question("q1", "form1", 2);
        let q2 = create_test_question("q2", "form1", 3);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_form("form1")]])
                .append_query_results([count_row(2)])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo
            .create_many(vec![to_active(&q1), to_active(&q2)], at_most_three)
            .await;

        assert!(matches!(result, Err(AppError::LimitExceeded(_))));
    }

    #[tokio::test]
    async fn test_create_on_missing_form() {
        let q1 = create_test_question("q1", "gone", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<form::Model>::new()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.create(to_active(&q1), at_most_three).await;

        assert!(matches!(result, Err(AppError::FormNotFound(_))));
    }

    #[tokio::test]
    async fn test_relocate_into_full_form_fails() {
        let moved = create_test_question("q1", "form2", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_form("form2")]])
                .append_query_results([count_row(3)])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.relocate(to_active(&moved), at_most_three).await;

        assert!(matches!(result, Err(AppError::LimitExceeded(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.get_by_id("q9").await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }
}
