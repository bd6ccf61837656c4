//! Response repository.

use std::sync::Arc;

use crate::entities::{Response, answer, response};
use formkit_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

/// Response repository for database operations.
#[derive(Clone)]
pub struct ResponseRepository {
    db: Arc<DatabaseConnection>,
}

impl ResponseRepository {
    /// Create a new response repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a response by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<response::Model>> {
        Response::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a response by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<response::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResponseNotFound(id.to_string()))
    }

    /// List responses, newest first, optionally restricted to one form.
    pub async fn find_all(&self, form_id: Option<&str>) -> AppResult<Vec<response::Model>> {
        let mut query = Response::find();

        if let Some(form_id) = form_id {
            query = query.filter(response::Column::FormId.eq(form_id));
        }

        query
            .order_by_desc(response::Column::SubmittedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Responses to a form, newest first.
    pub async fn find_by_form(&self, form_id: &str) -> AppResult<Vec<response::Model>> {
        self.find_all(Some(form_id)).await
    }

    /// Persist a response together with its answers in one transaction.
    ///
    /// If any insert fails the transaction is dropped uncommitted, so neither the
    /// response nor any of its answers remain.
    pub async fn create_with_answers(
        &self,
        model: response::ActiveModel,
        answers: Vec<answer::ActiveModel>,
    ) -> AppResult<(response::Model, Vec<answer::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut saved = Vec::with_capacity(answers.len());
        for answer in answers {
            saved.push(
                answer
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            );
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((created, saved))
    }

    /// Update a response.
    pub async fn update(&self, model: response::ActiveModel) -> AppResult<response::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a response and its answers.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Response::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
