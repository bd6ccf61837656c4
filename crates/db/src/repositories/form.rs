//! Form repository.

use std::sync::Arc;

use crate::entities::{Form, form};
use formkit_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Form repository for database operations.
#[derive(Clone)]
pub struct FormRepository {
    db: Arc<DatabaseConnection>,
}

impl FormRepository {
    /// Create a new form repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a form by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<form::Model>> {
        Form::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a form by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<form::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::FormNotFound(id.to_string()))
    }

    /// List every form, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<form::Model>> {
        Form::find()
            .order_by_desc(form::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List forms created by a user, newest first.
    pub async fn find_by_owner(&self, user_id: &str) -> AppResult<Vec<form::Model>> {
        Form::find()
            .filter(form::Column::CreatedBy.eq(user_id))
            .order_by_desc(form::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new form.
    pub async fn create(&self, model: form::ActiveModel) -> AppResult<form::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a form.
    pub async fn update(&self, model: form::ActiveModel) -> AppResult<form::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a form. Questions, responses and answers go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Form::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
