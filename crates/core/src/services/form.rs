//! Form service.

use chrono::{DateTime, FixedOffset, Utc};
use formkit_common::{AppError, AppResult, IdGenerator};
use formkit_db::{
    entities::{
        form::{self, FormStatus},
        question,
    },
    repositories::{FormRepository, QuestionRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::validation::{check_deadline, check_publishable};

/// Form service for business logic.
#[derive(Clone)]
pub struct FormService {
    form_repo: FormRepository,
    question_repo: QuestionRepository,
    id_gen: IdGenerator,
}

/// Input for creating a form, also used for full replacement.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFormInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: FormStatus,

    pub deadline: Option<DateTime<FixedOffset>>,
}

/// Input for a partial form update. Absent fields are left alone; `null`
/// clears a nullable field.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFormInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "formkit_common::nullable::deserialize")]
    #[validate(length(max = 5000))]
    pub description: Option<Option<String>>,

    pub status: Option<FormStatus>,

    #[serde(default, deserialize_with = "formkit_common::nullable::deserialize")]
    pub deadline: Option<Option<DateTime<FixedOffset>>>,
}

/// A form together with its questions in display order.
#[derive(Debug, Clone, Serialize)]
pub struct FormWithQuestions {
    #[serde(flatten)]
    pub form: form::Model,
    pub questions: Vec<question::Model>,
}

/// Field changes after PUT/PATCH normalization. `Some(None)` clears a nullable field.
#[derive(Debug, PartialEq, Eq)]
struct FormChanges {
    title: Option<String>,
    description: Option<Option<String>>,
    status: Option<FormStatus>,
    deadline: Option<Option<DateTime<FixedOffset>>>,
}

impl From<UpdateFormInput> for FormChanges {
    fn from(input: UpdateFormInput) -> Self {
        Self {
            title: input.title,
            description: input.description,
            status: input.status,
            deadline: input.deadline,
        }
    }
}

impl From<CreateFormInput> for FormChanges {
    fn from(input: CreateFormInput) -> Self {
        Self {
            title: Some(input.title),
            description: Some(input.description),
            status: Some(input.status),
            deadline: Some(input.deadline),
        }
    }
}

/// Fail with `Forbidden` unless `user_id` may change `form`.
pub fn ensure_editable(form: &form::Model, user_id: &str) -> AppResult<()> {
    if form.is_editable_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the form owner can change this form".to_string(),
        ))
    }
}

impl FormService {
    /// Create a new form service.
    #[must_use]
    pub const fn new(form_repo: FormRepository, question_repo: QuestionRepository) -> Self {
        Self {
            form_repo,
            question_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a form owned by `user_id`.
    ///
    /// A new form has no questions, so asking for `published` up front fails.
    pub async fn create(&self, user_id: &str, input: CreateFormInput) -> AppResult<form::Model> {
        input.validate()?;

        let now = Utc::now();
        if let Some(deadline) = &input.deadline {
            check_deadline(deadline, now)?;
        }
        if input.status == FormStatus::Published {
            check_publishable(0)?;
        }

        let model = form::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description),
            status: Set(input.status),
            deadline: Set(input.deadline),
            created_by: Set(Some(user_id.to_string())),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let form = self.form_repo.create(model).await?;
        info!(form_id = %form.id, user_id = %user_id, "Form created");

        Ok(form)
    }

    /// Get a form by ID.
    pub async fn get(&self, id: &str) -> AppResult<form::Model> {
        self.form_repo.get_by_id(id).await
    }

    /// Get a form with its ordered questions.
    pub async fn get_with_questions(&self, id: &str) -> AppResult<FormWithQuestions> {
        let form = self.form_repo.get_by_id(id).await?;
        let questions = self.question_repo.find_by_form(id).await?;
        Ok(FormWithQuestions { form, questions })
    }

    /// List every form.
    pub async fn list(&self) -> AppResult<Vec<form::Model>> {
        self.form_repo.find_all().await
    }

    /// List forms created by `user_id`.
    pub async fn list_owned(&self, user_id: &str) -> AppResult<Vec<form::Model>> {
        self.form_repo.find_by_owner(user_id).await
    }

    /// Questions of a form in display order. Fails if the form does not exist.
    pub async fn questions(&self, form_id: &str) -> AppResult<Vec<question::Model>> {
        self.form_repo.get_by_id(form_id).await?;
        self.question_repo.find_by_form(form_id).await
    }

    /// Apply a partial update.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: UpdateFormInput,
    ) -> AppResult<form::Model> {
        input.validate()?;

        self.apply(id, user_id, FormChanges::from(input)).await
    }

    /// Replace every editable field. Absent nullable fields are cleared.
    pub async fn replace(
        &self,
        id: &str,
        user_id: &str,
        input: CreateFormInput,
    ) -> AppResult<form::Model> {
        input.validate()?;

        self.apply(id, user_id, FormChanges::from(input)).await
    }

    async fn apply(&self, id: &str, user_id: &str, changes: FormChanges) -> AppResult<form::Model> {
        let form = self.form_repo.get_by_id(id).await?;
        ensure_editable(&form, user_id)?;

        let now = Utc::now();
        if let Some(Some(deadline)) = &changes.deadline {
            check_deadline(deadline, now)?;
        }

        let publishing = changes.status == Some(FormStatus::Published)
            && form.status != FormStatus::Published;
        if publishing {
            let count = self.question_repo.count_by_form(id).await?;
            check_publishable(count)?;

            let deadline = changes.deadline.unwrap_or(form.deadline);
            if let Some(deadline) = &deadline {
                check_deadline(deadline, now)?;
            }
        }

        let mut active: form::ActiveModel = form.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(deadline) = changes.deadline {
            active.deadline = Set(deadline);
        }
        active.updated_at = Set(Some(now.into()));

        let updated = self.form_repo.update(active).await?;
        if publishing {
            info!(form_id = %updated.id, "Form published");
        }

        Ok(updated)
    }

    /// Delete a form and everything under it.
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        let form = self.form_repo.get_by_id(id).await?;
        ensure_editable(&form, user_id)?;

        self.form_repo.delete(id).await?;
        info!(form_id = %id, "Form deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_form(id: &str, owner: Option<&str>, status: FormStatus) -> form::Model {
        form::Model {
            id: id.to_string(),
            title: "Survey".to_string(),
            description: None,
            status,
            deadline: None,
            created_by: owner.map(ToString::to_string),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(form_db: MockDatabase, question_db: MockDatabase) -> FormService {
        FormService::new(
            FormRepository::new(Arc::new(form_db.into_connection())),
            QuestionRepository::new(Arc::new(question_db.into_connection())),
        )
    }

    fn empty_db() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn count_db(n: i64) -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }]])
    }

    fn publish() -> UpdateFormInput {
        UpdateFormInput {
            status: Some(FormStatus::Published),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_form() {
        let form = create_test_form("form1", Some("user1"), FormStatus::Draft);
        let service = create_test_service(
            empty_db()
                .append_query_results([[form]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            empty_db(),
        );

        let created = service
            .create(
                "user1",
                CreateFormInput {
                    title: "Survey".to_string(),
                    description: None,
                    status: FormStatus::Draft,
                    deadline: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(created.created_by.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn test_create_published_fails_without_questions() {
        let service = create_test_service(empty_db(), empty_db());

        let result = service
            .create(
                "user1",
                CreateFormInput {
                    title: "Survey".to_string(),
                    description: None,
                    status: FormStatus::Published,
                    deadline: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_with_past_deadline_fails() {
        let service = create_test_service(empty_db(), empty_db());

        let result = service
            .create(
                "user1",
                CreateFormInput {
                    title: "Survey".to_string(),
                    description: None,
                    status: FormStatus::Draft,
                    deadline: Some((Utc::now() - Duration::days(1)).into()),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_validates_title() {
        let service = create_test_service(empty_db(), empty_db());

        let result = service
            .create(
                "user1",
                CreateFormInput {
                    title: String::new(),
                    description: None,
                    status: FormStatus::Draft,
                    deadline: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_publish_without_questions_fails() {
        let form = create_test_form("form1", Some("user1"), FormStatus::Draft);
        let service = create_test_service(empty_db().append_query_results([[form]]), count_db(0));

        let result = service.update("form1", "user1", publish()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_publish_with_question_succeeds() {
        let form = create_test_form("form1", Some("user1"), FormStatus::Draft);
        let published = create_test_form("form1", Some("user1"), FormStatus::Published);
        let service = create_test_service(
            empty_db()
                .append_query_results([[form]])
                .append_query_results([[published]]),
            count_db(1),
        );

        let updated = service.update("form1", "user1", publish()).await.unwrap();

        assert_eq!(updated.status, FormStatus::Published);
    }

    #[tokio::test]
    async fn test_publish_with_expired_deadline_fails() {
        let mut form = create_test_form("form1", Some("user1"), FormStatus::Draft);
        form.deadline = Some((Utc::now() - Duration::hours(2)).into());
        let service = create_test_service(empty_db().append_query_results([[form]]), count_db(3));

        let result = service.update("form1", "user1", publish()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let form = create_test_form("form1", Some("owner"), FormStatus::Draft);
        let service = create_test_service(empty_db().append_query_results([[form]]), empty_db());

        let result = service
            .update(
                "form1",
                "intruder",
                UpdateFormInput {
                    title: Some("Mine now".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_questions_of_missing_form() {
        let service = create_test_service(
            empty_db().append_query_results([Vec::<form::Model>::new()]),
            empty_db(),
        );

        let result = service.questions("missing").await;

        assert!(matches!(result, Err(AppError::FormNotFound(_))));
    }

    #[tokio::test]
    async fn test_questions_of_empty_form() {
        let form = create_test_form("form1", None, FormStatus::Draft);
        let service = create_test_service(
            empty_db().append_query_results([[form]]),
            empty_db().append_query_results([Vec::<question::Model>::new()]),
        );

        let questions = service.questions("form1").await.unwrap();

        assert!(questions.is_empty());
    }

    #[test]
    fn test_patch_null_clears_nullable_fields() {
        let input: UpdateFormInput =
            serde_json::from_str(r#"{"description": null, "deadline": null}"#).unwrap();

        assert_eq!(
            FormChanges::from(input),
            FormChanges {
                title: None,
                description: Some(None),
                status: None,
                deadline: Some(None),
            }
        );
    }

    #[test]
    fn test_patch_absent_fields_are_untouched() {
        let input: UpdateFormInput = serde_json::from_str(r#"{"title": "Renamed"}"#).unwrap();

        let changes = FormChanges::from(input);

        assert_eq!(changes.title.as_deref(), Some("Renamed"));
        assert_eq!(changes.description, None);
        assert_eq!(changes.deadline, None);
    }

    #[tokio::test]
    async fn test_update_clears_deadline() {
        let mut existing = create_test_form("form1", Some("user1"), FormStatus::Draft);
        existing.deadline = Some((Utc::now() + Duration::days(3)).into());
        let cleared = create_test_form("form1", Some("user1"), FormStatus::Draft);
        let service = create_test_service(
            empty_db()
                .append_query_results([[existing]])
                .append_query_results([[cleared]]),
            empty_db(),
        );
        let input: UpdateFormInput = serde_json::from_str(r#"{"deadline": null}"#).unwrap();

        let updated = service.update("form1", "user1", input).await.unwrap();

        assert!(updated.deadline.is_none());
    }
}
