//! Question service.

use std::collections::{HashMap, HashSet};

use formkit_common::{AppError, AppResult, IdGenerator, ItemError};
use formkit_db::{
    entities::{
        form,
        question::{self, QuestionType},
    },
    repositories::{FormRepository, QuestionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::info;
use validator::Validate;

use super::form::ensure_editable;
use crate::validation::{check_order, check_question_capacity, normalize_options};

/// Question service for business logic.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    form_repo: FormRepository,
    id_gen: IdGenerator,
}

/// Input for creating a question, also used for full replacement.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionInput {
    #[serde(alias = "form")]
    pub form_id: String,

    #[validate(length(min = 1, max = 500))]
    pub text: String,

    #[serde(alias = "type")]
    pub question_type: QuestionType,

    #[serde(default)]
    pub options: Option<Vec<String>>,

    #[serde(default, alias = "order")]
    pub display_order: i32,

    #[serde(default)]
    pub is_required: bool,

    #[validate(length(max = 2000))]
    pub help_text: Option<String>,
}

/// Input for a partial question update. `null` clears the help text.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuestionInput {
    #[serde(alias = "form")]
    pub form_id: Option<String>,

    #[validate(length(min = 1, max = 500))]
    pub text: Option<String>,

    #[serde(alias = "type")]
    pub question_type: Option<QuestionType>,

    pub options: Option<Vec<String>>,

    #[serde(alias = "order")]
    pub display_order: Option<i32>,

    pub is_required: Option<bool>,

    #[serde(default, deserialize_with = "formkit_common::nullable::deserialize")]
    #[validate(length(max = 2000))]
    pub help_text: Option<Option<String>>,
}

struct QuestionChanges {
    form_id: Option<String>,
    text: Option<String>,
    question_type: Option<QuestionType>,
    options: Option<Vec<String>>,
    display_order: Option<i32>,
    is_required: Option<bool>,
    help_text: Option<Option<String>>,
}

fn options_json(options: Option<Vec<String>>) -> Option<JsonValue> {
    options.map(JsonValue::from)
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    pub const fn new(question_repo: QuestionRepository, form_repo: FormRepository) -> Self {
        Self {
            question_repo,
            form_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a question by ID.
    pub async fn get(&self, id: &str) -> AppResult<question::Model> {
        self.question_repo.get_by_id(id).await
    }

    /// List every question.
    pub async fn list(&self) -> AppResult<Vec<question::Model>> {
        self.question_repo.find_all().await
    }

    /// Build the row for a validated input. Runs only the checks that need no I/O.
    fn prepare(&self, input: CreateQuestionInput) -> AppResult<question::ActiveModel> {
        input.validate()?;
        check_order(input.display_order)?;
        let options = normalize_options(input.question_type, input.options)?;

        Ok(question::ActiveModel {
            id: Set(self.id_gen.generate()),
            form_id: Set(input.form_id),
            text: Set(input.text),
            question_type: Set(input.question_type),
            options: Set(options_json(options)),
            display_order: Set(input.display_order),
            is_required: Set(input.is_required),
            help_text: Set(input.help_text),
        })
    }

    async fn editable_form(&self, form_id: &str, user_id: &str) -> AppResult<form::Model> {
        let form = self.form_repo.get_by_id(form_id).await?;
        ensure_editable(&form, user_id)?;
        Ok(form)
    }

    /// Add one question to a form.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateQuestionInput,
    ) -> AppResult<question::Model> {
        let form_id = input.form_id.clone();
        let order = input.display_order;
        let model = self.prepare(input)?;

        self.editable_form(&form_id, user_id).await?;

        if self
            .question_repo
            .exists_with_order(&form_id, order, None)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Form {form_id} already has a question at order {order}"
            )));
        }

        let question = self
            .question_repo
            .create(model, check_question_capacity)
            .await?;
        info!(question_id = %question.id, form_id = %form_id, "Question created");

        Ok(question)
    }

    /// Add a batch of questions. Either every item is stored or none is.
    ///
    /// Item-level failures are collected and reported together, keyed by position.
    /// The capacity check runs last, under the form locks, and fails the whole batch.
    pub async fn create_many(
        &self,
        user_id: &str,
        inputs: Vec<CreateQuestionInput>,
    ) -> AppResult<Vec<question::Model>> {
        if inputs.is_empty() {
            return Err(AppError::BadRequest("No questions given".to_string()));
        }

        let mut errors = Vec::new();
        let mut models = Vec::with_capacity(inputs.len());
        let mut slots: HashSet<(String, i32)> = HashSet::with_capacity(inputs.len());
        let mut forms: HashSet<String> = HashSet::new();

        for (index, input) in inputs.into_iter().enumerate() {
            let slot = (input.form_id.clone(), input.display_order);
            match self.prepare(input) {
                Ok(model) => {
                    if !slots.insert(slot.clone()) {
                        let err = AppError::Conflict(format!(
                            "Order {} is used twice for form {} in this batch",
                            slot.1, slot.0
                        ));
                        errors.push(ItemError::new(index, &err));
                        continue;
                    }
                    forms.insert(slot.0.clone());
                    models.push((index, slot, model));
                }
                Err(err) => errors.push(ItemError::new(index, &err)),
            }
        }

        // Forms are checked once each; every item on a bad form carries the error
        let mut form_errors: HashMap<String, AppError> = HashMap::new();
        for form_id in &forms {
            if let Err(err) = self.editable_form(form_id, user_id).await {
                form_errors.insert(form_id.clone(), err);
            }
        }

        for (index, (form_id, order), _) in &models {
            if let Some(err) = form_errors.get(form_id) {
                errors.push(ItemError::new(*index, err));
                continue;
            }
            if self
                .question_repo
                .exists_with_order(form_id, *order, None)
                .await?
            {
                let err = AppError::Conflict(format!(
                    "Form {form_id} already has a question at order {order}"
                ));
                errors.push(ItemError::new(*index, &err));
            }
        }

        if !errors.is_empty() {
            errors.sort_by_key(|e| e.index);
            return Err(AppError::InvalidItems(errors));
        }

        let created = self
            .question_repo
            .create_many(
                models.into_iter().map(|(_, _, model)| model).collect(),
                check_question_capacity,
            )
            .await?;
        info!(count = created.len(), "Questions created");

        Ok(created)
    }

    /// Apply a partial update.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: UpdateQuestionInput,
    ) -> AppResult<question::Model> {
        input.validate()?;

        let changes = QuestionChanges {
            form_id: input.form_id,
            text: input.text,
            question_type: input.question_type,
            options: input.options,
            display_order: input.display_order,
            is_required: input.is_required,
            help_text: input.help_text,
        };
        self.apply(id, user_id, changes).await
    }

    /// Replace every field of a question.
    pub async fn replace(
        &self,
        id: &str,
        user_id: &str,
        input: CreateQuestionInput,
    ) -> AppResult<question::Model> {
        input.validate()?;

        let changes = QuestionChanges {
            form_id: Some(input.form_id),
            text: Some(input.text),
            question_type: Some(input.question_type),
            options: Some(input.options.unwrap_or_default()),
            display_order: Some(input.display_order),
            is_required: Some(input.is_required),
            help_text: Some(input.help_text),
        };
        self.apply(id, user_id, changes).await
    }

    async fn apply(
        &self,
        id: &str,
        user_id: &str,
        changes: QuestionChanges,
    ) -> AppResult<question::Model> {
        let question = self.question_repo.get_by_id(id).await?;
        self.editable_form(&question.form_id, user_id).await?;

        let form_id = changes
            .form_id
            .unwrap_or_else(|| question.form_id.clone());
        let moved = form_id != question.form_id;
        if moved {
            self.editable_form(&form_id, user_id).await?;
        }

        let kind = changes.question_type.unwrap_or(question.question_type);
        let options = normalize_options(
            kind,
            Some(changes.options.unwrap_or_else(|| question.option_list())),
        )?;

        let order = changes.display_order.unwrap_or(question.display_order);
        check_order(order)?;
        if (moved || order != question.display_order)
            && self
                .question_repo
                .exists_with_order(&form_id, order, Some(id))
                .await?
        {
            return Err(AppError::Conflict(format!(
                "Form {form_id} already has a question at order {order}"
            )));
        }

        let mut active: question::ActiveModel = question.into();
        active.form_id = Set(form_id);
        active.question_type = Set(kind);
        active.options = Set(options_json(options));
        active.display_order = Set(order);
        if let Some(text) = changes.text {
            active.text = Set(text);
        }
        if let Some(is_required) = changes.is_required {
            active.is_required = Set(is_required);
        }
        if let Some(help_text) = changes.help_text {
            active.help_text = Set(help_text);
        }

        if moved {
            self.question_repo
                .relocate(active, check_question_capacity)
                .await
        } else {
            self.question_repo.update(active).await
        }
    }

    /// Delete a question and its answers.
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        let question = self.question_repo.get_by_id(id).await?;
        self.editable_form(&question.form_id, user_id).await?;

        self.question_repo.delete(id).await?;
        info!(question_id = %id, "Question deleted");

        Ok(())
    }
}
