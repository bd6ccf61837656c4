//! Response service: submissions and their answers.

use chrono::Utc;
use formkit_common::{AppError, AppResult, IdGenerator};
use formkit_db::{
    entities::{answer, response},
    repositories::{
        AnswerRepository, FormRepository, QuestionRepository, ResponseRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;
use validator::Validate;

use super::form::ensure_editable;
use crate::validation::{check_accepting_responses, validate_answers};

/// Response service for business logic.
#[derive(Clone)]
pub struct ResponseService {
    response_repo: ResponseRepository,
    answer_repo: AnswerRepository,
    form_repo: FormRepository,
    question_repo: QuestionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// One answer inside a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    #[serde(alias = "question")]
    pub question_id: String,

    /// String for text questions, list of labels otherwise.
    #[serde(alias = "text_answer")]
    pub value: JsonValue,
}

/// A complete submission.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitResponseInput {
    #[serde(alias = "form")]
    pub form_id: String,

    pub submitted_by: Option<String>,

    #[validate(ip)]
    pub ip_address: Option<String>,

    #[validate(length(max = 1024))]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// Client metadata edit. Answers are never edited.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateResponseInput {
    #[validate(ip)]
    pub ip_address: Option<String>,

    #[validate(length(max = 1024))]
    pub user_agent: Option<String>,
}

/// A response with its answers.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseWithAnswers {
    #[serde(flatten)]
    pub response: response::Model,
    pub answers: Vec<answer::Model>,
}

impl ResponseService {
    /// Create a new response service.
    #[must_use]
    pub const fn new(
        response_repo: ResponseRepository,
        answer_repo: AnswerRepository,
        form_repo: FormRepository,
        question_repo: QuestionRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            response_repo,
            answer_repo,
            form_repo,
            question_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate and store a submission with all of its answers.
    ///
    /// Nothing is written unless every answer passes.
    pub async fn submit(&self, input: SubmitResponseInput) -> AppResult<ResponseWithAnswers> {
        input.validate()?;

        let now = Utc::now();
        let form = self.form_repo.get_by_id(&input.form_id).await?;
        check_accepting_responses(&form, now)?;

        let questions = self.question_repo.find_by_form(&form.id).await?;
        let raw: Vec<(String, JsonValue)> = input
            .answers
            .into_iter()
            .map(|a| (a.question_id, a.value))
            .collect();
        let validated = validate_answers(&questions, &raw)?;

        if let Some(user_id) = &input.submitted_by {
            if self.user_repo.find_by_id(user_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "Unknown submitter: {user_id}"
                )));
            }
        }

        let response_id = self.id_gen.generate();
        let model = response::ActiveModel {
            id: Set(response_id.clone()),
            form_id: Set(form.id.clone()),
            submitted_by: Set(input.submitted_by),
            submitted_at: Set(now.into()),
            ip_address: Set(input.ip_address),
            user_agent: Set(input.user_agent),
        };

        let answers = validated
            .into_iter()
            .map(|(question_id, value)| answer::ActiveModel {
                id: Set(self.id_gen.generate()),
                response_id: Set(response_id.clone()),
                question_id: Set(question_id),
                value: Set(value.to_json()),
            })
            .collect();

        let (response, answers) = self
            .response_repo
            .create_with_answers(model, answers)
            .await?;
        info!(
            response_id = %response.id,
            form_id = %form.id,
            answers = answers.len(),
            "Response submitted"
        );

        Ok(ResponseWithAnswers { response, answers })
    }

    /// Get a response with its answers.
    pub async fn get(&self, id: &str) -> AppResult<ResponseWithAnswers> {
        let response = self.response_repo.get_by_id(id).await?;
        let answers = self.answer_repo.find_by_response(id).await?;
        Ok(ResponseWithAnswers { response, answers })
    }

    /// List responses, optionally for one form.
    pub async fn list(&self, form_id: Option<&str>) -> AppResult<Vec<response::Model>> {
        self.response_repo.find_all(form_id).await
    }

    /// Responses to a form. Fails if the form does not exist.
    pub async fn list_for_form(&self, form_id: &str) -> AppResult<Vec<response::Model>> {
        self.form_repo.get_by_id(form_id).await?;
        self.response_repo.find_by_form(form_id).await
    }

    /// Edit client metadata. Absent fields are left alone.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: UpdateResponseInput,
    ) -> AppResult<response::Model> {
        self.apply(id, user_id, input, false).await
    }

    /// Replace client metadata. Absent fields are cleared.
    pub async fn replace(
        &self,
        id: &str,
        user_id: &str,
        input: UpdateResponseInput,
    ) -> AppResult<response::Model> {
        self.apply(id, user_id, input, true).await
    }

    async fn apply(
        &self,
        id: &str,
        user_id: &str,
        input: UpdateResponseInput,
        replace: bool,
    ) -> AppResult<response::Model> {
        input.validate()?;

        let response = self.response_repo.get_by_id(id).await?;
        let form = self.form_repo.get_by_id(&response.form_id).await?;
        ensure_editable(&form, user_id)?;

        let mut active: response::ActiveModel = response.into();
        if replace || input.ip_address.is_some() {
            active.ip_address = Set(input.ip_address);
        }
        if replace || input.user_agent.is_some() {
            active.user_agent = Set(input.user_agent);
        }

        self.response_repo.update(active).await
    }

    /// Delete a response and its answers.
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        let response = self.response_repo.get_by_id(id).await?;
        let form = self.form_repo.get_by_id(&response.form_id).await?;
        ensure_editable(&form, user_id)?;

        self.response_repo.delete(id).await?;
        info!(response_id = %id, "Response deleted");

        Ok(())
    }

    /// Get an answer by ID.
    pub async fn get_answer(&self, id: &str) -> AppResult<answer::Model> {
        self.answer_repo.get_by_id(id).await
    }

    /// List answers, optionally for one response.
    pub async fn list_answers(&self, response_id: Option<&str>) -> AppResult<Vec<answer::Model>> {
        self.answer_repo.find_all(response_id).await
    }
}
