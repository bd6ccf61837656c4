//! Analytics service.

use std::collections::HashMap;

use formkit_common::AppResult;
use formkit_db::repositories::{AnswerRepository, FormRepository, QuestionRepository};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::analytics::{FormAnalytics, summarize};

/// Loads a form's questions and answers and summarizes them.
#[derive(Clone)]
pub struct AnalyticsService {
    form_repo: FormRepository,
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        form_repo: FormRepository,
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
    ) -> Self {
        Self {
            form_repo,
            question_repo,
            answer_repo,
        }
    }

    /// Summarize every question of a form, in question order.
    ///
    /// Recomputed from stored answers on every call.
    pub async fn compute(&self, form_id: &str) -> AppResult<FormAnalytics> {
        let form = self.form_repo.get_by_id(form_id).await?;
        let questions = self.question_repo.find_by_form(&form.id).await?;

        let question_ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let answers = self.answer_repo.find_by_questions(&question_ids).await?;
        let total_answers = answers.len();

        let mut by_question: HashMap<String, Vec<JsonValue>> = HashMap::new();
        for answer in answers {
            by_question
                .entry(answer.question_id)
                .or_default()
                .push(answer.value);
        }

        let mut analytics = FormAnalytics::new();
        for question in questions {
            let values = by_question.remove(&question.id).unwrap_or_default();
            analytics.push(question.id, summarize(question.question_type, &values));
        }

        info!(
            form_id = %form.id,
            questions = analytics.len(),
            answers = total_answers,
            "Computed form analytics"
        );

        Ok(analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::QuestionAnalytics;
    use chrono::Utc;
    use formkit_common::AppError;
    use formkit_db::entities::{
        answer,
        form::{self, FormStatus},
        question::{self, QuestionType},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_form() -> form::Model {
        form::Model {
            id: "form1".to_string(),
            title: "Survey".to_string(),
            description: None,
            status: FormStatus::Published,
            deadline: None,
            created_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_question(id: &str, kind: QuestionType, order: i32) -> question::Model {
        question::Model {
            id: id.to_string(),
            form_id: "form1".to_string(),
            text: "Question".to_string(),
            question_type: kind,
            options: kind.has_options().then(|| json!(["A", "B", "C", "X", "Y"])),
            display_order: order,
            is_required: false,
            help_text: None,
        }
    }

    fn create_test_answer(n: usize, question_id: &str, value: JsonValue) -> answer::Model {
        answer::Model {
            id: format!("a{n:02}"),
            response_id: format!("r{n:02}"),
            question_id: question_id.to_string(),
            value,
        }
    }

    fn create_test_service(
        form_db: MockDatabase,
        question_db: MockDatabase,
        answer_db: MockDatabase,
    ) -> AnalyticsService {
        AnalyticsService::new(
            FormRepository::new(Arc::new(form_db.into_connection())),
            QuestionRepository::new(Arc::new(question_db.into_connection())),
            AnswerRepository::new(Arc::new(answer_db.into_connection())),
        )
    }

    #[tokio::test]
    async fn test_compute_missing_form() {
        let service = create_test_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<form::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.compute("missing").await;

        assert!(matches!(&result, Err(e) if e.is_not_found()));
        assert!(matches!(result, Err(AppError::FormNotFound(_))));
    }

    #[tokio::test]
    async fn test_compute_groups_answers_by_question() {
        let questions = vec![
            create_test_question("q_text", QuestionType::Text, 0),
            create_test_question("q_check", QuestionType::Checkbox, 1),
            create_test_question("q_drop", QuestionType::Dropdown, 2),
            create_test_question("q_empty", QuestionType::Text, 3),
        ];
        let answers = vec![
            create_test_answer(1, "q_text", json!("apple banana")),
            create_test_answer(2, "q_check", json!(["A", "B"])),
            create_test_answer(3, "q_drop", json!(["X"])),
            create_test_answer(4, "q_text", json!("apple cherry")),
            create_test_answer(5, "q_check", json!(["B", "A"])),
            create_test_answer(6, "q_drop", json!(["Y"])),
            create_test_answer(7, "q_text", json!("apple cherry")),
            create_test_answer(8, "q_check", json!(["C"])),
            create_test_answer(9, "q_drop", json!(["X"])),
            create_test_answer(10, "q_drop", json!(["X"])),
        ];

        let service = create_test_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_form()]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([questions]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([answers]),
        );

        let analytics = service.compute("form1").await.unwrap();

        assert_eq!(
            analytics.question_ids().collect::<Vec<_>>(),
            vec!["q_text", "q_check", "q_drop", "q_empty"]
        );

        let rendered = serde_json::to_value(&analytics).unwrap();
        assert_eq!(
            rendered["q_text"],
            json!({"type": "text", "data": {"top_words": [
                {"word": "apple", "count": 3},
                {"word": "cherry", "count": 2},
                {"word": "banana", "count": 1}
            ], "others": 0}})
        );
        assert_eq!(
            rendered["q_check"],
            json!({"type": "checkbox", "data": {"top_combos": [
                {"combination": ["A", "B"], "count": 2},
                {"combination": ["C"], "count": 1}
            ], "others": 0}})
        );
        assert_eq!(
            rendered["q_drop"],
            json!({"type": "dropdown", "data": {"top_options": [
                {"option": "X", "count": 3},
                {"option": "Y", "count": 1}
            ], "others": 0}})
        );
        assert_eq!(
            analytics.get("q_empty"),
            Some(&QuestionAnalytics::Text {
                top_words: vec![],
                others: 0
            })
        );
    }

    #[tokio::test]
    async fn test_compute_form_without_questions() {
        // No answer query is issued when there are no questions
        let service = create_test_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_form()]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let analytics = service.compute("form1").await.unwrap();

        assert!(analytics.is_empty());
        assert_eq!(serde_json::to_value(&analytics).unwrap(), json!({}));
    }
}
