//! Structural rules for forms, questions and submitted answers.
//!
//! Everything here is a pure function over plain values. Services load what the
//! rules need from the repositories, call in, and write only when the rule passes.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset, Utc};
use formkit_common::{AppError, AppResult};
use formkit_db::entities::{
    answer::AnswerValue,
    form::{self, FormStatus},
    question::{self, QuestionType},
};
use serde_json::Value as JsonValue;

/// Maximum number of questions on one form.
pub const MAX_QUESTIONS_PER_FORM: u64 = 100;

/// Normalize the option list for a question of `kind`.
///
/// Text questions never keep options; anything supplied is dropped. Dropdown and
/// checkbox questions need at least one option, none blank and none repeated.
pub fn normalize_options(
    kind: QuestionType,
    options: Option<Vec<String>>,
) -> AppResult<Option<Vec<String>>> {
    match kind {
        QuestionType::Text => Ok(None),
        QuestionType::Dropdown | QuestionType::Checkbox => {
            let options = options.unwrap_or_default();
            if options.is_empty() {
                return Err(AppError::Validation(format!(
                    "{} questions need at least one option",
                    kind.as_str()
                )));
            }

            let mut seen = HashSet::with_capacity(options.len());
            for option in &options {
                if option.trim().is_empty() {
                    return Err(AppError::Validation(
                        "Options must not be blank".to_string(),
                    ));
                }
                if !seen.insert(option.as_str()) {
                    return Err(AppError::Validation(format!(
                        "Duplicate option: {option}"
                    )));
                }
            }

            Ok(Some(options))
        }
    }
}

/// Question order must be non-negative.
pub fn check_order(order: i32) -> AppResult<()> {
    if order < 0 {
        return Err(AppError::Validation(
            "Question order must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Adding `adding` questions to a form that holds `existing` must stay within the cap.
pub fn check_question_capacity(existing: u64, adding: u64) -> AppResult<()> {
    if existing.saturating_add(adding) > MAX_QUESTIONS_PER_FORM {
        return Err(AppError::LimitExceeded(format!(
            "A form holds at most {MAX_QUESTIONS_PER_FORM} questions ({existing} present, {adding} requested)"
        )));
    }
    Ok(())
}

/// A form may be published only once it has a question.
pub fn check_publishable(question_count: u64) -> AppResult<()> {
    if question_count == 0 {
        return Err(AppError::Validation(
            "A form needs at least one question before it can be published".to_string(),
        ));
    }
    Ok(())
}

/// Deadlines strictly before `now` are rejected. A deadline equal to `now` passes.
pub fn check_deadline(deadline: &DateTime<FixedOffset>, now: DateTime<Utc>) -> AppResult<()> {
    if *deadline < now {
        return Err(AppError::Validation(
            "Deadline must not be in the past".to_string(),
        ));
    }
    Ok(())
}

/// The form must be published and its deadline, if any, not yet passed.
pub fn check_accepting_responses(form: &form::Model, now: DateTime<Utc>) -> AppResult<()> {
    if form.status != FormStatus::Published {
        return Err(AppError::Validation(
            "Form is not accepting responses".to_string(),
        ));
    }
    if form.deadline.is_some_and(|deadline| deadline < now) {
        return Err(AppError::Validation(
            "Form deadline has passed".to_string(),
        ));
    }
    Ok(())
}

/// Check one raw answer value against its question and return its stored form.
///
/// Dropdown answers are stored as a one-element list whether they arrive bare or
/// wrapped.
pub fn validate_answer(question: &question::Model, raw: &JsonValue) -> AppResult<AnswerValue> {
    let value = AnswerValue::from_json(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "Question {}: answer must be a string or a list of strings",
            question.id
        ))
    })?;

    let value = match (question.question_type, value) {
        (QuestionType::Text, AnswerValue::Text(text)) => AnswerValue::Text(text),
        (QuestionType::Dropdown, AnswerValue::Text(choice)) => AnswerValue::Choices(vec![choice]),
        (QuestionType::Dropdown, AnswerValue::Choices(choices)) if choices.len() <= 1 => {
            AnswerValue::Choices(choices)
        }
        (QuestionType::Checkbox, AnswerValue::Choices(choices)) => AnswerValue::Choices(choices),
        (kind, _) => {
            return Err(AppError::Validation(format!(
                "Question {}: answer shape does not match a {} question",
                question.id,
                kind.as_str()
            )));
        }
    };

    if let AnswerValue::Choices(choices) = &value {
        let options = question.option_list();
        let mut seen = HashSet::with_capacity(choices.len());
        for choice in choices {
            if !options.contains(choice) {
                return Err(AppError::Validation(format!(
                    "Question {}: '{choice}' is not one of the options",
                    question.id
                )));
            }
            if !seen.insert(choice.as_str()) {
                return Err(AppError::Validation(format!(
                    "Question {}: '{choice}' selected twice",
                    question.id
                )));
            }
        }
    }

    Ok(value)
}

/// Check a whole submission against the questions of its form.
///
/// Every answer must reference one of `questions`, at most once, with a value of the
/// right shape. Every required question must be answered with a non-blank value.
/// Returns `(question_id, value)` pairs in submission order.
pub fn validate_answers(
    questions: &[question::Model],
    answers: &[(String, JsonValue)],
) -> AppResult<Vec<(String, AnswerValue)>> {
    let by_id: HashMap<&str, &question::Model> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut answered = HashSet::with_capacity(answers.len());
    let mut validated = Vec::with_capacity(answers.len());

    for (index, (question_id, raw)) in answers.iter().enumerate() {
        let question = by_id.get(question_id.as_str()).ok_or_else(|| {
            AppError::Validation(format!(
                "answers[{index}]: question {question_id} does not belong to this form"
            ))
        })?;

        if !answered.insert(question_id.as_str()) {
            return Err(AppError::Validation(format!(
                "answers[{index}]: question {question_id} answered more than once"
            )));
        }

        let value = validate_answer(question, raw)?;
        validated.push((question_id.clone(), value));
    }

    for question in questions.iter().filter(|q| q.is_required) {
        let filled = validated
            .iter()
            .any(|(id, value)| *id == question.id && !value.is_blank());
        if !filled {
            return Err(AppError::Validation(format!(
                "Question {} is required",
                question.id
            )));
        }
    }

    Ok(validated)
}
