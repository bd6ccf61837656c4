//! Question endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use formkit_common::{AppError, AppResult, ItemError};
use formkit_core::{CreateQuestionInput, UpdateQuestionInput};
use formkit_db::entities::question;
use serde_json::Value as JsonValue;

use crate::{
    extractors::{AppJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Created, ok},
};

async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<question::Model>>> {
    let questions = state.question_service.list().await?;
    Ok(ApiResponse::ok(questions))
}

/// Create one question, or a batch when the body is an array.
///
/// A batch is all-or-nothing. Items that do not even parse are reported by
/// index without touching the database.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(body): AppJson<JsonValue>,
) -> AppResult<Response> {
    match body {
        JsonValue::Array(items) => {
            let inputs = parse_batch(items)?;
            let questions = state.question_service.create_many(&user.id, inputs).await?;
            Ok(Created(questions).into_response())
        }
        JsonValue::Object(_) => {
            let input: CreateQuestionInput = serde_json::from_value(body)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            let question = state.question_service.create(&user.id, input).await?;
            Ok(Created(question).into_response())
        }
        _ => Err(AppError::BadRequest(
            "Expected a question object or an array of them".to_string(),
        )),
    }
}

fn parse_batch(items: Vec<JsonValue>) -> AppResult<Vec<CreateQuestionInput>> {
    let mut inputs = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<CreateQuestionInput>(item) {
            Ok(input) => inputs.push(input),
            Err(e) => errors.push(ItemError::new(index, &AppError::BadRequest(e.to_string()))),
        }
    }

    if errors.is_empty() {
        Ok(inputs)
    } else {
        Err(AppError::InvalidItems(errors))
    }
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<question::Model>> {
    let question = state.question_service.get(&id).await?;
    Ok(ApiResponse::ok(question))
}

async fn replace(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<CreateQuestionInput>,
) -> AppResult<ApiResponse<question::Model>> {
    let question = state.question_service.replace(&id, &user.id, req).await?;
    Ok(ApiResponse::ok(question))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateQuestionInput>,
) -> AppResult<ApiResponse<question::Model>> {
    let question = state.question_service.update(&id, &user.id, req).await?;
    Ok(ApiResponse::ok(question))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.question_service.delete(&id, &user.id).await?;
    Ok(ok())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create)).route(
        "/{id}",
        get(show).put(replace).patch(update).delete(delete),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_batch_reports_every_bad_index() {
        let items = vec![
            json!({"form": "f1", "text": "Name?", "type": "text", "order": 0}),
            json!({"form": "f1", "type": "text"}),
            json!("not an object"),
        ];

        let Err(AppError::InvalidItems(errors)) = parse_batch(items) else {
            panic!("expected item errors");
        };

        let indexes: Vec<usize> = errors.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![1, 2]);
        assert!(errors.iter().all(|e| e.code == "BAD_REQUEST"));
    }

    #[test]
    fn test_parse_batch_accepts_wire_aliases() {
        let items = vec![json!({
            "form": "f1",
            "text": "Colour?",
            "type": "dropdown",
            "options": ["Red", "Blue"],
            "order": 3,
        })];

        let inputs = parse_batch(items).unwrap();

        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].form_id, "f1");
        assert_eq!(inputs[0].display_order, 3);
    }
}
