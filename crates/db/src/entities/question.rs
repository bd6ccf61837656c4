//! Question entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Kind of prompt, which also fixes the shape of its answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Free text answer.
    #[sea_orm(string_value = "text")]
    Text,
    /// Exactly one option out of the list.
    #[sea_orm(string_value = "dropdown")]
    Dropdown,
    /// Any subset of the option list.
    #[sea_orm(string_value = "checkbox")]
    Checkbox,
}

impl QuestionType {
    /// Whether questions of this type carry an option list.
    #[must_use]
    pub const fn has_options(self) -> bool {
        matches!(self, Self::Dropdown | Self::Checkbox)
    }

    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub form_id: String,

    pub text: String,

    pub question_type: QuestionType,

    /// Option labels (JSON array of strings); NULL for text questions
    #[sea_orm(column_type = "Json", nullable)]
    pub options: Option<JsonValue>,

    /// Position within the form, unique per form
    pub display_order: i32,

    #[sea_orm(default_value = false)]
    pub is_required: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub help_text: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::form::Entity",
        from = "Column::FormId",
        to = "super::form::Column::Id",
        on_delete = "Cascade"
    )]
    Form,
    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,
}

impl Related<super::form::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Form.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decoded option labels. Malformed or missing JSON yields an empty list.
    #[must_use]
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}
