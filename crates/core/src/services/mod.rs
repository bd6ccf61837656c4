//! Business logic services.

#![allow(missing_docs)]

pub mod analytics;
pub mod form;
pub mod question;
pub mod response;
pub mod user;

pub use analytics::AnalyticsService;
pub use form::{CreateFormInput, FormService, FormWithQuestions, UpdateFormInput};
pub use question::{CreateQuestionInput, QuestionService, UpdateQuestionInput};
pub use response::{
    AnswerInput, ResponseService, ResponseWithAnswers, SubmitResponseInput, UpdateResponseInput,
};
pub use user::{CredentialsInput, UserService};
