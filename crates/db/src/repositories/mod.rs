//! Database repositories.

mod answer;
mod form;
mod question;
mod response;
mod user;

pub use answer::AnswerRepository;
pub use form::FormRepository;
pub use question::{CapacityCheck, QuestionRepository};
pub use response::ResponseRepository;
pub use user::UserRepository;
