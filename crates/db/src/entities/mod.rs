//! Database entities.

pub mod answer;
pub mod form;
pub mod question;
pub mod response;
pub mod user;

pub use answer::Entity as Answer;
pub use form::Entity as Form;
pub use question::Entity as Question;
pub use response::Entity as Response;
pub use user::Entity as User;
