//! Saved system prompts.
//!
//! A template's content becomes the system prompt of a chat turn when the
//! request names it. Templates are private to the user who created them.

pub mod errors;
pub mod models;
pub mod ports;
pub mod service;

pub use errors::TemplateError;
pub use models::{PromptTemplate, TemplateFields, TemplateId};
pub use ports::{TemplateRepository, TemplateServiceTrait};
pub use service::TemplateServiceImpl;
