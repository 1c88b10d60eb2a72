//! Generation pipelines and the pure decision core driving the retry loop.

pub mod answer;
pub mod decision;
pub mod question;

pub use answer::AnswerPipeline;
pub use question::{InputKind, QuestionPipeline};
