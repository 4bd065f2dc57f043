pub mod answer;
pub mod outcome;
pub mod page;
pub mod quiz;

pub use answer::AnswerPayload;
pub use outcome::{OutcomeStatus, QuizOutcome, RunSummary, StepRecord, StepResult};
pub use page::{DataFile, FetchedFile, PageSnapshot, SubmitTarget};
pub use quiz::{QuizRequest, RawQuizRequest};
