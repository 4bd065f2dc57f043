pub mod answer_generator;
pub mod answer_submitter;
pub mod data_files;
pub mod instructions;
pub mod page_fetcher;
pub mod page_parser;
pub mod submit_target;

#[cfg(feature = "headless")]
pub use page_fetcher::HeadlessPageFetcher;

pub use answer_generator::{AnswerGenerator, GenerationRequest, LlmAnswerGenerator};
pub use answer_submitter::{next_url_from_response, AnswerSubmitter, HttpAnswerSubmitter};
pub use data_files::{pick_data_file_links, DataFileLoader};
pub use instructions::{extract_quiz_instructions, extract_submission_template};
pub use page_fetcher::{HttpPageFetcher, PageFetcher};
pub use page_parser::{parse_page, resolve_url};
pub use submit_target::{PatternSubmitTarget, SubmitTargetStrategy};
