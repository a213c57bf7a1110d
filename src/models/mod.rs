pub mod job;
pub mod loaders;
pub mod prompt;
pub mod record;
pub mod search_result;
pub mod table;

pub use job::{ExportTarget, Job, JobSource};
pub use loaders::{load_job, parse_job};
pub use prompt::{normalize_prompts, render_query, PromptWarning};
pub use record::{ExtractionResult, OutputRecord, EXTRACTION_ERROR, INFORMATION_NOT_FOUND};
pub use search_result::SearchResult;
pub use table::Table;
