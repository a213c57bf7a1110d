pub mod export_writer;
pub mod extraction_service;
pub mod search_service;

pub use export_writer::CsvExporter;
pub use extraction_service::ExtractionService;
pub use search_service::SearchService;
