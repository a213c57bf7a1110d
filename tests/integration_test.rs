use entity_extractor::clients::mock::{
    organic_payload, organic_result, MemorySheetStore, MockChatBackend, MockSearchProvider,
};
use entity_extractor::clients::SheetStore;
use entity_extractor::infrastructure::{BackoffPolicy, RateLimiter, RecordingSleeper};
use entity_extractor::models::{parse_job, EXTRACTION_ERROR};
use entity_extractor::services::{ExtractionService, SearchService};
use entity_extractor::{App, BatchProcessor, Config, EntityFlow, Table};
use std::sync::Arc;
use std::time::Duration;

const PRODUCT_PROMPT: &str = "What is {company}'s main product?";
const CEO_PROMPT: &str = "Who is the CEO of {company}?";

struct Pipeline {
    processor: BatchProcessor,
    search: Arc<MockSearchProvider>,
    chat: Arc<MockChatBackend>,
    sleeper: Arc<RecordingSleeper>,
}

fn pipeline(search: MockSearchProvider, chat: MockChatBackend, max_retries: usize) -> Pipeline {
    let search = Arc::new(search);
    let chat = Arc::new(chat);
    let sleeper = Arc::new(RecordingSleeper::new());
    let limiter = |name: &str| Arc::new(RateLimiter::new(name, Duration::from_secs(1), sleeper.clone()));

    let flow = EntityFlow::new(
        SearchService::new(search.clone(), limiter("search"), "{company}"),
        ExtractionService::new(
            chat.clone(),
            limiter("llm"),
            BackoffPolicy::new(max_retries, Duration::from_secs(1)),
            sleeper.clone(),
        ),
    );

    Pipeline {
        processor: BatchProcessor::new(flow, 1, "{company}"),
        search,
        chat,
        sleeper,
    }
}

fn companies(names: &[&str]) -> Table {
    Table::new(
        vec!["company_name".to_string(), "industry".to_string()],
        names
            .iter()
            .map(|n| vec![n.to_string(), "Technology".to_string()])
            .collect(),
    )
}

fn test_config() -> Config {
    Config::new("serp-key", "llm-key")
}

#[tokio::test]
async fn test_single_entity_scenario() {
    let p = pipeline(
        MockSearchProvider::new().with_response(
            "What is Acme's main product?",
            organic_payload(vec![organic_result(
                1,
                "Acme",
                "Acme sells widgets.",
                "https://acme.example",
            )]),
        ),
        MockChatBackend::replying("Widgets"),
        3,
    );
    let prompts = vec![PRODUCT_PROMPT.to_string()];

    let records = p
        .processor
        .process_batch(&companies(&["Acme"]), "company_name", &prompts, None)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity, "Acme");
    assert_eq!(records[0].value_for(PRODUCT_PROMPT), "Widgets");
    assert!(records[0].error.is_none());

    let calls = p.chat.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user_message.contains("Snippet: Acme sells widgets."));

    // 一次搜索 + 一次提取，各等待一次限流间隔
    assert_eq!(p.sleeper.recorded(), vec![Duration::from_secs(1); 2]);

    let csv = Table::from_records(&records, &prompts).to_csv();
    assert_eq!(csv, "entity,What is {company}'s main product?\nAcme,Widgets\n");
}

#[tokio::test]
async fn test_every_extraction_sees_union_of_search_results() {
    let p = pipeline(
        MockSearchProvider::new()
            .with_response(
                "What is Acme's main product?",
                organic_payload(vec![organic_result(1, "Products", "Acme sells widgets.", "https://a.example")]),
            )
            .with_response(
                "Who is the CEO of Acme?",
                organic_payload(vec![organic_result(1, "Leadership", "Jane Doe leads Acme.", "https://b.example")]),
            ),
        MockChatBackend::scripted(vec![Some("Widgets".to_string()), Some("Jane Doe".to_string())]),
        3,
    );
    let prompts = vec![PRODUCT_PROMPT.to_string(), CEO_PROMPT.to_string()];

    let record = p.processor.process_entity("Acme", &prompts).await.unwrap();

    assert_eq!(
        p.search.queries(),
        vec!["What is Acme's main product?", "Who is the CEO of Acme?"]
    );

    let calls = p.chat.calls();
    assert_eq!(calls.len(), 2);
    for (call, prompt) in calls.iter().zip(&prompts) {
        assert!(call.user_message.contains(prompt.as_str()));
        let widgets = call.user_message.find("Acme sells widgets.").unwrap();
        let ceo = call.user_message.find("Jane Doe leads Acme.").unwrap();
        assert!(widgets < ceo, "结果应按提示词顺序合并");
    }

    assert_eq!(record.value_for(PRODUCT_PROMPT), "Widgets");
    assert_eq!(record.value_for(CEO_PROMPT), "Jane Doe");
}

#[tokio::test]
async fn test_process_entity_is_idempotent() {
    let p = pipeline(
        MockSearchProvider::new()
            .with_default(organic_payload(vec![organic_result(1, "t", "s", "l")])),
        MockChatBackend::replying("Widgets"),
        3,
    );
    let prompts = vec![PRODUCT_PROMPT.to_string(), CEO_PROMPT.to_string()];

    let first = p.processor.process_entity("Acme", &prompts).await.unwrap();
    let second = p.processor.process_entity("Acme", &prompts).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_search_outage_still_yields_one_row_per_entity() {
    let p = pipeline(MockSearchProvider::failing(), MockChatBackend::replying("Information not found"), 3);
    let prompts = vec![PRODUCT_PROMPT.to_string()];

    let records = p
        .processor
        .process_batch(&companies(&["Acme", "Globex"]), "company_name", &prompts, None)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.value_for(PRODUCT_PROMPT) == "Information not found"));
    assert!(p.chat.calls().iter().all(|c| c.user_message.contains("Search Results:\n\n")));
}

#[tokio::test]
async fn test_extraction_outage_fills_sentinel_and_continues() {
    let p = pipeline(MockSearchProvider::new(), MockChatBackend::failing(), 3);
    let prompts = vec![PRODUCT_PROMPT.to_string(), CEO_PROMPT.to_string()];

    let records = p
        .processor
        .process_batch(&companies(&["Acme", "Globex"]), "company_name", &prompts, None)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.value_for(PRODUCT_PROMPT), EXTRACTION_ERROR);
        assert_eq!(record.value_for(CEO_PROMPT), EXTRACTION_ERROR);
        assert!(!record.is_failed());
    }
    // 2 个实体 × 2 个字段 × 3 次尝试
    assert_eq!(p.chat.call_count(), 12);
}

#[tokio::test]
async fn test_app_runs_inline_job_and_exports() {
    let p = pipeline(MockSearchProvider::new(), MockChatBackend::replying("Widgets"), 3);
    let sheets = Arc::new(MemorySheetStore::new());
    let csv_path = std::env::temp_dir().join(format!("entity_extractor_it_{}.csv", std::process::id()));

    let job = parse_job(
        &format!(
            r#"
target_column = "company_name"
prompts = ["What is {{company}}'s main product?", "What is {{company}}'s main product?"]
batch_size = 2

[source]
kind = "inline"
header = ["company_name", "industry"]
rows = [["Acme", "Tools"], ["Globex", "Energy"], ["Initech", "Software"]]

[export]
csv_path = "{}"
sheet_id = "results-sheet"
"#,
            csv_path.display().to_string().replace('\\', "/")
        ),
        "job.toml",
    )
    .unwrap();

    let app = App::with_components(test_config(), p.processor, Some(sheets.clone()));
    let summary = app.run(&job).await.unwrap();

    assert_eq!(summary.stats.total, 2);
    assert_eq!(summary.stats.failed, 0);
    assert!(summary.export_errors.is_empty());
    assert_eq!(summary.table.header, vec!["entity", PRODUCT_PROMPT]);

    let written = tokio::fs::read_to_string(&csv_path).await.unwrap();
    assert_eq!(
        written,
        "entity,What is {company}'s main product?\nAcme,Widgets\nGlobex,Widgets\n"
    );
    assert_eq!(sheets.table("results-sheet", "Results!A1"), Some(summary.table.clone()));
    let _ = tokio::fs::remove_file(&csv_path).await;
}

#[tokio::test]
async fn test_app_reads_sheet_source() {
    let p = pipeline(MockSearchProvider::new(), MockChatBackend::replying("ok"), 3);
    let sheets = Arc::new(MemorySheetStore::new().with_table(
        "input-sheet",
        "Sheet1!A1:B10",
        companies(&["Acme", "Globex", "Initech"]),
    ));

    let job = parse_job(
        r#"
target_column = "company_name"
prompts = ["CEO of {company}"]
source = { kind = "sheet", sheet_id = "input-sheet", range = "Sheet1!A1:B10" }
"#,
        "job.toml",
    )
    .unwrap();

    let app = App::with_components(test_config(), p.processor, Some(sheets.clone()));
    let table = app.resolve_input(&job).await.unwrap();

    assert_eq!(
        table.column_values("company_name").unwrap(),
        vec!["Acme", "Globex", "Initech"]
    );
    assert_eq!(
        sheets.read_table("input-sheet", "Sheet1!A1:B10").await.unwrap(),
        table
    );
}

#[tokio::test]
async fn test_sheet_source_requires_credentials() {
    let p = pipeline(MockSearchProvider::new(), MockChatBackend::replying("ok"), 3);
    let job = parse_job(
        r#"
target_column = "company_name"
prompts = ["CEO of {company}"]
source = { kind = "sheet", sheet_id = "input-sheet", range = "Sheet1!A1:B10" }
"#,
        "job.toml",
    )
    .unwrap();

    let app = App::with_components(test_config(), p.processor, None);

    assert!(app.resolve_input(&job).await.is_err());
}

#[tokio::test]
async fn test_failed_csv_export_keeps_results_and_still_writes_sheet() {
    let p = pipeline(MockSearchProvider::new(), MockChatBackend::replying("Widgets"), 3);
    let sheets = Arc::new(MemorySheetStore::new());

    // CSV 路径的父目录是一个普通文件，无法创建
    let blocker = std::env::temp_dir().join(format!("entity_extractor_blocker_{}", std::process::id()));
    tokio::fs::write(&blocker, "not a directory").await.unwrap();
    let csv_path = blocker.join("out.csv");

    let job = parse_job(
        &format!(
            r#"
target_column = "company_name"
prompts = ["What is {{company}}'s main product?"]
source = {{ kind = "sample" }}

[export]
csv_path = "{}"
sheet_id = "results-sheet"
"#,
            csv_path.display().to_string().replace('\\', "/")
        ),
        "job.toml",
    )
    .unwrap();

    let app = App::with_components(test_config(), p.processor, Some(sheets.clone()));
    let summary = app.run(&job).await.unwrap();

    assert_eq!(summary.records.len(), 3);
    assert_eq!(p.chat.call_count(), 3);
    assert_eq!(summary.export_errors.len(), 1);
    assert!(summary.export_errors[0].starts_with("CSV"));
    assert_eq!(sheets.table("results-sheet", "Results!A1"), Some(summary.table.clone()));
    let _ = tokio::fs::remove_file(&blocker).await;
}
