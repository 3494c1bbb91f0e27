//! The `librarian` binary end to end, against a mock OpenAI-compatible API.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const VOCAB: &[&str] = &["desert", "sand", "love", "marriage", "war", "space"];

/// Answers `/embeddings` with bag-of-words vectors for each input.
struct BagOfWords;

impl Respond for BagOfWords {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match request.body_json() {
            Ok(v) => v,
            Err(_) => return ResponseTemplate::new(400),
        };
        let inputs: Vec<String> = body["input"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_lowercase))
                    .collect()
            })
            .unwrap_or_default();

        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut v: Vec<f32> = VOCAB.iter().map(|w| text.matches(w).count() as f32).collect();
                v.push(0.1);
                json!({"object": "embedding", "index": i, "embedding": v})
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
            "model": body["model"],
            "usage": {"prompt_tokens": inputs.len() * 10, "total_tokens": inputs.len() * 10}
        }))
    }
}

async fn mock_openai() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(BagOfWords)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "- recomandare\nDune\nO epopee a deșertului.\n\n{\"title\": \"Dune\"}"
                }
            }],
            "usage": {"prompt_tokens": 200, "completion_tokens": 30, "total_tokens": 230}
        })))
        .mount(&server)
        .await;
    server
}

fn setup_test_env(api_base: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    fs::write(
        root.join("data/books.json"),
        json!([
            {
                "id": "W1", "title": "Dune", "authors": ["Frank Herbert"], "year": 1965,
                "themes": ["desert", "politics"], "summary": "A desert epic.",
                "description": null
            },
            {
                "id": "W2", "title": "Pride and Prejudice", "authors": ["Jane Austen"],
                "themes": ["love", "marriage"], "summary": "Romance.",
                "description": "Love and marriage in Regency England."
            },
            {
                "id": "W3", "title": "The War of the Worlds", "themes": ["war", "space"],
                "summary": "Martians invade."
            }
        ])
        .to_string(),
    )
    .unwrap();

    let config = format!(
        r#"[index]
path = "{root}/data/librarian.sqlite"

[corpus]
path = "{root}/data/books.json"

[embedding]
base_url = "{api}/v1"
max_retries = 0

[completion]
base_url = "{api}/v1"
max_retries = 0
"#,
        root = root.display(),
        api = api_base,
    );
    let config_path = root.join("config/librarian.toml");
    fs::write(&config_path, config).unwrap();

    (tmp, config_path)
}

fn run_librarian(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_librarian"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env("OPENAI_API_KEY", "test-key")
        .env_remove("OPENAI_MODEL_GPT")
        .env_remove("OPENAI_MODEL_EMB")
        .env_remove("LIBRARIAN_INDEX_PATH")
        .env_remove("LIBRARIAN_COLLECTION")
        .env_remove("LIBRARIAN_TOP_K")
        .env_remove("LIBRARIAN_BOOKS_JSON")
        .output()
        .expect("failed to run librarian binary");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn librarian(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let config_path = config_path.to_path_buf();
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_librarian(&config_path, &args)
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_init_ingest_ask() {
    let server = mock_openai().await;
    let (_tmp, config) = setup_test_env(&server.uri());

    let (stdout, stderr, ok) = librarian(&config, &["init"]).await;
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Index initialized"));

    let (stdout, stderr, ok) = librarian(&config, &["ingest", "--reset"]).await;
    assert!(ok, "ingest failed: {}", stderr);
    assert!(stdout.contains("documents upserted: 3"));
    assert!(stdout.contains("batches: 1"));
    assert!(stdout.contains("embedding tokens: 30"));

    let (stdout, stderr, ok) = librarian(&config, &["ask", "sandy desert adventure"]).await;
    assert!(ok, "ask failed: {}", stderr);
    assert!(stdout.starts_with("- recomandare"));
    assert!(stdout.contains("Summary for: Dune\nA desert epic."));
    assert!(stdout.contains("tokens chat: in=200, out=30, total=230 | tokens embeddings: 10"));
    assert!(stdout.contains("(models: gpt-4o-mini, text-embedding-3-small)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reingest_keeps_one_entry_per_book() {
    let server = mock_openai().await;
    let (_tmp, config) = setup_test_env(&server.uri());

    for _ in 0..2 {
        let (_, stderr, ok) = librarian(&config, &["ingest"]).await;
        assert!(ok, "ingest failed: {}", stderr);
    }

    let (stdout, stderr, ok) = librarian(&config, &["stats"]).await;
    assert!(ok, "stats failed: {}", stderr);
    let books_line = stdout
        .lines()
        .find(|l| l.trim_start().starts_with("books"))
        .expect("books collection row");
    let cols: Vec<&str> = books_line.split_whitespace().collect();
    assert_eq!(cols[1], "cosine");
    assert_eq!(cols[2], "3");
    assert_eq!(cols[3], "7");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_orders_by_distance() {
    let server = mock_openai().await;
    let (_tmp, config) = setup_test_env(&server.uri());
    librarian(&config, &["ingest", "--reset"]).await;

    let (stdout, stderr, ok) = librarian(&config, &["search", "love and marriage"]).await;
    assert!(ok, "search failed: {}", stderr);
    assert!(stdout.starts_with("1. ["));
    assert!(stdout.lines().next().unwrap().ends_with("Pride and Prejudice"));
    assert!(stdout.contains("embedding tokens: 10"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_summary_command() {
    let server = mock_openai().await;
    let (_tmp, config) = setup_test_env(&server.uri());

    let (stdout, _, ok) = librarian(&config, &["summary", "pride and prejudice"]).await;
    assert!(ok);
    assert!(stdout.contains("Love and marriage in Regency England."));

    let (stdout, _, ok) = librarian(&config, &["summary", "Ulysses"]).await;
    assert!(ok);
    assert!(stdout.contains("Rezumat indisponibil."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_on_empty_index_still_answers() {
    let server = mock_openai().await;
    let (_tmp, config) = setup_test_env(&server.uri());

    // Never ingested: retrieval yields nothing, but the parsed title resolves.
    let (stdout, stderr, ok) = librarian(&config, &["ask", "anything"]).await;
    assert!(ok, "ask failed: {}", stderr);
    assert!(stdout.contains("Summary for: Dune"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_config_fails() {
    let server = mock_openai().await;
    let (_tmp, config) = setup_test_env(&server.uri());
    fs::write(&config, "[retrieval]\ntop_k = 0\n").unwrap();

    let (_, stderr, ok) = librarian(&config, &["stats"]).await;
    assert!(!ok);
    assert!(stderr.contains("top_k"));
}
