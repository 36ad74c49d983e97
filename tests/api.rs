//! HTTP API tests.
//!
//! The router runs in-process via `tower::ServiceExt::oneshot`, with a stub
//! extractor (no pdfium needed) and stub AI providers (no network needed).

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use edgequake_pdf_extract::pipeline::extract::{join_pages, split_pages};
use edgequake_pdf_extract::prompts::{CLEAN_PROMPT, SUMMARIZE_PROMPT};
use edgequake_pdf_extract::{
    router, AiModel, AppState, CompletionProvider, ExtractError, ExtractionResult,
    ProviderError, ProviderSet, ServerConfig, TextExtractor,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "----pdf-extract-test-boundary";
const PDF_BYTES: &[u8] = b"%PDF-1.7\n% stub document\n";

// ── Stubs ────────────────────────────────────────────────────────────────

/// Pretends every PDF has the given pages.
struct StubExtractor {
    pages: Vec<String>,
    fail_with_unavailable: bool,
}

impl TextExtractor for StubExtractor {
    fn name(&self) -> &str {
        "stub"
    }

    fn extract(&self, _pdf: &[u8]) -> Result<ExtractionResult, ExtractError> {
        if self.fail_with_unavailable {
            return Err(ExtractError::PdfiumUnavailable("libpdfium.so not found".into()));
        }
        Ok(ExtractionResult {
            markdown: join_pages(&self.pages),
            page_count: self.pages.len(),
        })
    }
}

/// Records prompts and keys; answers with a fixed outcome.
struct StubProvider {
    outcome: Result<String, ProviderError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubProvider {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    fn name(&self) -> &str {
        "Stub"
    }

    async fn complete(
        &self,
        prompt: &str,
        _content: &str,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), api_key.to_string()));
        self.outcome.clone()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn two_page_extractor() -> Arc<dyn TextExtractor> {
    Arc::new(StubExtractor {
        pages: vec![
            "Acme Corp Quarterly Report\nRevenue grew in every region.\n1".to_string(),
            "Acme Corp Quarterly Report\nCosts stayed flat.\n2".to_string(),
        ],
        fail_with_unavailable: false,
    })
}

fn app_with(config: ServerConfig, providers: ProviderSet) -> Router {
    router(AppState::new(config, two_page_extractor(), providers))
}

fn app() -> Router {
    app_with(ServerConfig::default(), ProviderSet::new())
}

enum Part<'a> {
    Field(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Field(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn post_multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ── Metadata routes ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
    let (status, json) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn root_and_api_describe_the_service() {
    for uri in ["/", "/api"] {
        let (status, json) = send(app(), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "PDF Extractor API");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["endpoints"]["POST /extract"].is_string());
        assert_eq!(json["models"][2], "sambanova");
    }
}

#[tokio::test]
async fn browser_client_is_served() {
    let resp = app().oneshot(get("/app")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(ct.starts_with("text/html"), "{ct}");
    let html = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&html).contains("/app/app.js"));

    let resp = app().oneshot(get("/app/app.js")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/javascript"));
}

/// The source text of `function <name>` in the served client script.
fn script_function(script: &str, name: &str) -> String {
    let start = script
        .find(&format!("function {name}("))
        .unwrap_or_else(|| panic!("{name} not found"));
    let body = &script[start..];
    let end = body.find("\n  }\n").expect("function end") + 4;
    body[..end].to_string()
}

#[tokio::test]
async fn client_clear_returns_to_idle_and_download_name_follows_view() {
    let resp = app().oneshot(get("/app/app.js")).await.unwrap();
    let script = String::from_utf8(
        to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();

    let clear = script_function(&script, "clearFile");
    assert!(clear.contains("state.result = null"), "{clear}");
    assert!(clear.contains(".abort()"), "{clear}");
    assert!(clear.contains("state.extracting = false"), "{clear}");

    // A response for an abandoned request must not fill in results.
    let extract = script_function(&script, "extract");
    assert!(extract.contains("if (state.request !== request) return;"), "{extract}");

    // Download suffix and displayed text share one predicate, which checks the mode.
    let raw = script_function(&script, "showingRaw");
    assert!(raw.contains("mode() === \"ai\""), "{raw}");
    assert!(script_function(&script, "currentText").contains("showingRaw()"));
    assert!(script_function(&script, "downloadText").contains("showingRaw()"));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let req = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://example.test")
        .body(Body::empty())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

// ── /extract ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn extract_returns_every_page_in_order() {
    let (status, json) = send(
        app(),
        post_multipart("/extract", &[Part::File("report.pdf", PDF_BYTES)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page_count"], 2);
    let markdown = json["markdown"].as_str().unwrap();
    let pages = split_pages(markdown);
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("Revenue grew"));
    assert!(pages[1].contains("Costs stayed flat"));
}

#[tokio::test]
async fn text_file_renamed_to_pdf_is_400() {
    let (status, json) = send(
        app(),
        post_multipart("/extract", &[Part::File("notes.pdf", b"just some notes\n")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().starts_with("Invalid PDF document"));
}

#[tokio::test]
async fn non_pdf_extension_is_400() {
    let (status, json) = send(
        app(),
        post_multipart("/extract", &[Part::File("photo.jpg", PDF_BYTES)]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "File must be a PDF");
}

#[tokio::test]
async fn missing_file_is_400() {
    let (status, json) = send(
        app(),
        post_multipart("/extract", &[Part::Field("model", "gemini")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "No file uploaded");
}

#[tokio::test]
async fn oversize_upload_is_413() {
    let config = ServerConfig::builder().max_upload_bytes(1024).build().unwrap();
    let mut big = PDF_BYTES.to_vec();
    big.resize(8 * 1024, b'x');
    let (status, _) = send(
        app_with(config, ProviderSet::new()),
        post_multipart("/extract", &[Part::File("big.pdf", &big)]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn missing_pdfium_is_503_without_detail() {
    let extractor = Arc::new(StubExtractor {
        pages: vec![],
        fail_with_unavailable: true,
    });
    let app = router(AppState::new(
        ServerConfig::default(),
        extractor,
        ProviderSet::new(),
    ));
    let (status, json) = send(
        app,
        post_multipart("/extract", &[Part::File("a.pdf", PDF_BYTES)]),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!json["detail"].as_str().unwrap().contains("libpdfium"));
}

// ── /extract-and-clean ───────────────────────────────────────────────────

#[tokio::test]
async fn extract_and_clean_drops_running_header() {
    let (status, json) = send(
        app(),
        post_multipart("/extract-and-clean", &[Part::File("report.pdf", PDF_BYTES)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page_count"], 2);
    let markdown = json["markdown"].as_str().unwrap();
    assert!(!markdown.contains("Acme Corp Quarterly Report"), "{markdown}");
    assert!(markdown.contains("Revenue grew in every region."));
    assert!(markdown.contains("Costs stayed flat."));
}

// ── /extract-with-ai ─────────────────────────────────────────────────────

#[tokio::test]
async fn custom_preset_with_empty_prompt_uses_default_prompt() {
    let provider = StubProvider::answering("Cleaned by AI");
    let app = app_with(
        ServerConfig::builder().gemini_api_key("env-key").build().unwrap(),
        ProviderSet::new().with(AiModel::Gemini, provider.clone()),
    );
    let (status, json) = send(
        app,
        post_multipart(
            "/extract-with-ai",
            &[
                Part::File("report.pdf", PDF_BYTES),
                Part::Field("model", "gemini"),
                Part::Field("prompt_preset", "custom"),
                Part::Field("custom_prompt", ""),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleaned_text"], "Cleaned by AI");
    assert_eq!(json["model_used"], "gemini");
    assert_eq!(json["page_count"], 2);
    assert!(json.get("error").is_none());

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, CLEAN_PROMPT);
    assert_eq!(calls[0].1, "env-key");
}

#[tokio::test]
async fn request_key_and_custom_prompt_are_forwarded() {
    let provider = StubProvider::answering("ok");
    let app = app_with(
        ServerConfig::default(),
        ProviderSet::new().with(AiModel::Groq, provider.clone()),
    );
    let (status, json) = send(
        app,
        post_multipart(
            "/extract-with-ai",
            &[
                Part::File("report.pdf", PDF_BYTES),
                Part::Field("model", "GROQ"),
                Part::Field("prompt_preset", "summarize"),
                Part::Field("custom_prompt", "List every region"),
                Part::Field("api_key", "request-key"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model_used"], "groq");
    let calls = provider.calls();
    assert_eq!(calls[0].0, "List every region");
    assert_eq!(calls[0].1, "request-key");
}

#[tokio::test]
async fn preset_without_custom_prompt_uses_template() {
    let provider = StubProvider::answering("summary");
    let app = app_with(
        ServerConfig::builder().sambanova_api_key("k").build().unwrap(),
        ProviderSet::new().with(AiModel::SambaNova, provider.clone()),
    );
    send(
        app,
        post_multipart(
            "/extract-with-ai",
            &[
                Part::File("report.pdf", PDF_BYTES),
                Part::Field("model", "sambanova"),
                Part::Field("prompt_preset", "summarize"),
            ],
        ),
    )
    .await;
    assert_eq!(provider.calls()[0].0, SUMMARIZE_PROMPT);
}

#[tokio::test]
async fn provider_failure_degrades_to_raw_text() {
    let provider = StubProvider::failing(ProviderError::Status {
        provider: "Gemini".into(),
        status: 500,
        detail: "backend exploded".into(),
    });
    let app = app_with(
        ServerConfig::builder().gemini_api_key("k").build().unwrap(),
        ProviderSet::new().with(AiModel::Gemini, provider),
    );
    let (status, json) = send(
        app,
        post_multipart("/extract-with-ai", &[Part::File("report.pdf", PDF_BYTES)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleaned_text"], json["markdown"]);
    assert_eq!(json["model_used"], "gemini");
    assert_eq!(json["error"], "Gemini API error (500): backend exploded");
}

#[tokio::test]
async fn missing_credential_degrades_to_raw_text() {
    let provider = StubProvider::answering("unused");
    let app = app_with(
        ServerConfig::default(),
        ProviderSet::new().with(AiModel::Gemini, provider.clone()),
    );
    let (status, json) = send(
        app,
        post_multipart("/extract-with-ai", &[Part::File("report.pdf", PDF_BYTES)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleaned_text"], json["markdown"]);
    assert_eq!(json["error"], "Gemini API key required");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn unknown_model_is_400() {
    let (status, json) = send(
        app(),
        post_multipart(
            "/extract-with-ai",
            &[Part::File("report.pdf", PDF_BYTES), Part::Field("model", "gpt")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().starts_with("Model must be"));
}

#[tokio::test]
async fn unknown_preset_is_400() {
    let (status, json) = send(
        app(),
        post_multipart(
            "/extract-with-ai",
            &[
                Part::File("report.pdf", PDF_BYTES),
                Part::Field("prompt_preset", "haiku"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("Unknown prompt preset"));
}

// ── /clean ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn clean_removes_synthetic_repeated_header() {
    let (status, json) = send(
        app(),
        post_multipart("/clean", &[Part::Field("text", "Page 1\n\n\nPage 1\n\n\n")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["markdown"], "");
    assert_eq!(json["original_length"], 18);
    assert_eq!(json["cleaned_length"], 0);
}

#[tokio::test]
async fn clean_keeps_unique_content() {
    let text = "Page 1\n\n\nInstallation steps follow.\n\n\nPage 1\n\n\n";
    let (status, json) = send(app(), post_multipart("/clean", &[Part::Field("text", text)])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["markdown"], "Installation steps follow.");
}

#[tokio::test]
async fn clean_accepts_urlencoded_form() {
    let req = Request::builder()
        .method("POST")
        .uri("/clean")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("text=Hello%20world%0A%0A%0A%0A%0Aagain"))
        .unwrap();
    let (status, json) = send(app(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["markdown"], "Hello world\n\nagain");
}

#[tokio::test]
async fn clean_without_text_is_400() {
    let (status, json) = send(
        app(),
        post_multipart("/clean", &[Part::Field("other", "x")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Missing form field: text");
}

#[tokio::test]
async fn json_body_is_rejected_with_detail() {
    let req = Request::builder()
        .method("POST")
        .uri("/clean")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text":"x"}"#))
        .unwrap();
    let (status, json) = send(app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].is_string());
}
