//! Tests of the Gemini client against a local canned HTTP server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ogstartup::chat::Turn;
use ogstartup::{
    Gemini, GenerateRequest, GenerationConfig, KnownModel, Model, TextGenerator,
};

/// A request as the server saw it.
#[derive(Debug, Clone)]
struct Seen {
    head: String,
    body: String,
}

/// Serves `responses` in order, one per connection, and records requests.
async fn serve(responses: Vec<(u16, &'static str, String)>) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    tokio::spawn(async move {
        for (status, extra_headers, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            record.lock().unwrap().push(request);
            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\n{extra_headers}content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });
    (format!("http://{addr}/v1beta/"), seen)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Seen {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();
    Seen { head, body }
}

fn reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 12,
            "candidatesTokenCount": 4,
            "totalTokenCount": 16
        }
    })
    .to_string()
}

fn failure(code: u16, status: &str, message: &str) -> String {
    serde_json::json!({"error": {"code": code, "message": message, "status": status}}).to_string()
}

fn client(base_url: String) -> Gemini {
    Gemini::with_options(
        Some("test-key".to_string()),
        Some(base_url),
        Some(Duration::from_secs(5)),
    )
    .unwrap()
    .with_backoff(Duration::from_millis(1))
}

async fn generate(client: &Gemini, turns: &[Turn]) -> ogstartup::Result<ogstartup::Generation> {
    let model = Model::Known(KnownModel::Gemini25Flash);
    let generation_config = GenerationConfig::new().with_max_output_tokens(1024);
    client
        .generate(GenerateRequest {
            model: &model,
            system_instruction: "Be an advisor.",
            turns,
            generation_config: &generation_config,
        })
        .await
}

#[tokio::test]
async fn sends_transcript_and_instruction() {
    let (base_url, seen) = serve(vec![(200, "", reply("Try poultry."))]).await;
    let client = client(base_url);
    let turns = [
        Turn::user("Hi"),
        Turn::model("Hello!"),
        Turn::user("What can I start?"),
    ];

    let generation = generate(&client, &turns).await.unwrap();
    assert_eq!(generation.text, "Try poultry.");
    assert_eq!(generation.usage.map(|u| u.total_token_count), Some(16));

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    let head = seen[0].head.to_lowercase();
    assert!(head.starts_with("post /v1beta/models/gemini-2.5-flash:generatecontent "));
    assert!(head.contains("x-goog-api-key: test-key"));

    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(
        body["systemInstruction"]["parts"][0]["text"],
        "Be an advisor."
    );
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"][0]["text"], "What can I start?");
}

#[tokio::test]
async fn retries_server_errors() {
    let (base_url, seen) = serve(vec![
        (500, "", failure(500, "INTERNAL", "boom")),
        (200, "", reply("recovered")),
    ])
    .await;
    let client = client(base_url).with_max_retries(2);

    let generation = generate(&client, &[Turn::user("Hi")]).await.unwrap();
    assert_eq!(generation.text, "recovered");
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn exhausted_retries_are_service_unavailable() {
    let (base_url, seen) = serve(vec![
        (503, "", failure(503, "UNAVAILABLE", "overloaded")),
        (503, "", failure(503, "UNAVAILABLE", "overloaded")),
    ])
    .await;
    let client = client(base_url).with_max_retries(1);

    let err = generate(&client, &[Turn::user("Hi")]).await.unwrap_err();
    assert!(err.is_service_unavailable(), "{err:?}");
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn rate_limit_is_retried() {
    let (base_url, seen) = serve(vec![
        (
            429,
            "retry-after: 0\r\n",
            failure(429, "RESOURCE_EXHAUSTED", "slow down"),
        ),
        (200, "", reply("ok")),
    ])
    .await;
    let client = client(base_url);

    let generation = generate(&client, &[Turn::user("Hi")]).await.unwrap();
    assert_eq!(generation.text, "ok");
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn bad_key_is_authentication_and_not_retried() {
    let (base_url, seen) = serve(vec![(
        400,
        "",
        failure(
            400,
            "INVALID_ARGUMENT",
            "API key not valid. Please pass a valid API key.",
        ),
    )])
    .await;
    let client = client(base_url);

    let err = generate(&client, &[Turn::user("Hi")]).await.unwrap_err();
    assert!(err.is_authentication(), "{err:?}");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn blocked_prompt_is_reported() {
    let body = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string();
    let (base_url, _) = serve(vec![(200, "", body)]).await;
    let client = client(base_url);

    let err = generate(&client, &[Turn::user("Hi")]).await.unwrap_err();
    assert!(err.is_blocked(), "{err:?}");
}

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    let (base_url, seen) = serve(vec![(200, "", reply("unused"))]).await;
    let client = client(base_url).with_api_key(None);

    let err = generate(&client, &[Turn::user("Hi")]).await.unwrap_err();
    assert!(err.is_authentication(), "{err:?}");
    assert!(seen.lock().unwrap().is_empty());
}
