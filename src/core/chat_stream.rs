//! Streaming chat completions.
//!
//! [`CompletionBackend`] turns a transcript plus parameters into a lazy
//! [`FragmentStream`]. [`ChatStreamService`] drives one of those streams on a
//! Tokio task and forwards the fragments, tagged with a stream id, to the UI
//! loop.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ChatCompletion, ChatMessage, ChatRequest, ChatResponse};
use crate::core::error::{summarize_api_error, CompletionError};
use crate::core::message::Message;
use crate::core::params::GenerationParameters;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// Finite, forward-only sequence of response fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

/// Everything one request needs from the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub api_key: String,
    pub system_prompt: Option<Message>,
    pub history: Vec<Message>,
    pub params: GenerationParameters,
}

impl CompletionRequest {
    /// The optional system message followed by the history, in order.
    pub fn api_messages(&self) -> Vec<ChatMessage> {
        self.system_prompt
            .iter()
            .chain(self.history.iter())
            .map(ChatMessage::from)
            .collect()
    }
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, CompletionError>;
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Fragment(String),
    Done,
    Failed(CompletionError),
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(payload: &str) -> Option<SseEvent> {
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(SseEvent::Fragment),
        Err(_) => {
            if payload.trim().is_empty() {
                return None;
            }
            Some(SseEvent::Failed(CompletionError::Api {
                status: None,
                message: summarize_api_error(payload),
            }))
        }
    }
}

fn decode_line(raw: &[u8]) -> Option<SseEvent> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim(),
        Err(e) => {
            warn!("invalid UTF-8 in stream: {e}");
            return None;
        }
    };
    extract_data_payload(line).and_then(handle_data_payload)
}

/// Splits a byte stream into server-sent-event lines. Lines may arrive split
/// across any number of network chunks.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(event) = decode_line(&line[..newline_pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Decode a final line that was not newline-terminated.
    fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest).into_iter().collect()
    }
}

struct SseState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, CompletionError>>,
    finished: bool,
    cancel: CancellationToken,
}

impl<S> SseState<S> {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            if self.finished {
                break;
            }
            match event {
                SseEvent::Fragment(text) => self.pending.push_back(Ok(text)),
                SseEvent::Done => self.finished = true,
                SseEvent::Failed(err) => {
                    self.pending.push_back(Err(err));
                    self.finished = true;
                }
            }
        }
    }
}

/// Adapt a raw SSE response body into a [`FragmentStream`].
///
/// The stream ends at `[DONE]`, at the end of the body, after the first
/// error, or as soon as `cancel` fires.
pub fn sse_fragments<S, B, E>(body: S, cancel: CancellationToken) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = SseState {
        body: Box::pin(body),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
        cancel,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            let next = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => return None,
                next = state.body.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(bytes.as_ref());
                    state.absorb(events);
                }
                Some(Err(err)) => {
                    state
                        .pending
                        .push_back(Err(CompletionError::Transport(err.to_string())));
                    state.finished = true;
                }
                None => {
                    let events = state.decoder.finish();
                    state.absorb(events);
                    state.finished = true;
                }
            }
        }
    }))
}

fn is_json_content_type(headers: &reqwest::header::HeaderMap) -> bool {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") && !value.contains("event-stream")
        })
        .unwrap_or(false)
}

fn parse_whole_completion(body: &str) -> Result<Option<String>, CompletionError> {
    match serde_json::from_str::<ChatCompletion>(body) {
        Ok(completion) => Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())),
        Err(_) => Err(CompletionError::Api {
            status: None,
            message: summarize_api_error(body),
        }),
    }
}

/// [`CompletionBackend`] for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    base_url: String,
    send_top_k: bool,
}

impl HttpCompletionClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, send_top_k: bool) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            send_top_k,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(timeout)
            .build()
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, CompletionError> {
        let api_key = request.api_key.trim();
        if api_key.is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let body = ChatRequest::new(&request.params, request.api_messages(), self.send_top_k);
        let chat_url = construct_api_url(&self.base_url, "chat/completions");
        debug!(
            url = %chat_url,
            model = %body.model,
            messages = body.messages.len(),
            "sending chat completion request"
        );

        let http_request = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream, application/json");
        let http_request = add_auth_headers(http_request, api_key);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(Box::pin(stream::empty::<Result<String, CompletionError>>()));
            }
            response = http_request.json(&body).send() => {
                response.map_err(|e| CompletionError::from_reqwest(&e))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(status = status.as_u16(), "chat completion request failed");
            return Err(CompletionError::from_status(status.as_u16(), &error_text));
        }

        if is_json_content_type(response.headers()) {
            let text = response
                .text()
                .await
                .map_err(|e| CompletionError::from_reqwest(&e))?;
            let content = parse_whole_completion(&text)?;
            return Ok(Box::pin(stream::iter(content.into_iter().map(Ok))));
        }

        Ok(sse_fragments(response.bytes_stream(), cancel))
    }
}

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(CompletionError),
    End,
}

pub struct StreamParams {
    pub backend: Arc<dyn CompletionBackend>,
    pub request: CompletionRequest,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

async fn forward_fragments(
    backend: Arc<dyn CompletionBackend>,
    request: CompletionRequest,
    cancel_token: CancellationToken,
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    let mut fragments = match backend
        .stream_completion(request, cancel_token.clone())
        .await
    {
        Ok(fragments) => fragments,
        Err(err) => {
            debug!(stream_id, "stream failed before the first fragment: {err}");
            let _ = tx.send((StreamMessage::Error(err), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    while let Some(item) = fragments.next().await {
        match item {
            Ok(text) => {
                let _ = tx.send((StreamMessage::Chunk(text), stream_id));
            }
            Err(err) => {
                debug!(stream_id, "stream failed: {err}");
                let _ = tx.send((StreamMessage::Error(err), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
                return;
            }
        }
    }

    if !cancel_token.is_cancelled() {
        let _ = tx.send((StreamMessage::End, stream_id));
    }
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                backend,
                request,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = forward_fragments(backend, request, cancel_token.clone(), tx_clone, stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream cancelled");
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::SamplingSettings;
    use crate::utils::test_utils::{
        header_value, spawn_fake_server, FakeBackend, FakeReply,
    };

    fn sample_request(api_key: &str) -> CompletionRequest {
        let settings = SamplingSettings {
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.7,
            ..SamplingSettings::default()
        };
        CompletionRequest {
            api_key: api_key.to_string(),
            system_prompt: Some(Message::system("Be funny.")),
            history: vec![Message::user("Hello")],
            params: GenerationParameters::from_settings("test-model", &settings),
        }
    }

    fn test_client(base_url: &str) -> HttpCompletionClient {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client");
        HttpCompletionClient::new(client, base_url, false)
    }

    fn sse_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String, CompletionError>> {
        stream.collect().await
    }

    #[test]
    fn decoder_handles_spacing_variants() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(
            concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n",
                "data:{\"choices\":[{\"delta\":{\"content\":\"World\"}}]}\r\n",
                "data:[DONE]\n"
            )
            .as_bytes(),
        );
        assert_eq!(
            events,
            vec![
                SseEvent::Fragment("Hello".into()),
                SseEvent::Fragment("World".into()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn decoder_reassembles_lines_split_across_chunks() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n";
        let bytes = line.as_bytes();
        // Split inside the two-byte 'é' as well as inside the JSON.
        let split = line.find('é').expect("accent") + 1;

        let mut decoder = SseDecoder::default();
        assert!(decoder.push(&bytes[..10]).is_empty());
        assert!(decoder.push(&bytes[10..split]).is_empty());
        assert_eq!(
            decoder.push(&bytes[split..]),
            vec![SseEvent::Fragment("héllo".into())]
        );
    }

    #[test]
    fn decoder_ignores_comments_events_and_role_only_deltas() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(
            concat!(
                ": keep-alive\n",
                "event: message\n",
                "\n",
                "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
                "data: {\"choices\":[]}\n"
            )
            .as_bytes(),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn decoder_routes_stream_errors() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b"data: {\"error\":{\"message\":\"internal server error\"}}\n");
        assert_eq!(
            events,
            vec![SseEvent::Failed(CompletionError::Api {
                status: None,
                message: "internal server error".into(),
            })]
        );
    }

    #[test]
    fn decoder_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::default();
        assert!(decoder
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}")
            .is_empty());
        assert_eq!(decoder.finish(), vec![SseEvent::Fragment("tail".into())]);
    }

    #[tokio::test]
    async fn sse_fragments_stop_at_done() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\" there!\"}}]}\ndata: [DONE]\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n".to_vec()),
        ];
        let fragments = collect(sse_fragments(stream::iter(chunks), CancellationToken::new())).await;
        assert_eq!(fragments, vec![Ok("Hi".to_string()), Ok(" there!".to_string())]);
    }

    #[tokio::test]
    async fn sse_fragments_surface_body_errors_after_received_text() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let fragments = collect(sse_fragments(stream::iter(chunks), CancellationToken::new())).await;
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], Ok("partial".to_string()));
        assert_eq!(fragments[1], Err(CompletionError::Transport("reset".into())));
    }

    #[tokio::test]
    async fn sse_fragments_end_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            vec![Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n".to_vec())];
        let fragments = collect(sse_fragments(stream::iter(chunks), cancel)).await;
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn http_client_streams_fragments_and_sends_parameters() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there!\"}}]}\n\n",
            "data: [DONE]\n\n"
        );
        let (base_url, server) = spawn_fake_server(vec![sse_response(body)]).await;

        let client = test_client(&base_url);
        let fragments = client
            .stream_completion(sample_request("secret-key"), CancellationToken::new())
            .await
            .expect("stream starts");
        let fragments: Vec<String> = collect(fragments)
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("no errors");
        assert_eq!(fragments.concat(), "Hi there!");

        let requests = server.await.expect("server task").expect("server ok");
        let request = &requests[0];
        assert_eq!(request.request_line, "POST /v1/chat/completions HTTP/1.1");
        assert_eq!(
            header_value(&request.headers, "authorization").as_deref(),
            Some("Bearer secret-key")
        );

        let json: serde_json::Value = serde_json::from_slice(&request.body).expect("json body");
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["temperature"].as_f64(), Some(0.7));
        assert_eq!(json["top_p"].as_f64(), Some(0.7));
        assert!(json.get("top_k").is_none());
        assert_eq!(
            json["messages"],
            serde_json::json!([
                {"role": "system", "content": "Be funny."},
                {"role": "user", "content": "Hello"}
            ])
        );
    }

    #[tokio::test]
    async fn http_client_maps_unauthorized_to_authentication_error() {
        let body = r#"{"error":{"message":"Invalid API key"}}"#;
        let response = format!(
            "HTTP/1.1 401 Unauthorized\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base_url, server) = spawn_fake_server(vec![response]).await;

        let err = match test_client(&base_url)
            .stream_completion(sample_request("wrong"), CancellationToken::new())
            .await
        {
            Ok(_) => panic!("expected authentication failure"),
            Err(err) => err,
        };
        assert_eq!(
            err,
            CompletionError::Authentication {
                status: 401,
                message: "Invalid API key".into(),
            }
        );
        server.await.expect("server task").expect("server ok");
    }

    #[tokio::test]
    async fn http_client_accepts_non_streaming_json_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Whole answer"}}]}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base_url, server) = spawn_fake_server(vec![response]).await;

        let fragments = test_client(&base_url)
            .stream_completion(sample_request("key"), CancellationToken::new())
            .await
            .expect("stream starts");
        assert_eq!(collect(fragments).await, vec![Ok("Whole answer".to_string())]);
        server.await.expect("server task").expect("server ok");
    }

    #[tokio::test]
    async fn http_client_refuses_empty_key_without_network() {
        // Port 9 (discard) is never contacted: the key check comes first.
        let client = test_client("http://127.0.0.1:9/v1");
        let result = client
            .stream_completion(sample_request("   "), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CompletionError::MissingApiKey)));
    }

    #[tokio::test]
    async fn service_forwards_chunks_then_end() {
        let backend = Arc::new(FakeBackend::new(vec![FakeReply::Fragments(vec![
            "Hi".into(),
            " there!".into(),
        ])]));
        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(StreamParams {
            backend: backend.clone(),
            request: sample_request("key"),
            cancel_token: CancellationToken::new(),
            stream_id: 7,
        });

        let mut received = String::new();
        loop {
            let (message, stream_id) = rx.recv().await.expect("message");
            assert_eq!(stream_id, 7);
            match message {
                StreamMessage::Chunk(text) => received.push_str(&text),
                StreamMessage::End => break,
                StreamMessage::Error(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!(received, "Hi there!");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn service_reports_backend_errors_then_end() {
        let backend = Arc::new(FakeBackend::new(vec![FakeReply::Fail(
            CompletionError::Transport("connection refused".into()),
        )]));
        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(StreamParams {
            backend,
            request: sample_request("key"),
            cancel_token: CancellationToken::new(),
            stream_id: 3,
        });

        let (first, _) = rx.recv().await.expect("error");
        assert!(matches!(first, StreamMessage::Error(CompletionError::Transport(_))));
        let (second, _) = rx.recv().await.expect("end");
        assert!(matches!(second, StreamMessage::End));
    }
}
