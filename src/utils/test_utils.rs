use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::app::{App, AppInitConfig};
use crate::core::chat_stream::{CompletionBackend, CompletionRequest, FragmentStream};
use crate::core::config::Config;
use crate::core::error::CompletionError;

/// A request as seen by [`spawn_fake_server`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

pub fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Result<CapturedRequest, String> {
    use tokio::io::AsyncReadExt;

    let mut buffer = Vec::new();
    let header_end = loop {
        if let Some(index) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break index + 4;
        }
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("connection closed before the request headers ended".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
    };

    let head = std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = head.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "missing request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    let content_length = header_value(&headers, "content-length")
        .map(|value| value.parse::<usize>().map_err(|err| err.to_string()))
        .transpose()?
        .unwrap_or(0);

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length - body.len()];
        let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("connection closed before the request body ended".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

/// Serve each canned raw HTTP response to one connection, in order.
///
/// Returns a base URL ending in `/v1` and a handle resolving to the captured
/// requests once every response has been written.
pub async fn spawn_fake_server(
    responses: Vec<String>,
) -> (String, JoinHandle<Result<Vec<CapturedRequest>, String>>) {
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
            captured.push(read_http_request(&mut stream).await?);
            stream
                .write_all(response.as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            stream.shutdown().await.map_err(|err| err.to_string())?;
        }
        Ok(captured)
    });

    (format!("http://{addr}/v1"), handle)
}

/// What a [`FakeBackend`] does for one call.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Fragments(Vec<String>),
    /// Fail before producing a stream.
    Fail(CompletionError),
    /// Yield some fragments, then an error.
    FailMidStream(Vec<String>, CompletionError),
    /// Never yields; ends only when cancelled.
    Hang,
}

/// Scripted [`CompletionBackend`] that records every request it receives.
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<Vec<FakeReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeBackend {
    pub fn new(replies: Vec<FakeReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, CompletionError> {
        self.requests.lock().expect("requests lock").push(request);
        let reply = {
            let mut replies = self.replies.lock().expect("replies lock");
            if replies.is_empty() {
                FakeReply::Fragments(Vec::new())
            } else {
                replies.remove(0)
            }
        };

        match reply {
            FakeReply::Fragments(fragments) => {
                Ok(Box::pin(stream::iter(fragments.into_iter().map(Ok))))
            }
            FakeReply::Fail(err) => Err(err),
            FakeReply::FailMidStream(fragments, err) => Ok(Box::pin(stream::iter(
                fragments
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(err))),
            ))),
            FakeReply::Hang => Ok(Box::pin(stream::unfold(cancel, |cancel| async move {
                cancel.cancelled().await;
                None::<(Result<String, CompletionError>, CancellationToken)>
            }))),
        }
    }
}

/// An app already past the key gate, backed by `backend`.
pub fn create_test_app_with_backend(backend: Arc<dyn CompletionBackend>) -> App {
    let init = AppInitConfig {
        config: Config::default(),
        ..AppInitConfig::default()
    };
    let mut app = App::with_backend(init, "http://localhost/v1".to_string(), backend);
    app.session.set_api_key("test-key");
    app.ui.show_chat();
    app
}

pub fn create_test_app() -> App {
    create_test_app_with_backend(Arc::new(FakeBackend::default()))
}
