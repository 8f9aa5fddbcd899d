//! Fetching of content collections from the remote REST API.
//!
//! Every fetch runs on its own worker thread and reports back over a channel,
//! so the event loop never blocks on the network. Each request carries a
//! [`RequestId`]; the model only applies the outcome of the latest one.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::domain::{Category, Record};

pub type RequestId = u64;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server responded with status {status}")]
    Status { status: u16 },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can produce the full collection of a category.
pub trait ContentSource: Send + Sync {
    fn fetch(&self, category: Category) -> Result<Vec<Record>, FetchError>;
}

/// Fetches `GET <base_url>/<category>` without any query parameters or auth.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, category: Category) -> String {
        format!("{}/{}", self.base_url, category.path())
    }
}

impl ContentSource for HttpSource {
    fn fetch(&self, category: Category) -> Result<Vec<Record>, FetchError> {
        let url = self.url(category);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header(
                USER_AGENT,
                format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            )
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes()?;
        let records = category.decode(&body)?;
        debug!("Fetched {} {} from {url}", records.len(), category);
        Ok(records)
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub request_id: RequestId,
    pub category: Category,
    pub result: Result<Vec<Record>, FetchError>,
}

/// Issues fetches on background threads and collects their outcomes.
pub struct FetchWorker {
    source: Arc<dyn ContentSource>,
    sender: Sender<FetchOutcome>,
    receiver: Receiver<FetchOutcome>,
    last_request: RequestId,
}

impl FetchWorker {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            source,
            sender,
            receiver,
            last_request: 0,
        }
    }

    /// Start fetching `category`. Returns the id tagging this request, which
    /// is strictly greater than every id issued before.
    pub fn request(&mut self, category: Category) -> RequestId {
        self.last_request += 1;
        let request_id = self.last_request;
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();

        trace!("Spawning fetch #{request_id} for {category}");
        thread::spawn(move || {
            let result = source.fetch(category);
            if let Err(e) = &result {
                error!("Fetch #{request_id} for {category} failed: {e}");
            }
            // The receiver is gone when the app is shutting down.
            let _ = sender.send(FetchOutcome {
                request_id,
                category,
                result,
            });
        });
        request_id
    }

    pub fn last_request(&self) -> RequestId {
        self.last_request
    }

    /// Non blocking, returns the next finished fetch if there is one.
    pub fn poll(&self) -> Option<FetchOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;
    use std::time::Instant;

    struct StaticSource;

    impl ContentSource for StaticSource {
        fn fetch(&self, category: Category) -> Result<Vec<Record>, FetchError> {
            match category {
                Category::Posts => {
                    Ok(category.decode(br#"[{"userId":1,"id":1,"title":"Hello","body":"..."}]"#)?)
                }
                Category::Comments => Err(FetchError::Status { status: 503 }),
            }
        }
    }

    fn wait_for(worker: &FetchWorker) -> FetchOutcome {
        let start = Instant::now();
        loop {
            if let Some(outcome) = worker.poll() {
                return outcome;
            }
            assert!(start.elapsed() < Duration::from_secs(5), "fetch never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn request_ids_increase() {
        let mut worker = FetchWorker::new(Arc::new(StaticSource));
        let a = worker.request(Category::Posts);
        let b = worker.request(Category::Posts);
        assert!(b > a);
        assert_eq!(worker.last_request(), b);
    }

    #[test]
    fn worker_reports_success_and_failure() {
        let mut worker = FetchWorker::new(Arc::new(StaticSource));
        let id = worker.request(Category::Posts);
        let outcome = wait_for(&worker);
        assert_eq!(outcome.request_id, id);
        assert_eq!(outcome.category, Category::Posts);
        assert_eq!(outcome.result.unwrap().len(), 1);

        let id = worker.request(Category::Comments);
        let outcome = wait_for(&worker);
        assert_eq!(outcome.request_id, id);
        assert!(matches!(
            outcome.result,
            Err(FetchError::Status { status: 503 })
        ));
    }

    /// Serves a single HTTP response on a free local port. The handle yields
    /// the request line that was received.
    fn serve_once(status: &str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut header = String::new();
            while reader.read_line(&mut header).unwrap() > 0 && header != "\r\n" {
                header.clear();
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            request_line.trim_end().to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn http_source_fetches_category() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"[{"userId":1,"id":1,"title":"Hello","body":"..."},{"userId":1,"id":2,"title":"World"}]"#,
        );
        let source = HttpSource::new(&base_url, Some(Duration::from_secs(5))).unwrap();
        let records = source.fetch(Category::Posts).unwrap();
        assert_eq!(server.join().unwrap(), "GET /posts HTTP/1.1");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title(), Some("Hello"));
        assert_eq!(records[1].id(), 2);
    }

    #[test]
    fn http_source_maps_error_status() {
        let (base_url, server) = serve_once("404 Not Found", r#"{}"#);
        let source = HttpSource::new(&base_url, Some(Duration::from_secs(5))).unwrap();
        let result = source.fetch(Category::Comments);
        assert_eq!(server.join().unwrap(), "GET /comments HTTP/1.1");
        assert!(matches!(result, Err(FetchError::Status { status: 404 })));
    }

    #[test]
    fn http_source_rejects_non_array_body() {
        let (base_url, server) = serve_once("200 OK", r#"{"id":1,"title":"Hello"}"#);
        let source = HttpSource::new(&base_url, Some(Duration::from_secs(5))).unwrap();
        let result = source.fetch(Category::Posts);
        server.join().unwrap();
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn http_source_builds_category_urls() {
        let source = HttpSource::new("http://localhost:8080/", None).unwrap();
        assert_eq!(source.url(Category::Posts), "http://localhost:8080/posts");
        assert_eq!(source.url(Category::Comments), "http://localhost:8080/comments");
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        assert!(Category::Posts.decode(br#"{"id": 1}"#).is_err());
        assert!(Category::Comments.decode(br#"[{"name": "no id"}]"#).is_err());
    }

    #[test]
    fn decode_tolerates_missing_label() {
        let records = Category::Comments
            .decode(br#"[{"postId":1,"id":7,"email":"a@b.c","body":"x"}]"#)
            .unwrap();
        assert_eq!(records[0].id(), 7);
        assert_eq!(records[0].name(), None);
    }
}
