use docprobe_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result, Sleeper};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod mutate;
pub mod normalize;
pub mod probe;
pub mod structure;
pub mod uniqueness;

pub use mutate::IdMutationEngine;
pub use normalize::ContentNormalizer;
pub use probe::ProbeRunner;
pub use structure::analyze as analyze_structure;
pub use uniqueness::analyze as analyze_uniqueness;

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            // Fallback bounds; per-request timeouts (FetchRequest.timeout_ms) override these.
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    fn apply_headers(
        &self,
        mut rb: reqwest::RequestBuilder,
        headers: &BTreeMap<String, String>,
    ) -> reqwest::RequestBuilder {
        for (k, v) in headers {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(k.as_bytes()),
                reqwest::header::HeaderValue::from_str(v),
            ) {
                rb = rb.header(name, value);
            }
        }
        rb
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Fetch(e.to_string())
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        rb = self.apply_headers(rb, &req.headers);
        let resp = rb.send().await.map_err(transport_error)?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(transport_error)?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            truncated,
        })
    }
}

/// Real-time delay between probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        response::Redirect,
        routing::get,
        Router,
    };
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn local_fetcher_reports_status_without_erroring() {
        let app = Router::new()
            .route(
                "/ok",
                get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<title>x</title>") }),
            )
            .route("/private", get(|| async { StatusCode::FORBIDDEN }));
        let addr = serve(app).await;
        let fetcher = LocalFetcher::new("docprobe-test").unwrap();

        let ok = fetcher
            .fetch(&FetchRequest::get(format!("http://{addr}/ok")))
            .await
            .unwrap();
        assert_eq!(ok.status, 200);
        assert_eq!(ok.content_type.as_deref(), Some("text/html"));
        assert_eq!(ok.text_lossy(), "<title>x</title>");

        let private = fetcher
            .fetch(&FetchRequest::get(format!("http://{addr}/private")))
            .await
            .unwrap();
        assert_eq!(private.status, 403);
        assert!(!private.is_success());
    }

    #[tokio::test]
    async fn local_fetcher_follows_redirects() {
        let app = Router::new()
            .route("/old", get(|| async { Redirect::temporary("/new") }))
            .route("/new", get(|| async { "moved here" }));
        let addr = serve(app).await;
        let fetcher = LocalFetcher::new("docprobe-test").unwrap();

        let r = fetcher
            .fetch(&FetchRequest::get(format!("http://{addr}/old")))
            .await
            .unwrap();
        assert_eq!(r.status, 200);
        assert!(r.final_url.ends_with("/new"), "final_url={}", r.final_url);
        assert_eq!(r.text_lossy(), "moved here");
    }

    #[tokio::test]
    async fn local_fetcher_caps_body_at_max_bytes() {
        let app = Router::new().route("/big", get(|| async { "x".repeat(10_000) }));
        let addr = serve(app).await;
        let fetcher = LocalFetcher::new("docprobe-test").unwrap();

        let mut req = FetchRequest::get(format!("http://{addr}/big"));
        req.max_bytes = Some(100);
        let r = fetcher.fetch(&req).await.unwrap();
        assert_eq!(r.bytes.len(), 100);
        assert!(r.truncated);
    }

    #[tokio::test]
    async fn local_fetcher_times_out_as_transport_error() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let addr = serve(app).await;
        let fetcher = LocalFetcher::new("docprobe-test").unwrap();

        let mut req = FetchRequest::get(format!("http://{addr}/slow"));
        req.timeout_ms = Some(100);
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)), "err={err}");
    }

    #[tokio::test]
    async fn bodies_decode_as_utf8_whatever_the_declared_charset() {
        let app = Router::new().route(
            "/latin1",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html; charset=iso-8859-1")],
                    // "café" in latin-1.
                    vec![b'c', b'a', b'f', 0xE9],
                )
            }),
        );
        let addr = serve(app).await;
        let fetcher = LocalFetcher::new("docprobe-test").unwrap();

        let r = fetcher
            .fetch(&FetchRequest::get(format!("http://{addr}/latin1")))
            .await
            .unwrap();
        assert_eq!(r.bytes, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(r.text_lossy(), "caf\u{FFFD}");
    }

    #[tokio::test]
    async fn local_fetcher_rejects_unparseable_urls() {
        let fetcher = LocalFetcher::new("docprobe-test").unwrap();
        let err = fetcher
            .fetch(&FetchRequest::get("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
