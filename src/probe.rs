//! Network liveness probing for candidate media URLs.
//!
//! A probe is a HEAD request bounded by a fixed timeout and a small retry
//! budget. Probe failures never surface as errors; they only feed the
//! inclusion decisions made by the episode and source checks.

use std::time::{Duration, Instant};

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{REFERER, USER_AGENT};
use serde::Serialize;
use url::Url;

use crate::config::{BROWSER_USER_AGENT, ProbeSettings};
use crate::queue::ProbeQueue;

const VIDEO_EXTENSIONS: &[&str] = &[".m3u8", ".mp4", ".flv", ".avi", ".mkv", ".ts"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    InvalidFormat,
    Timeout,
    Status(u16),
    Network(String),
}

impl FailureReason {
    /// Whether another attempt may change the outcome.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidFormat => false,
            Self::Timeout | Self::Network(_) => true,
            Self::Status(code) => *code == 429 || (500..600).contains(code),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => f.write_str("Invalid URL format"),
            Self::Timeout => f.write_str("timed out"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Network(msg) => write!(f, "connection failed: {msg}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LivenessProbeResult {
    pub url: String,
    pub is_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    pub elapsed_ms: u64,
    /// Network attempts made; zero when the URL was rejected up front.
    pub attempts: u32,
}

impl LivenessProbeResult {
    pub fn reachable(url: &str, elapsed: Duration, attempts: u32) -> Self {
        Self {
            url: url.to_owned(),
            is_reachable: true,
            failure: None,
            elapsed_ms: elapsed.as_millis() as u64,
            attempts,
        }
    }

    pub fn unreachable(
        url: &str,
        failure: FailureReason,
        elapsed: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            url: url.to_owned(),
            is_reachable: false,
            failure: Some(failure),
            elapsed_ms: elapsed.as_millis() as u64,
            attempts,
        }
    }

    pub fn invalid_format(url: &str) -> Self {
        Self::unreachable(url, FailureReason::InvalidFormat, Duration::ZERO, 0)
    }
}

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, url: &str) -> LivenessProbeResult;
}

/// Syntactic check only: parses and requires an http(s) scheme.
pub fn is_valid_url_format(url: &str) -> bool {
    parse_probe_url(url).is_some()
}

fn parse_probe_url(url: &str) -> Option<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(parsed),
        _ => None,
    }
}

pub fn is_manifest_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains(".m3u8")
}

pub fn is_likely_video_url(url: &str) -> bool {
    if !is_valid_url_format(url) {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

/// 2xx passes; 403 passes too because many hosts refuse HEAD but serve playback.
pub fn status_is_reachable(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::FORBIDDEN
}

#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    settings: ProbeSettings,
}

impl HttpProbe {
    pub fn new(settings: ProbeSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build liveness probe http client")?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    async fn attempt(&self, url: &Url) -> Result<StatusCode, FailureReason> {
        let request = self
            .client
            .head(url.clone())
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(REFERER, url.origin().ascii_serialization())
            .send();

        // Dropping the in-flight future on timeout aborts this probe only.
        match tokio::time::timeout(self.settings.timeout, request).await {
            Err(_) => Err(FailureReason::Timeout),
            Ok(Err(err)) if err.is_timeout() => Err(FailureReason::Timeout),
            Ok(Err(err)) => Err(FailureReason::Network(err.to_string())),
            Ok(Ok(response)) => Ok(response.status()),
        }
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self, url: &str) -> LivenessProbeResult {
        let Some(parsed) = parse_probe_url(url) else {
            return LivenessProbeResult::invalid_format(url);
        };

        let started = Instant::now();
        let max_attempts = self.settings.retries.saturating_add(1);
        let mut attempts = 0_u32;
        let mut last_failure = FailureReason::Timeout;

        while attempts < max_attempts {
            attempts += 1;
            let failure = match self.attempt(&parsed).await {
                Ok(status) if status_is_reachable(status) => {
                    return LivenessProbeResult::reachable(url, started.elapsed(), attempts);
                }
                Ok(status) => FailureReason::Status(status.as_u16()),
                Err(reason) => reason,
            };

            tracing::debug!(url, attempt = attempts, reason = %failure, "probe attempt failed");
            let transient = failure.is_transient();
            last_failure = failure;
            if !transient {
                break;
            }
            if attempts < max_attempts {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        tracing::debug!(
            url,
            attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            reason = %last_failure,
            "probe gave up"
        );
        LivenessProbeResult::unreachable(url, last_failure, started.elapsed(), attempts)
    }
}

/// Probes every url through `queue`; results keep the input order.
pub async fn probe_many(
    probe: &dyn LivenessProbe,
    queue: &ProbeQueue,
    urls: &[String],
) -> Vec<LivenessProbeResult> {
    queue
        .run_all(urls.iter().map(|url| probe.probe(url)))
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    struct StubServer {
        base_url: String,
        hits: Arc<AtomicUsize>,
        shutdown_tx: mpsc::Sender<()>,
        handle: thread::JoinHandle<()>,
    }

    impl StubServer {
        fn stop(self) -> usize {
            let _ = self.shutdown_tx.send(());
            let _ = self.handle.join();
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn spawn_media_server() -> StubServer {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_for_thread = Arc::clone(&hits);
        let flaky = AtomicUsize::new(0);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                let request = match server.recv_timeout(Duration::from_millis(20)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };
                hits_for_thread.fetch_add(1, Ordering::SeqCst);

                let status = match request.url() {
                    "/ok.m3u8" => 200,
                    "/partial.mp4" => 206,
                    "/forbidden.mp4" => 403,
                    "/missing.mp4" => 404,
                    "/broken.mp4" => 500,
                    "/flaky.mp4" => {
                        if flaky.fetch_add(1, Ordering::SeqCst) < 2 {
                            503
                        } else {
                            200
                        }
                    }
                    "/slow.mp4" => {
                        thread::sleep(Duration::from_millis(300));
                        200
                    }
                    _ => 404,
                };
                let _ = request.respond(tiny_http::Response::empty(status));
            }
        });

        StubServer {
            base_url,
            hits,
            shutdown_tx,
            handle,
        }
    }

    fn fast_settings() -> ProbeSettings {
        ProbeSettings {
            timeout: Duration::from_millis(150),
            retry_delay: Duration::from_millis(10),
            ..ProbeSettings::default()
        }
    }

    #[test]
    fn url_format_requires_http_scheme() {
        assert!(is_valid_url_format("https://cdn.example.com/a.m3u8"));
        assert!(is_valid_url_format("http://cdn.example.com/a.mp4"));
        assert!(!is_valid_url_format(""));
        assert!(!is_valid_url_format("cdn.example.com/a.m3u8"));
        assert!(!is_valid_url_format("ftp://cdn.example.com/a.mp4"));
        assert!(!is_valid_url_format("javascript:alert(1)"));
    }

    #[test]
    fn likely_video_url_checks_extension() {
        assert!(is_likely_video_url("https://cdn.example.com/index.M3U8"));
        assert!(is_likely_video_url("https://cdn.example.com/movie.mkv?x=1"));
        assert!(!is_likely_video_url("https://cdn.example.com/page.html"));
        assert!(!is_likely_video_url("ftp://cdn.example.com/movie.mp4"));
    }

    #[test]
    fn transient_failures_are_classified() {
        assert!(FailureReason::Timeout.is_transient());
        assert!(FailureReason::Network("reset".to_owned()).is_transient());
        assert!(FailureReason::Status(502).is_transient());
        assert!(FailureReason::Status(429).is_transient());
        assert!(!FailureReason::Status(404).is_transient());
        assert!(!FailureReason::InvalidFormat.is_transient());
    }

    #[tokio::test]
    async fn malformed_urls_never_touch_the_network() {
        let server = spawn_media_server();
        let probe = HttpProbe::new(fast_settings()).unwrap();

        for url in ["", "not a url", "ftp://127.0.0.1/x.mp4", "file:///etc/passwd"] {
            let out = probe.probe(url).await;
            assert!(!out.is_reachable);
            assert_eq!(out.failure, Some(FailureReason::InvalidFormat));
            assert_eq!(out.attempts, 0);
        }

        assert_eq!(server.stop(), 0);
    }

    #[tokio::test]
    async fn success_partial_and_forbidden_are_reachable() {
        let server = spawn_media_server();
        let probe = HttpProbe::new(fast_settings()).unwrap();

        for path in ["/ok.m3u8", "/partial.mp4", "/forbidden.mp4"] {
            let out = probe.probe(&format!("{}{path}", server.base_url)).await;
            assert!(out.is_reachable, "{path} should be reachable");
            assert_eq!(out.attempts, 1);
        }

        server.stop();
    }

    #[tokio::test]
    async fn terminal_status_is_not_retried() {
        let server = spawn_media_server();
        let probe = HttpProbe::new(fast_settings()).unwrap();

        let out = probe
            .probe(&format!("{}/missing.mp4", server.base_url))
            .await;
        assert!(!out.is_reachable);
        assert_eq!(out.failure, Some(FailureReason::Status(404)));
        assert_eq!(out.attempts, 1);

        assert_eq!(server.stop(), 1);
    }

    #[tokio::test]
    async fn server_errors_exhaust_the_retry_budget() {
        let server = spawn_media_server();
        let probe = HttpProbe::new(fast_settings()).unwrap();

        let out = probe.probe(&format!("{}/broken.mp4", server.base_url)).await;
        assert!(!out.is_reachable);
        assert_eq!(out.failure, Some(FailureReason::Status(500)));
        assert_eq!(out.attempts, 3);

        assert_eq!(server.stop(), 3);
    }

    #[tokio::test]
    async fn transient_failure_recovers_within_budget() {
        let server = spawn_media_server();
        let probe = HttpProbe::new(fast_settings()).unwrap();

        let out = probe.probe(&format!("{}/flaky.mp4", server.base_url)).await;
        assert!(out.is_reachable);
        assert_eq!(out.attempts, 3);

        server.stop();
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = spawn_media_server();
        let probe = HttpProbe::new(ProbeSettings {
            retries: 0,
            ..fast_settings()
        })
        .unwrap();

        let out = probe.probe(&format!("{}/slow.mp4", server.base_url)).await;
        assert!(!out.is_reachable);
        assert_eq!(out.failure, Some(FailureReason::Timeout));

        server.stop();
    }

    #[tokio::test]
    async fn probe_many_keeps_input_order() {
        let server = spawn_media_server();
        let probe = HttpProbe::new(fast_settings()).unwrap();
        let queue = ProbeQueue::new(2);

        let urls = vec![
            format!("{}/missing.mp4", server.base_url),
            "bogus".to_owned(),
            format!("{}/ok.m3u8", server.base_url),
        ];
        let out = probe_many(&probe, &queue, &urls).await;
        let reachable = out.iter().map(|r| r.is_reachable).collect::<Vec<_>>();
        assert_eq!(reachable, vec![false, false, true]);
        assert_eq!(out[1].url, "bogus");

        server.stop();
    }
}
