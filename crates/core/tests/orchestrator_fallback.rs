//! Orchestrator fallback integration tests.
//!
//! These tests run the backend chain against mock backends and a real
//! temporary download directory:
//! validation -> primary -> fallback -> aggregate failure

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tempfile::TempDir;

use vidgrab_core::{
    testing::{fixtures, MockBackend},
    BackendError, BackendErrorKind, DownloadStorage, Orchestrator, OrchestratorConfig,
    RetrievalBackend, RetrievalError, RetrievalRequest, StaticCookieSource, YouGetBackend,
    YtDlpBackend,
};
use vidgrab_core::config::{YouGetConfig, YtDlpConfig};

/// Test helper holding the mocks and directories for one scenario.
struct TestHarness {
    primary: Arc<MockBackend>,
    fallback: Arc<MockBackend>,
    download_dir: PathBuf,
    credential_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let download_dir = temp_dir.path().join("downloads");
        let credential_dir = temp_dir.path().join("credentials");
        std::fs::create_dir_all(&credential_dir).expect("Failed to create credential dir");

        Self {
            primary: Arc::new(MockBackend::new("primary").with_cookie_support()),
            fallback: Arc::new(MockBackend::new("fallback")),
            download_dir,
            credential_dir,
            _temp_dir: temp_dir,
        }
    }

    fn orchestrator(&self, cookies: Option<String>) -> Orchestrator {
        self.orchestrator_with_timeout(cookies, 30)
    }

    fn orchestrator_with_timeout(&self, cookies: Option<String>, timeout_secs: u64) -> Orchestrator {
        let config = OrchestratorConfig {
            timeout_secs,
            credential_dir: self.credential_dir.clone(),
            ..Default::default()
        };
        let backends = vec![
            self.primary.clone() as Arc<dyn RetrievalBackend>,
            self.fallback.clone() as Arc<dyn RetrievalBackend>,
        ];

        Orchestrator::new(
            config,
            backends,
            Arc::new(DownloadStorage::new(&self.download_dir)),
            Arc::new(StaticCookieSource::new(cookies)),
        )
    }

    fn entries(dir: &Path) -> Vec<String> {
        match std::fs::read_dir(dir) {
            Ok(entries) => {
                let mut names: Vec<String> = entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                names
            }
            Err(_) => Vec::new(),
        }
    }

    fn download_entries(&self) -> Vec<String> {
        Self::entries(&self.download_dir)
    }

    fn credential_entries(&self) -> Vec<String> {
        Self::entries(&self.credential_dir)
    }
}

fn encoded_cookies() -> String {
    STANDARD.encode(fixtures::netscape_cookies())
}

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[tokio::test]
async fn test_blank_url_rejected_before_any_backend() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Some(encoded_cookies()));

    for url in ["", "   ", "\n\t"] {
        let result = orchestrator.retrieve(&RetrievalRequest::new(url)).await;
        assert!(matches!(result, Err(RetrievalError::Validation(_))));
    }

    assert_eq!(harness.primary.invocation_count().await, 0);
    assert_eq!(harness.fallback.invocation_count().await, 0);
    assert!(!harness.download_dir.exists());
    assert!(harness.credential_entries().is_empty());
}

#[tokio::test]
async fn test_primary_success_skips_fallback() {
    let harness = TestHarness::new();
    harness.primary.succeed_with("Never Gonna Give You Up", "primary-bytes").await;
    let orchestrator = harness.orchestrator(None);

    let result = orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();

    assert_eq!(result.backend, "primary");
    assert_eq!(result.title, "Never Gonna Give You Up");
    assert_eq!(result.stored_filename, "Never Gonna Give You Up.mp4");
    assert_eq!(result.size_bytes, "primary-bytes".len() as u64);
    assert_eq!(harness.primary.invocation_count().await, 1);
    assert_eq!(harness.fallback.invocation_count().await, 0);

    // Only the stored file remains; the staging directory is gone.
    assert_eq!(harness.download_entries(), vec!["Never Gonna Give You Up.mp4"]);
    let stored = std::fs::read(harness.download_dir.join(&result.stored_filename)).unwrap();
    assert_eq!(stored, b"primary-bytes");
}

#[tokio::test]
async fn test_url_is_trimmed_before_backend_call() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(None);

    orchestrator
        .retrieve(&RetrievalRequest::new(format!("  {}  ", URL)))
        .await
        .unwrap();

    assert_eq!(harness.primary.recorded_invocations().await[0].url, URL);
}

#[tokio::test]
async fn test_primary_failure_falls_back() {
    let harness = TestHarness::new();
    harness
        .primary
        .fail_with(|| BackendError::extraction_failed("regex mismatch"))
        .await;
    harness.fallback.succeed_with("Fallback Title", "fallback-bytes").await;
    let orchestrator = harness.orchestrator(None);

    let result = orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();

    assert_eq!(result.backend, "fallback");
    assert_eq!(result.title, "Fallback Title");
    assert_eq!(result.stored_filename, "Fallback Title.mp4");
    assert_eq!(result.size_bytes, "fallback-bytes".len() as u64);
    assert_eq!(harness.primary.invocation_count().await, 1);
    assert_eq!(harness.fallback.invocation_count().await, 1);
    assert_eq!(harness.download_entries(), vec!["Fallback Title.mp4"]);
}

#[tokio::test]
async fn test_all_backends_failed() {
    let harness = TestHarness::new();
    harness
        .primary
        .fail_with(|| BackendError::authentication("Sign in to confirm you're not a bot"))
        .await;
    harness
        .fallback
        .fail_with(|| BackendError::extraction_failed("unsupported url"))
        .await;
    let orchestrator = harness.orchestrator(None);

    let err = orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap_err();

    match &err {
        RetrievalError::AllBackendsFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].backend, "primary");
            assert_eq!(failures[0].kind, BackendErrorKind::AuthenticationRequired);
            assert_eq!(failures[1].backend, "fallback");
            assert_eq!(failures[1].kind, BackendErrorKind::ExtractionFailed);
        }
        other => panic!("expected AllBackendsFailed, got {:?}", other),
    }
    assert!(err.user_message().starts_with("Both attempts failed"));
    assert!(err.to_string().contains("primary"));
    assert!(err.to_string().contains("fallback"));

    // No stored file and no leftover staging directories.
    assert!(harness.download_entries().is_empty());
}

#[tokio::test]
async fn test_cookie_file_removed_after_success() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Some(encoded_cookies()));

    orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();

    let invocation = &harness.primary.recorded_invocations().await[0];
    let cookie_path = invocation.cookie_file.clone().expect("cookie path passed");
    assert!(invocation.cookie_file_existed);
    assert_eq!(
        invocation.cookie_contents.as_deref(),
        Some(fixtures::netscape_cookies().as_bytes())
    );
    assert!(cookie_path.starts_with(&harness.credential_dir));
    assert!(!cookie_path.exists());
    assert!(harness.credential_entries().is_empty());
    assert!(!harness
        .download_entries()
        .iter()
        .any(|name| name.starts_with("cookies")));
}

#[tokio::test]
async fn test_cookie_file_removed_after_failure() {
    let harness = TestHarness::new();
    harness
        .primary
        .fail_with(|| BackendError::authentication("cookies expired"))
        .await;
    let orchestrator = harness.orchestrator(Some(encoded_cookies()));

    let result = orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();
    assert_eq!(result.backend, "fallback");

    let invocation = &harness.primary.recorded_invocations().await[0];
    assert!(invocation.cookie_file_existed);
    assert!(!invocation.cookie_file.as_ref().unwrap().exists());
    assert!(harness.credential_entries().is_empty());
}

#[tokio::test]
async fn test_no_cookie_material_means_no_cookie_path() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(None);

    orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();

    let invocation = &harness.primary.recorded_invocations().await[0];
    assert!(invocation.cookie_file.is_none());
    assert!(!invocation.cookie_file_existed);
}

#[tokio::test]
async fn test_undecodable_cookie_material_runs_unauthenticated() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Some("%%% not base64 %%%".to_string()));

    let result = orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();
    assert_eq!(result.backend, "primary");
    assert!(harness.primary.recorded_invocations().await[0]
        .cookie_file
        .is_none());
}

#[tokio::test]
async fn test_fallback_never_receives_cookies() {
    let harness = TestHarness::new();
    harness
        .primary
        .fail_with(|| BackendError::extraction_failed("blocked"))
        .await;
    let orchestrator = harness.orchestrator(Some(encoded_cookies()));

    orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();

    assert!(harness.fallback.recorded_invocations().await[0]
        .cookie_file
        .is_none());
}

#[tokio::test]
async fn test_hanging_backend_times_out_and_falls_back() {
    let harness = TestHarness::new();
    harness.primary.hang().await;
    let orchestrator = harness.orchestrator_with_timeout(Some(encoded_cookies()), 1);

    let result = orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap();

    assert_eq!(result.backend, "fallback");
    assert!(harness.credential_entries().is_empty());
}

#[tokio::test]
async fn test_timeout_is_reported_as_timed_out() {
    let harness = TestHarness::new();
    harness.primary.hang().await;
    harness.fallback.hang().await;
    let orchestrator = harness.orchestrator_with_timeout(None, 1);

    let err = orchestrator.retrieve(&RetrievalRequest::new(URL)).await.unwrap_err();
    match err {
        RetrievalError::AllBackendsFailed { failures } => {
            assert!(failures.iter().all(|f| f.kind == BackendErrorKind::TimedOut));
        }
        other => panic!("expected AllBackendsFailed, got {:?}", other),
    }
    assert!(harness.download_entries().is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_never_overwrite() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(None);

    let req_a = RetrievalRequest::new(URL);
    let req_b = RetrievalRequest::new(URL);
    let (a, b) = tokio::join!(orchestrator.retrieve(&req_a), orchestrator.retrieve(&req_b),);
    let mut names = vec![a.unwrap().stored_filename, b.unwrap().stored_filename];
    names.sort();

    assert_eq!(names, vec!["Mock Video (1).mp4", "Mock Video.mp4"]);
    assert_eq!(harness.download_entries(), names);
}

/// Write a stand-in tool that records each argument on its own line and fails.
#[cfg(unix)]
fn recording_tool(dir: &Path, name: &str, log: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nfor a in \"$@\"; do printf '%s\\n' \"$a\" >> '{}'; done\necho 'ERROR: Unsupported URL' >&2\nexit 1\n",
        log.display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn test_dash_prefixed_url_reaches_tools_as_operand() {
    let harness = TestHarness::new();
    let tools = harness._temp_dir.path().join("tools");
    std::fs::create_dir_all(&tools).unwrap();
    let ytdlp_log = tools.join("yt-dlp.log");
    let youget_log = tools.join("you-get.log");

    let backends: Vec<Arc<dyn RetrievalBackend>> = vec![
        Arc::new(YtDlpBackend::new(YtDlpConfig {
            path: recording_tool(&tools, "yt-dlp", &ytdlp_log),
            extra_args: Vec::new(),
        })),
        Arc::new(YouGetBackend::new(YouGetConfig {
            path: recording_tool(&tools, "you-get", &youget_log),
            ..Default::default()
        })),
    ];
    let orchestrator = Orchestrator::new(
        OrchestratorConfig {
            timeout_secs: 30,
            credential_dir: harness.credential_dir.clone(),
            ..Default::default()
        },
        backends,
        Arc::new(DownloadStorage::new(&harness.download_dir)),
        Arc::new(StaticCookieSource::none()),
    );

    let marker = tools.join("owned");
    let url = format!("--exec=touch {}", marker.display());
    let err = orchestrator
        .retrieve(&RetrievalRequest::new(url.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, RetrievalError::AllBackendsFailed { .. }));

    for log in [&ytdlp_log, &youget_log] {
        let contents = std::fs::read_to_string(log).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        let n = lines.len();
        assert!(n >= 2);
        assert_eq!(lines[n - 2], "--");
        assert_eq!(lines[n - 1], url);
    }
    assert!(!marker.exists());
}
