//! Mock retrieval backend for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{AttemptContext, BackendError, BackendOutput, RetrievalBackend};
use crate::stream::ContainerFormat;

/// A recorded invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub url: String,
    pub staging_dir: PathBuf,
    /// Cookie path passed in the attempt context.
    pub cookie_file: Option<PathBuf>,
    /// Whether that path existed on disk while the backend ran.
    pub cookie_file_existed: bool,
    /// Contents of the cookie file as seen by the backend.
    pub cookie_contents: Option<Vec<u8>>,
}

type ErrorFactory = Arc<dyn Fn() -> BackendError + Send + Sync>;

#[derive(Clone)]
enum Behavior {
    Succeed {
        title: String,
        contents: Vec<u8>,
        container: ContainerFormat,
    },
    Fail(ErrorFactory),
    Hang,
}

/// Mock implementation of the RetrievalBackend trait.
///
/// Provides controllable behavior for testing:
/// - Record every invocation, including the cookie file it was given
/// - Succeed by writing a file into the staging directory
/// - Fail with a chosen error, or hang until the orchestrator times out
///
/// # Example
///
/// ```rust,ignore
/// use vidgrab_core::testing::MockBackend;
///
/// let primary = MockBackend::new("primary").with_cookie_support();
/// primary.fail_with(|| BackendError::extraction_failed("blocked")).await;
///
/// // Run the orchestrator...
///
/// assert_eq!(primary.invocation_count().await, 1);
/// ```
pub struct MockBackend {
    name: String,
    supports_cookies: bool,
    behavior: Arc<RwLock<Behavior>>,
    invocations: Arc<RwLock<Vec<RecordedInvocation>>>,
}

impl MockBackend {
    /// Create a mock that succeeds with a small mp4 titled `Mock Video`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supports_cookies: false,
            behavior: Arc::new(RwLock::new(Behavior::Succeed {
                title: "Mock Video".to_string(),
                contents: b"mock video bytes".to_vec(),
                container: ContainerFormat::Mp4,
            })),
            invocations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Ask the orchestrator for cookie material, like the primary backend.
    pub fn with_cookie_support(mut self) -> Self {
        self.supports_cookies = true;
        self
    }

    /// Succeed with the given title and file contents.
    pub async fn succeed_with(&self, title: impl Into<String>, contents: impl Into<Vec<u8>>) {
        *self.behavior.write().await = Behavior::Succeed {
            title: title.into(),
            contents: contents.into(),
            container: ContainerFormat::Mp4,
        };
    }

    /// Fail every invocation with an error built by `factory`.
    pub async fn fail_with<F>(&self, factory: F)
    where
        F: Fn() -> BackendError + Send + Sync + 'static,
    {
        *self.behavior.write().await = Behavior::Fail(Arc::new(factory));
    }

    /// Never return; only a timeout ends the invocation.
    pub async fn hang(&self) {
        *self.behavior.write().await = Behavior::Hang;
    }

    /// Get all recorded invocations.
    pub async fn recorded_invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.read().await.clone()
    }

    /// Get the number of invocations.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }
}

#[async_trait]
impl RetrievalBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_cookies(&self) -> bool {
        self.supports_cookies
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<BackendOutput, BackendError> {
        let (cookie_file_existed, cookie_contents) = match &ctx.cookie_file {
            Some(path) => match tokio::fs::read(path).await {
                Ok(contents) => (true, Some(contents)),
                Err(_) => (false, None),
            },
            None => (false, None),
        };

        self.invocations.write().await.push(RecordedInvocation {
            url: ctx.url.clone(),
            staging_dir: ctx.staging_dir.clone(),
            cookie_file: ctx.cookie_file.clone(),
            cookie_file_existed,
            cookie_contents,
        });

        let behavior = self.behavior.read().await.clone();
        match behavior {
            Behavior::Succeed {
                title,
                contents,
                container,
            } => {
                let file = ctx
                    .staging_dir
                    .join(format!("mock-output.{}", container.extension()));
                tokio::fs::write(&file, &contents).await?;
                Ok(BackendOutput {
                    title,
                    uploader: Some("Mock Uploader".to_string()),
                    file,
                    container,
                    selection: "720p mp4".to_string(),
                    quality_downgrade: false,
                })
            }
            Behavior::Fail(factory) => Err(factory()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(BackendError::TimedOut {
                    timeout_secs: 24 * 60 * 60,
                })
            }
        }
    }
}
