//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use pdf2zh_server::config::Config;
use pdf2zh_server::translator::{TranslationOutput, Translator, TranslatorError};

/// Smallest file most readers still accept as a PDF
pub const MINIMAL_PDF: &[u8] = b"%PDF-1.4\n1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
2 0 obj<</Type/Pages/Kids[]/Count 0>>endobj\ntrailer<</Root 1 0 R>>\n%%EOF\n";

/// One observed translator call
#[derive(Debug, Clone)]
pub struct Call {
    pub input: PathBuf,
    pub params: String,
    pub input_existed: bool,
}

/// Behaviour of [`MockTranslator`]
#[derive(Debug, Clone)]
pub enum Mode {
    /// Return the staged file unchanged
    Copy,
    /// Return a fixed body
    Fixed(Vec<u8>),
    /// Exit with the given code
    Fail(i32),
    /// Report a timeout
    TimeOut,
}

/// In-process translator that records how it was called
pub struct MockTranslator {
    mode: Mode,
    delay: Duration,
    calls: Mutex<Vec<Call>>,
    count: AtomicUsize,
}

impl MockTranslator {
    pub fn new(mode: Mode) -> Arc<Self> {
        Self::with_delay(mode, Duration::ZERO)
    }

    pub fn with_delay(mode: Mode, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            mode,
            delay,
            calls: Mutex::new(Vec::new()),
            count: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn translate(
        &self,
        input: &Path,
        params: &str,
    ) -> Result<TranslationOutput, TranslatorError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call {
            input: input.to_path_buf(),
            params: params.to_string(),
            input_existed: input.exists(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.mode {
            Mode::Copy => Ok(TranslationOutput {
                bytes: tokio::fs::read(input).await?,
                stderr: String::new(),
                elapsed: self.delay,
            }),
            Mode::Fixed(bytes) => Ok(TranslationOutput {
                bytes: bytes.clone(),
                stderr: String::new(),
                elapsed: self.delay,
            }),
            Mode::Fail(code) => Err(TranslatorError::Failed {
                code: Some(*code),
                stderr: "mock failure".to_string(),
            }),
            Mode::TimeOut => Err(TranslatorError::TimedOut(Duration::from_secs(1))),
        }
    }
}

/// Default config staging into a fresh temp dir
pub fn test_config() -> (Config, TempDir) {
    let staging = TempDir::new().expect("Failed to create staging dir");
    let mut config = Config::default();
    config.upload.staging_dir = Some(staging.path().to_path_buf());
    (config, staging)
}

/// Number of entries left in a directory
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
