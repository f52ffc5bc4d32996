//! Translator Module
//!
//! The relay never translates anything itself. It stages the upload and
//! hands the path plus a JSON parameter blob to a [`Translator`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pdf2zh_server::translator::{ProcessTranslator, StagedFile, Translator};
//!
//! let translator = ProcessTranslator::new(config.translator.clone());
//! let staged = StagedFile::write(&staging_dir, &pdf_bytes).await?;
//! let output = translator.translate(staged.path(), r#"{"lang_out":"zh"}"#).await?;
//! // output.bytes is the translator's stdout, untouched
//! ```

mod process;
mod staging;
mod types;

use std::path::Path;

use async_trait::async_trait;

pub use process::ProcessTranslator;
pub use staging::StagedFile;
pub use types::{
    ParamError, TranslationOutput, TranslationParams, TranslatorError, MAX_PARAM_NAME_LEN,
    MAX_PARAM_VALUE_LEN,
};

/// Something that turns a staged PDF into translated bytes
///
/// Implementations must return within a bounded time and must not leave
/// work running once the returned future is dropped.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Whether a translation could be started right now
    async fn is_available(&self) -> bool;

    /// Translate the file at `input`, with `params` as the serialized
    /// parameter map
    async fn translate(&self, input: &Path, params: &str)
        -> Result<TranslationOutput, TranslatorError>;
}
