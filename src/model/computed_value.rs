use std::fmt;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Why a [`ComputedValue`] cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("filename or code must be specified")]
    MissingSource,
    #[error("function or code must be specified")]
    MissingFunction,
}

/// An attribute value produced by running a script function or an inline snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedValue {
    /// Directory of the file that declared the attribute. Commands run here.
    pub contract_dir: PathBuf,
    /// Path of the declaring file, for messages.
    pub contract_path: String,

    pub filename: PathBuf,
    pub func: String,
    pub inline_script: String,
    /// Whether `run` may write to the host filesystem.
    pub read_write: bool,
}

impl ComputedValue {
    pub fn from_file(filename: impl Into<PathBuf>, func: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            func: func.into(),
            ..Self::default()
        }
    }

    pub fn inline(code: impl Into<String>) -> Self {
        Self {
            inline_script: code.into(),
            ..Self::default()
        }
    }

    pub fn is_inline(&self) -> bool {
        !self.inline_script.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.filename.as_os_str().is_empty() && !self.is_inline() {
            return Err(ValidationError::MissingSource);
        }
        if self.func.is_empty() && !self.is_inline() {
            return Err(ValidationError::MissingFunction);
        }
        Ok(())
    }
}

impl fmt::Display for ComputedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inline() {
            let digest = Sha256::digest(self.inline_script.as_bytes());
            write!(f, "computed_value<0x")?;
            for byte in &digest[..4] {
                write!(f, "{:02X}", byte)?;
            }
            return write!(f, ">");
        }
        write!(f, "computed_value<{}, {}>", self.filename.display(), self.func)
    }
}
