use clipvault_core::AppError;

/// Upload validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {content_type} (expected: {expected})")]
    InvalidContentType {
        content_type: String,
        expected: String,
    },

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// Reduce a declared media type to `type/subtype`, lowercased, dropping parameters.
///
/// Returns `None` for anything that is not a well-formed media type.
pub fn media_type_essence(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_lowercase();
    let (kind, subtype) = essence.split_once('/')?;
    let valid = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    if valid(kind) && valid(subtype) {
        Some(essence)
    } else {
        None
    }
}

/// Upload validator
///
/// Checks the declared content type against the single accepted container type and
/// enforces the size cap both on the declared length and on the bytes actually received.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_size: u64,
    accepted_content_type: String,
}

impl UploadValidator {
    pub fn new(max_size: u64, accepted_content_type: impl Into<String>) -> Self {
        Self {
            max_size,
            accepted_content_type: accepted_content_type.into().to_lowercase(),
        }
    }

    /// Validate the declared content type, returning its normalized essence.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<String, ValidationError> {
        let declared = content_type.unwrap_or_default();
        match media_type_essence(declared) {
            Some(essence) if essence == self.accepted_content_type => Ok(essence),
            _ => Err(ValidationError::InvalidContentType {
                content_type: declared.to_string(),
                expected: self.accepted_content_type.clone(),
            }),
        }
    }

    /// Reject uploads whose declared length already exceeds the cap.
    pub fn validate_declared_length(&self, length: Option<u64>) -> Result<(), ValidationError> {
        match length {
            Some(size) if size > self.max_size => Err(ValidationError::FileTooLarge {
                size,
                max: self.max_size,
            }),
            _ => Ok(()),
        }
    }

    /// Check the running total before a chunk is written.
    pub fn validate_running_total(&self, total: u64) -> Result<(), ValidationError> {
        if total > self.max_size {
            return Err(ValidationError::FileTooLarge {
                size: total,
                max: self.max_size,
            });
        }
        Ok(())
    }

    pub fn validate_not_empty(&self, total: u64) -> Result<(), ValidationError> {
        if total == 0 {
            return Err(ValidationError::EmptyFile);
        }
        Ok(())
    }
}
