use std::fmt;

use crate::error::ValidationError;

/// Image attachments above this size are rejected locally.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Matches the backend's document upload ceiling.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

pub const PDF_MIME: &str = "application/pdf";

//
// ─── RAW UPLOAD (unvalidated input) ────────────────────────────────────────────
//

/// A file picked by the user, before any validation.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn essence(&self) -> String {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    fn check_size(&self, limit: usize) -> Result<(), ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }
        if self.bytes.len() > limit {
            return Err(ValidationError::FileTooLarge {
                size: self.bytes.len(),
                limit,
            });
        }
        Ok(())
    }

    /// Validate as a document for quiz generation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the file is empty or larger than the upload ceiling.
    pub fn validate_document(&self) -> Result<(), ValidationError> {
        self.check_size(MAX_DOCUMENT_BYTES)
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

//
// ─── VALIDATED ATTACHMENTS ─────────────────────────────────────────────────────
//

/// An image of at most `MAX_IMAGE_BYTES` with an `image/*` MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment(FileUpload);

impl ImageAttachment {
    /// # Errors
    ///
    /// Returns `ValidationError::WrongMediaType` for non-image MIME types and
    /// `ValidationError::FileTooLarge` above 5 MiB.
    pub fn new(file: FileUpload) -> Result<Self, ValidationError> {
        let essence = file.essence();
        if !essence.starts_with("image/") {
            return Err(ValidationError::WrongMediaType {
                expected: "image",
                actual: file.mime_type,
            });
        }
        file.check_size(MAX_IMAGE_BYTES)?;
        Ok(Self(file))
    }

    #[must_use]
    pub fn file(&self) -> &FileUpload {
        &self.0
    }
}

/// A PDF document used as context for a doubt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfAttachment(FileUpload);

impl PdfAttachment {
    /// # Errors
    ///
    /// Returns `ValidationError::WrongMediaType` unless the MIME type is
    /// `application/pdf`, and `ValidationError::FileTooLarge` above 10 MiB.
    pub fn new(file: FileUpload) -> Result<Self, ValidationError> {
        if file.essence() != PDF_MIME {
            return Err(ValidationError::WrongMediaType {
                expected: "pdf",
                actual: file.mime_type,
            });
        }
        file.check_size(MAX_DOCUMENT_BYTES)?;
        Ok(Self(file))
    }

    #[must_use]
    pub fn file(&self) -> &FileUpload {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(mime: &str, size: usize) -> FileUpload {
        FileUpload::new("f", mime, vec![0_u8; size])
    }

    #[test]
    fn image_over_five_mib_is_rejected() {
        let err = ImageAttachment::new(upload("image/png", 6 * 1024 * 1024)).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { limit, .. } if limit == MAX_IMAGE_BYTES));
    }

    #[test]
    fn image_at_limit_is_accepted() {
        assert!(ImageAttachment::new(upload("image/jpeg", MAX_IMAGE_BYTES)).is_ok());
    }

    #[test]
    fn image_requires_image_mime() {
        let err = ImageAttachment::new(upload("application/pdf", 10)).unwrap_err();
        assert!(matches!(err, ValidationError::WrongMediaType { expected: "image", .. }));
    }

    #[test]
    fn pdf_accepts_mime_parameters() {
        assert!(PdfAttachment::new(upload("Application/PDF; charset=binary", 10)).is_ok());
        assert!(PdfAttachment::new(upload("image/png", 10)).is_err());
    }

    #[test]
    fn empty_files_are_rejected() {
        assert_eq!(
            PdfAttachment::new(upload(PDF_MIME, 0)),
            Err(ValidationError::EmptyFile)
        );
    }

    #[test]
    fn debug_hides_bytes() {
        let rendered = format!("{:?}", upload("image/png", 3));
        assert!(rendered.contains("size: 3"));
        assert!(!rendered.contains("bytes"));
    }
}
