use crate::error::ValidationError;

/// Subjects offered for one-tap selection; anything else is a custom tag.
pub const PRESET_SUBJECTS: [&str; 9] = [
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "Computer Science",
    "English",
    "History",
    "Geography",
    "Economics",
];

/// Subject tags attached to a doubt. Trimmed, unique (case-sensitive),
/// kept in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectSet(Vec<String>);

impl SubjectSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(tag: &str) -> Result<&str, ValidationError> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankSubject);
        }
        Ok(trimmed)
    }

    /// Add the tag if absent, remove it if present.
    ///
    /// Returns `true` if the tag is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::BlankSubject` for blank tags.
    pub fn toggle(&mut self, tag: &str) -> Result<bool, ValidationError> {
        let tag = Self::normalize(tag)?;
        if let Some(pos) = self.0.iter().position(|t| t == tag) {
            self.0.remove(pos);
            Ok(false)
        } else {
            self.0.push(tag.to_string());
            Ok(true)
        }
    }

    /// Add a custom tag. Adding an existing tag is a no-op.
    ///
    /// Returns `true` if the tag was newly added.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::BlankSubject` for blank tags.
    pub fn insert(&mut self, tag: &str) -> Result<bool, ValidationError> {
        let tag = Self::normalize(tag)?;
        if self.contains(tag) {
            return Ok(false);
        }
        self.0.push(tag.to_string());
        Ok(true)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag.trim())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
