use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::format::{is_accepted_mime, resolve_mime, sanitize_filename};
use super::preview::{PreviewHandle, PreviewRegistry};
use super::IntakeError;

/// Limits applied to every incoming batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePolicy {
    pub max_file_size: u64,
    pub max_images: usize,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MiB
            max_images: 50,
        }
    }
}

/// A user-selected file before validation.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub file_name: String,
    /// Content type reported by the client, if any.
    pub declared_mime: Option<String>,
    /// File content. Only a leading prefix when the file was too large to keep.
    pub bytes: Vec<u8>,
    /// Full size of the file as received.
    pub size_bytes: u64,
}

impl CandidateFile {
    pub fn new(file_name: impl Into<String>, declared_mime: Option<&str>, bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            file_name: file_name.into(),
            declared_mime: declared_mime.map(str::to_string),
            bytes,
            size_bytes,
        }
    }

    /// A file whose content was cut off after `prefix`; `size_bytes` is
    /// the full received size. Such a file can only be rejected.
    pub fn truncated(
        file_name: impl Into<String>,
        declared_mime: Option<&str>,
        prefix: Vec<u8>,
        size_bytes: u64,
    ) -> Self {
        Self {
            size_bytes: size_bytes.max(prefix.len() as u64),
            ..Self::new(file_name, declared_mime, prefix)
        }
    }

    /// Whether `bytes` holds only part of the file.
    pub fn is_truncated(&self) -> bool {
        self.size_bytes > self.bytes.len() as u64
    }
}

/// A validated image held for analysis. Owns its preview resource.
#[derive(Debug)]
pub struct StagedImage {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    preview: PreviewHandle,
}

impl StagedImage {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn preview_uri(&self) -> &str {
        self.preview.uri()
    }

    pub fn info(&self) -> StagedImageInfo {
        StagedImageInfo {
            id: self.id,
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes(),
            preview_uri: self.preview_uri().to_string(),
        }
    }
}

/// Serializable view of a staged image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedImageInfo {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub preview_uri: String,
}

/// Per-file rejection notice. Non-fatal: the rest of the batch proceeds.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedFile {
    pub file_name: String,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing)]
    pub error: IntakeError,
}

impl From<IntakeError> for RejectedFile {
    fn from(error: IntakeError) -> Self {
        let file_name = match &error {
            IntakeError::InvalidFormat { file_name, .. }
            | IntakeError::FileTooLarge { file_name, .. } => file_name.clone(),
            IntakeError::TooManyImages { .. } => String::new(),
        };
        Self {
            file_name,
            code: error.code(),
            message: error.to_string(),
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub accepted: Vec<StagedImageInfo>,
    pub rejected: Vec<RejectedFile>,
    pub staged_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnstageOutcome {
    /// `false` when the id was not staged (second removal, unknown id).
    pub removed: bool,
    pub staged: Vec<StagedImageInfo>,
}

/// Holds the staged image set and enforces the intake policy.
pub struct ImageIntake {
    policy: IntakePolicy,
    previews: Arc<PreviewRegistry>,
    images: Vec<StagedImage>,
}

impl ImageIntake {
    pub fn new(policy: IntakePolicy, previews: Arc<PreviewRegistry>) -> Self {
        Self {
            policy,
            previews,
            images: Vec::new(),
        }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    pub fn previews(&self) -> &Arc<PreviewRegistry> {
        &self.previews
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn list(&self) -> Vec<StagedImageInfo> {
        self.images.iter().map(StagedImage::info).collect()
    }

    /// Validate a batch and stage every acceptable file.
    ///
    /// The count limit applies to the whole batch; format and size are
    /// checked per file.
    pub fn stage(&mut self, candidates: Vec<CandidateFile>) -> Result<StageOutcome, IntakeError> {
        let current = self.images.len();
        let incoming = candidates.len();
        if current + incoming > self.policy.max_images {
            tracing::warn!(
                current,
                incoming,
                max = self.policy.max_images,
                "Batch rejected: image limit exceeded"
            );
            return Err(IntakeError::TooManyImages {
                current,
                incoming,
                max: self.policy.max_images,
            });
        }

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            match self.validate(&candidate) {
                Ok(mime_type) => {
                    let image = self.admit(candidate, mime_type);
                    accepted.push(image.info());
                    self.images.push(image);
                }
                Err(error) => {
                    tracing::info!(code = error.code(), "{error}");
                    rejected.push(RejectedFile::from(error));
                }
            }
        }

        tracing::info!(
            accepted = accepted.len(),
            rejected = rejected.len(),
            staged = self.images.len(),
            "Batch staged"
        );

        Ok(StageOutcome {
            accepted,
            rejected,
            staged_count: self.images.len(),
        })
    }

    /// Remove one image, releasing its preview. Unknown ids are a no-op.
    pub fn unstage(&mut self, id: &Uuid) -> UnstageOutcome {
        let position = self.images.iter().position(|img| &img.id == id);
        let removed = match position {
            Some(index) => {
                let image = self.images.remove(index);
                tracing::debug!(id = %image.id, file = %image.file_name, "Image unstaged");
                true
            }
            None => {
                tracing::debug!(%id, "Unstage requested for unknown image");
                false
            }
        };

        UnstageOutcome {
            removed,
            staged: self.list(),
        }
    }

    /// Remove every staged image, releasing all previews.
    pub fn reset(&mut self) {
        let cleared = self.images.len();
        self.images.clear();
        if cleared > 0 {
            tracing::debug!(cleared, "Staged images cleared");
        }
    }

    fn validate(&self, candidate: &CandidateFile) -> Result<String, IntakeError> {
        let file_name = sanitize_filename(&candidate.file_name);
        let mime_type = resolve_mime(
            &candidate.bytes,
            candidate.declared_mime.as_deref(),
            &file_name,
        );

        if !is_accepted_mime(&mime_type) {
            return Err(IntakeError::InvalidFormat {
                file_name,
                mime_type,
            });
        }

        let size_bytes = candidate.size_bytes;
        if size_bytes > self.policy.max_file_size || candidate.is_truncated() {
            return Err(IntakeError::FileTooLarge {
                file_name,
                size_bytes,
                max_bytes: self.policy.max_file_size,
            });
        }

        Ok(mime_type)
    }

    fn admit(&self, candidate: CandidateFile, mime_type: String) -> StagedImage {
        let id = Uuid::new_v4();
        let bytes: Arc<[u8]> = Arc::from(candidate.bytes);
        let preview = self.previews.acquire(id, &mime_type, Arc::clone(&bytes));
        StagedImage {
            id,
            file_name: sanitize_filename(&candidate.file_name),
            mime_type,
            bytes,
            preview,
        }
    }
}
