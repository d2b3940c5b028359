//! Uploaded-file handles and the upload-tree normalizer.

use std::path::Path;
use std::sync::Arc;

use crate::harness::{upload_err, FileDescriptor, FileField};
use crate::message::{BodyStream, Error, Result};

// =============================================================================
// Uploaded file handle
// =============================================================================

#[derive(Debug)]
struct FileInner {
    client_filename: Option<String>,
    client_media_type: Option<String>,
    size: Option<u64>,
    tmp_name: Option<std::path::PathBuf>,
    error: u8,
}

/// Handle over an uploaded file.
///
/// Clones share the inner state, so a handle passed through the
/// normalizer untouched is observably the same handle.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    inner: Arc<FileInner>,
}

impl UploadedFile {
    /// Build a handle from a flat descriptor.
    ///
    /// Fails when a descriptor that reports no upload error is missing
    /// its temporary path; such a descriptor has no content to expose.
    pub fn from_descriptor(descriptor: &FileDescriptor) -> Result<Self> {
        if descriptor.error == upload_err::OK && descriptor.tmp_name.is_none() {
            return Err(Error::MalformedUpload(format!(
                "descriptor for '{}' has no tmp_name",
                descriptor.name.as_deref().unwrap_or("<unnamed>")
            )));
        }

        let client_media_type = descriptor.media_type.clone().or_else(|| {
            descriptor
                .name
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first_raw())
                .map(String::from)
        });

        Ok(Self {
            inner: Arc::new(FileInner {
                client_filename: descriptor.name.clone(),
                client_media_type,
                size: descriptor.size,
                tmp_name: descriptor.tmp_name.clone(),
                error: descriptor.error,
            }),
        })
    }

    /// Filename as reported by the client.
    pub fn client_filename(&self) -> Option<&str> {
        self.inner.client_filename.as_deref()
    }

    /// Media type as reported by the client (or inferred from the name).
    pub fn client_media_type(&self) -> Option<&str> {
        self.inner.client_media_type.as_deref()
    }

    /// Size in bytes, if known.
    pub fn size(&self) -> Option<u64> {
        self.inner.size
    }

    /// Upload error code (0 = success).
    pub fn error(&self) -> u8 {
        self.inner.error
    }

    /// Path of the temporary file, if any.
    pub fn tmp_name(&self) -> Option<&Path> {
        self.inner.tmp_name.as_deref()
    }

    /// Read the temp file into a body stream.
    pub fn stream(&self) -> Result<BodyStream> {
        if self.inner.error != upload_err::OK {
            return Err(Error::MalformedUpload(format!(
                "no stream for upload with error code {}",
                self.inner.error
            )));
        }
        let path = self.inner.tmp_name.as_ref().ok_or_else(|| {
            Error::MalformedUpload("upload handle has no tmp_name".to_string())
        })?;
        let content = std::fs::read(path)?;
        Ok(BodyStream::from_bytes(content))
    }

    /// Whether two handles are the same instance.
    pub fn same_handle(&self, other: &UploadedFile) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// =============================================================================
// Normalized upload tree
// =============================================================================

/// Node of the normalized upload tree: every leaf is a file handle.
#[derive(Debug, Clone)]
pub enum UploadNode {
    /// Leaf file handle.
    File(UploadedFile),
    /// Nested group of further nodes, order preserved.
    Group(Vec<(String, UploadNode)>),
}

impl UploadNode {
    /// The file handle, if this node is a leaf.
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            UploadNode::File(file) => Some(file),
            UploadNode::Group(_) => None,
        }
    }

    /// The child mapping, if this node is a group.
    pub fn as_group(&self) -> Option<&[(String, UploadNode)]> {
        match self {
            UploadNode::Group(children) => Some(children),
            UploadNode::File(_) => None,
        }
    }
}

/// Normalize the harness upload mapping into a tree of file handles.
///
/// Pure structural transform: pre-built handles pass through untouched,
/// descriptors become handles, groups recurse. Construction failures
/// from malformed descriptors propagate unchanged.
pub fn convert_uploaded_files(
    fields: &[(String, FileField)],
) -> Result<Vec<(String, UploadNode)>> {
    fields
        .iter()
        .map(|(name, field)| {
            let node = match field {
                FileField::Handle(file) => UploadNode::File(file.clone()),
                FileField::Descriptor(descriptor) => {
                    UploadNode::File(UploadedFile::from_descriptor(descriptor)?)
                }
                FileField::Group(children) => UploadNode::Group(convert_uploaded_files(children)?),
            };
            Ok((name.clone(), node))
        })
        .collect()
}
