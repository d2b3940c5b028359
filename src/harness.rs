//! Harness-native request/response shapes.
//!
//! These are the untyped-ish structures the simulated browser client
//! produces and consumes. They carry ordered key/value mappings
//! throughout, since both query merging and multi-file upload fields
//! depend on insertion order.

use std::path::PathBuf;

use bytes::Bytes;
use http::Method;

use crate::upload::UploadedFile;

/// Ordered key-value mapping (faster than HashMap for small collections).
pub type ParamList = Vec<(String, String)>;

/// Conventional upload error codes.
pub mod upload_err {
    /// Upload succeeded.
    pub const OK: u8 = 0;
    /// File exceeds the configured size limit.
    pub const INI_SIZE: u8 = 1;
    /// File exceeds the form-declared size limit.
    pub const FORM_SIZE: u8 = 2;
    /// File was only partially uploaded.
    pub const PARTIAL: u8 = 3;
    /// No file was uploaded for this field.
    pub const NO_FILE: u8 = 4;
}

// =============================================================================
// Upload descriptors
// =============================================================================

/// Flat upload descriptor as the harness supplies it.
///
/// Every field other than the error code may be absent; validation
/// happens when the descriptor is turned into an [`UploadedFile`].
#[derive(Debug, Clone, Default)]
pub struct FileDescriptor {
    /// Client-side filename.
    pub name: Option<String>,
    /// Client-declared media type.
    pub media_type: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Path of the temporary file holding the content.
    pub tmp_name: Option<PathBuf>,
    /// Upload error code (0 = success).
    pub error: u8,
}

impl FileDescriptor {
    /// Descriptor for a successfully uploaded file at `tmp_name`.
    pub fn new(name: impl Into<String>, tmp_name: impl Into<PathBuf>) -> Self {
        Self {
            name: Some(name.into()),
            tmp_name: Some(tmp_name.into()),
            ..Self::default()
        }
    }

    /// Descriptor carrying only an error code (e.g. `NO_FILE`).
    pub fn error_only(error: u8) -> Self {
        Self {
            error,
            ..Self::default()
        }
    }

    /// Set the client-declared media type.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Set the size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// One field of the harness upload mapping.
///
/// A field is a `Group` exactly when the harness value carried none of
/// the leaf-identifying entries (temp path, error code, filename); this
/// keeps `files[]`-style multi-file fields representable as ordinary
/// nested mappings without a wrapper type.
#[derive(Debug, Clone)]
pub enum FileField {
    /// Already-constructed file handle, passed through untouched.
    Handle(UploadedFile),
    /// Flat descriptor to be turned into a file handle.
    Descriptor(FileDescriptor),
    /// Nested mapping of further fields, order preserved.
    Group(Vec<(String, FileField)>),
}

impl From<FileDescriptor> for FileField {
    fn from(descriptor: FileDescriptor) -> Self {
        FileField::Descriptor(descriptor)
    }
}

impl From<UploadedFile> for FileField {
    fn from(file: UploadedFile) -> Self {
        FileField::Handle(file)
    }
}

// =============================================================================
// Harness request
// =============================================================================

/// Request description issued by the simulated browser client.
///
/// Immutable once issued; the `with_*` builders consume during setup.
/// Parameter semantics depend on the method: query parameters for GET,
/// body parameters otherwise.
#[derive(Debug, Clone)]
pub struct HarnessRequest {
    method: Method,
    uri: String,
    parameters: ParamList,
    files: Vec<(String, FileField)>,
    cookies: ParamList,
    server: Vec<(String, Option<String>)>,
    content: Bytes,
}

impl HarnessRequest {
    /// Create a request for `method` and `uri` with no parameters.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            parameters: Vec::new(),
            files: Vec::new(),
            cookies: Vec::new(),
            server: Vec::new(),
            content: Bytes::new(),
        }
    }

    /// Set the explicit query/body parameters.
    pub fn with_parameters(mut self, parameters: ParamList) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the upload descriptor mapping.
    pub fn with_files(mut self, files: Vec<(String, FileField)>) -> Self {
        self.files = files;
        self
    }

    /// Set the cookie mapping.
    pub fn with_cookies(mut self, cookies: ParamList) -> Self {
        self.cookies = cookies;
        self
    }

    /// Set the raw server/environment variables. A `None` value marks an
    /// entry that header derivation must skip.
    pub fn with_server(mut self, server: Vec<(String, Option<String>)>) -> Self {
        self.server = server;
        self
    }

    /// Set the raw body content.
    pub fn with_content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = content.into();
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute or relative request URI, as issued.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Explicit query/body parameters.
    pub fn parameters(&self) -> &ParamList {
        &self.parameters
    }

    /// Upload descriptor mapping.
    pub fn files(&self) -> &[(String, FileField)] {
        &self.files
    }

    /// Cookie mapping.
    pub fn cookies(&self) -> &ParamList {
        &self.cookies
    }

    /// Raw server/environment variables.
    pub fn server(&self) -> &[(String, Option<String>)] {
        &self.server
    }

    /// Raw body content.
    pub fn content(&self) -> &Bytes {
        &self.content
    }
}

// =============================================================================
// Harness response
// =============================================================================

/// Response shape handed back to the simulated browser client.
///
/// Headers are flat (one value per name) and the body is fully
/// materialized; the harness has no notion of streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessResponse {
    status: u16,
    headers: ParamList,
    body: String,
}

impl HarnessResponse {
    /// Create a response.
    pub fn new(status: u16, headers: ParamList, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Flattened headers.
    pub fn headers(&self) -> &ParamList {
        &self.headers
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Response body.
    pub fn body(&self) -> &str {
        &self.body
    }
}
