//! Transport encoding of selected files.
//!
//! Files travel inside JSON bodies as plain base64 (no `data:` prefix). Each
//! encode is independent, so any number of them can be in flight at once.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use smol_str::SmolStr;

use flavor_common::EncodedFile;

use crate::error::EncodingError;

/// Content type used when neither the caller nor sniffing knows better.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Future returned by [`ByteSource::read`].
pub type ReadFuture = Pin<Box<dyn Future<Output = io::Result<Bytes>> + Send + 'static>>;

/// Where the bytes of a selected file come from.
///
/// Reads are deferred until the file is needed (preview or submit), so a file
/// that disappears after selection only fails at that point.
pub trait ByteSource: Send + Sync + fmt::Debug {
    /// Size in bytes as known at selection time.
    fn size(&self) -> u64;

    /// Read the whole file.
    fn read(&self) -> ReadFuture;
}

impl ByteSource for Bytes {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read(&self) -> ReadFuture {
        let bytes = self.clone();
        Box::pin(async move { Ok(bytes) })
    }
}

/// A file picked by the user: name, declared content type and its bytes.
#[derive(Clone)]
pub struct SelectedFile {
    name: SmolStr,
    content_type: SmolStr,
    source: Arc<dyn ByteSource>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<SmolStr>,
        content_type: impl Into<SmolStr>,
        source: impl ByteSource + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            source: Arc::new(source),
        }
    }

    /// A file whose bytes are already in memory.
    pub fn from_bytes(
        name: impl Into<SmolStr>,
        content_type: impl Into<SmolStr>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self::new(name, content_type, bytes.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared content type. May be empty when unknown.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    pub async fn read(&self) -> Result<Bytes, EncodingError> {
        self.source
            .read()
            .await
            .map_err(|source| EncodingError::Read {
                name: self.name.clone(),
                source,
            })
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

/// Sniff a content type from the leading bytes of a file.
///
/// Returns `None` when sniffing only yields the generic binary type.
pub fn sniff_content_type(bytes: &Bytes) -> Option<String> {
    bytes
        .sniff_mime_type()
        .filter(|mime| *mime != FALLBACK_CONTENT_TYPE)
        .map(str::to_string)
}

/// Read and encode one file.
///
/// An empty declared content type is filled in by sniffing the bytes.
pub async fn encode_file(file: &SelectedFile) -> Result<EncodedFile, EncodingError> {
    let bytes = file.read().await?;
    let content_type = if file.content_type().is_empty() {
        sniff_content_type(&bytes).unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
    } else {
        file.content_type().to_string()
    };

    tracing::trace!(file = %file.name(), bytes = bytes.len(), %content_type, "encoded file");
    Ok(EncodedFile {
        file_name: file.name().to_string(),
        file_content: STANDARD.encode(&bytes),
        content_type,
    })
}

/// Encode many files concurrently, keeping input order.
///
/// Waits for every read; the first failure in input order is returned and all
/// successful encodes are discarded.
pub async fn encode_all(files: &[&SelectedFile]) -> Result<Vec<EncodedFile>, EncodingError> {
    let encodes = files.iter().map(|file| encode_file(file));
    n0_future::join_all(encodes).await.into_iter().collect()
}

/// Decode the transport content of an encoded file back to its bytes.
pub fn decode_content(file: &EncodedFile) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(&file.file_content)
}

/// `data:` URL used for local previews.
pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    let content_type = if content_type.is_empty() {
        FALLBACK_CONTENT_TYPE
    } else {
        content_type
    };
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Vanished;

    impl ByteSource for Vanished {
        fn size(&self) -> u64 {
            3
        }

        fn read(&self) -> ReadFuture {
            Box::pin(async {
                Err(io::Error::new(io::ErrorKind::NotFound, "file was removed"))
            })
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_bytes() {
        let samples: [&[u8]; 4] = [b"", b"a", &[0, 255, 1, 254, 10, 13], b"ramen broth recipe"];
        for sample in samples {
            let file = SelectedFile::from_bytes("f.bin", "application/x-test", sample.to_vec());
            let encoded = encode_file(&file).await.unwrap();
            assert_eq!(encoded.file_name, "f.bin");
            assert_eq!(encoded.content_type, "application/x-test");
            assert_eq!(decode_content(&encoded).unwrap(), sample);
        }
    }

    #[tokio::test]
    async fn empty_file_encodes_to_empty_content() {
        let file = SelectedFile::from_bytes("empty.txt", "text/plain", Vec::new());
        let encoded = encode_file(&file).await.unwrap();
        assert_eq!(encoded.file_content, "");
    }

    #[tokio::test]
    async fn unreadable_source_is_a_read_error() {
        let file = SelectedFile::new("gone.jpg", "image/jpeg", Vanished);
        let err = encode_file(&file).await.unwrap_err();
        assert!(matches!(err, EncodingError::Read { ref name, .. } if name == "gone.jpg"));
    }

    #[tokio::test]
    async fn missing_content_type_is_sniffed() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let file = SelectedFile::from_bytes("shot", "", png);
        let encoded = encode_file(&file).await.unwrap();
        assert_eq!(encoded.content_type, "image/png");
    }

    #[tokio::test]
    async fn encode_all_keeps_order_and_fails_whole() {
        let a = SelectedFile::from_bytes("a", "text/plain", &b"a"[..]);
        let b = SelectedFile::from_bytes("b", "text/plain", &b"b"[..]);
        let encoded = encode_all(&[&a, &b]).await.unwrap();
        let names: Vec<_> = encoded.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);

        let bad = SelectedFile::new("bad", "text/plain", Vanished);
        assert!(encode_all(&[&a, &bad, &b]).await.is_err());
    }

    #[test]
    fn data_url_shape() {
        assert_eq!(data_url("image/png", &[0, 1, 2]), "data:image/png;base64,AAEC");
        assert_eq!(data_url("", b""), "data:application/octet-stream;base64,");
    }
}
