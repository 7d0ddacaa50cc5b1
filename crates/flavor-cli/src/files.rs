//! Files picked on the command line.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::AsyncReadExt;

use flavor_editor_core::encoder::sniff_content_type;
use flavor_editor_core::{ByteSource, ReadFuture, SelectedFile};

/// Bytes looked at when sniffing a content type.
const SNIFF_LEN: usize = 512;

/// A file on disk. Only its size is read up front; the contents are read
/// when the file is previewed or encoded.
#[derive(Debug)]
pub struct DiskFile {
    path: PathBuf,
    size: u64,
}

impl ByteSource for DiskFile {
    fn size(&self) -> u64 {
        self.size
    }

    fn read(&self) -> ReadFuture {
        let path = self.path.clone();
        Box::pin(async move { tokio::fs::read(path).await.map(Bytes::from) })
    }
}

/// Select `path` for upload, working out its content type.
pub async fn select(path: &Path) -> io::Result<SelectedFile> {
    let size = tokio::fs::metadata(path).await?.len();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let head = read_head(path).await?;
    let content_type = sniff_content_type(&head)
        .or_else(|| content_type_from_extension(path).map(str::to_string))
        .unwrap_or_default();

    tracing::debug!(file = %path.display(), size, %content_type, "selected file");
    Ok(SelectedFile::new(
        name,
        content_type,
        DiskFile {
            path: path.to_path_buf(),
            size,
        },
    ))
}

async fn read_head(path: &Path) -> io::Result<Bytes> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}

/// Content type for formats sniffing doesn't recognise.
fn content_type_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("flavor-files-{}-{}", name, std::process::id()))
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(
            content_type_from_extension(Path::new("clip.M4A")),
            Some("audio/mp4")
        );
        assert_eq!(
            content_type_from_extension(Path::new("a/b/dinner.jpeg")),
            Some("image/jpeg")
        );
        assert_eq!(content_type_from_extension(Path::new("notes")), None);
        assert_eq!(content_type_from_extension(Path::new("notes.txt")), None);
    }

    #[tokio::test]
    async fn select_reads_lazily() {
        let dir = scratch_dir("lazy");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("bowl.png");
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        tokio::fs::write(&path, &png).await.unwrap();

        let file = select(&path).await.unwrap();
        assert_eq!(file.name(), "bowl.png");
        assert_eq!(file.content_type(), "image/png");
        assert_eq!(file.size(), png.len() as u64);

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(file.read().await.is_err());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn missing_file_cannot_be_selected() {
        let path = scratch_dir("missing").join("nothing.jpg");
        assert!(select(&path).await.is_err());
    }
}
