use std::future::Future;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;
use crate::plan::PartRange;

/// Future returned by [`PartSource::read_part`].
pub type ReadFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, TransferError>> + Send + 'a>>;

/// Random-access byte source that parts are read from.
///
/// Reads for different parts may run concurrently, so implementations must
/// not share a cursor between calls.
pub trait PartSource: Send + Sync {
    /// Reads exactly the bytes covered by `range`.
    fn read_part(&self, range: PartRange) -> ReadFuture<'_>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;
}

fn check_range(range: PartRange, size: u64) -> Result<(), TransferError> {
    if range.end > size || range.start > range.end {
        return Err(TransferError::OutOfRange {
            part_number: range.part_number,
            end: range.end,
            size,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// Reads parts from a file on disk, opening a fresh handle per part.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    size: u64,
}

impl FileSource {
    /// Opens `path` and records its current size.
    pub async fn open(path: &Path) -> Result<Self, TransferError> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(TransferError::InvalidInput(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartSource for FileSource {
    fn read_part(&self, range: PartRange) -> ReadFuture<'_> {
        Box::pin(async move {
            check_range(range, self.size)?;

            let mut file = tokio::fs::File::open(&self.path).await?;
            file.seek(SeekFrom::Start(range.start)).await?;

            let mut buf = vec![0u8; range.size() as usize];
            file.read_exact(&mut buf).await?;
            Ok(buf)
        })
    }

    fn size(&self) -> u64 {
        self.size
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// Serves parts from an in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }
}

impl PartSource for MemorySource {
    fn read_part(&self, range: PartRange) -> ReadFuture<'_> {
        Box::pin(async move {
            check_range(range, self.size())?;
            Ok(self.data[range.start as usize..range.end as usize].to_vec())
        })
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_parts;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[tokio::test]
    async fn file_source_reads_each_part() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "clip.mp4", b"AABBCCDDEE");

        let source = FileSource::open(&path).await.unwrap();
        assert_eq!(source.size(), 10);

        let parts = plan_parts(source.size(), 4).unwrap();
        let mut chunks = Vec::new();
        for part in parts {
            chunks.push(source.read_part(part).await.unwrap());
        }
        assert_eq!(chunks, vec![b"AABB".to_vec(), b"CCDD".to_vec(), b"EE".to_vec()]);
    }

    #[tokio::test]
    async fn file_source_concurrent_reads() {
        let dir = TempDir::new().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let path = create_test_file(dir.path(), "clip.mp4", &data);

        let source = Arc::new(FileSource::open(&path).await.unwrap());
        let parts = plan_parts(source.size(), 1000).unwrap();

        let mut handles = Vec::new();
        for part in parts.iter().copied() {
            let s = Arc::clone(&source);
            handles.push(tokio::spawn(async move { (part, s.read_part(part).await.unwrap()) }));
        }

        for h in handles {
            let (part, bytes) = h.await.unwrap();
            assert_eq!(&bytes[..], &data[part.start as usize..part.end as usize]);
        }
    }

    #[tokio::test]
    async fn file_source_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = FileSource::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn file_source_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FileSource::open(&dir.path().join("nope.mp4")).await.unwrap_err();
        assert!(matches!(err, TransferError::Io(_)));
    }

    #[tokio::test]
    async fn range_past_end_rejected() {
        let source = MemorySource::new(b"0123456789".to_vec());
        let range = PartRange {
            part_number: 2,
            start: 8,
            end: 12,
        };
        let err = source.read_part(range).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::OutOfRange {
                part_number: 2,
                end: 12,
                size: 10
            }
        ));
    }

    #[tokio::test]
    async fn memory_source_slices() {
        let source = MemorySource::new(b"0123456789".to_vec());
        let range = PartRange {
            part_number: 1,
            start: 3,
            end: 7,
        };
        assert_eq!(source.read_part(range).await.unwrap(), b"3456");
    }
}
