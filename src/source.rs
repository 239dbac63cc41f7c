//! Byte sources - named, read-only, randomly addressable byte sequences

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Result, UploadError};

/// A named byte sequence with a known length that can be sliced at any offset.
///
/// Sources are immutable for the duration of a session. Reads never consume
/// anything, so one source may back several sessions at once.
pub trait ByteSource: Send + Sync {
    /// Display name handed to the transport with every chunk
    fn name(&self) -> &str;

    /// Total length in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the bytes in `range`. The range must lie within `[0, len)`.
    fn read(&self, range: Range<u64>) -> Result<Vec<u8>>;
}

fn check_range(name: &str, range: &Range<u64>, len: u64) -> Result<()> {
    if range.start > range.end || range.end > len {
        return Err(UploadError::unreadable(
            name,
            range.start,
            range.end.saturating_sub(range.start),
            format!("range {}..{} outside source of {} bytes", range.start, range.end, len),
        ));
    }
    Ok(())
}

/// In-memory source
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl ByteSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, range: Range<u64>) -> Result<Vec<u8>> {
        check_range(&self.name, &range, self.len())?;
        Ok(self.data[range.start as usize..range.end as usize].to_vec())
    }
}

/// Local file source. The length is captured when the file is opened.
#[derive(Debug)]
pub struct FileSource {
    name: String,
    path: PathBuf,
    len: u64,
    file: Mutex<File>,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let file = File::open(path).map_err(|e| UploadError::unreadable(&name, 0, 0, e))?;
        let len = file
            .metadata()
            .map_err(|e| UploadError::unreadable(&name, 0, 0, e))?
            .len();

        Ok(Self {
            name,
            path: path.to_path_buf(),
            len,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn read(&self, range: Range<u64>) -> Result<Vec<u8>> {
        check_range(&self.name, &range, self.len)?;
        let len = range.end - range.start;
        let unreadable = |e: std::io::Error| UploadError::unreadable(&self.name, range.start, len, e);

        let mut file = self
            .file
            .lock()
            .map_err(|_| UploadError::unreadable(&self.name, range.start, len, "file lock poisoned"))?;
        file.seek(SeekFrom::Start(range.start)).map_err(unreadable)?;

        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf).map_err(unreadable)?;
        Ok(buf)
    }
}
