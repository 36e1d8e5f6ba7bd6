use std::collections::VecDeque;
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, trace};

use logscope_types::LevelFilter;

use crate::{LineStream, SourceError};

/// Bytes kept from just before the read offset to recognise a rewritten file
const GUARD_LEN: u64 = 64;

/// Follow a file, yielding lines appended after the stream starts
///
/// The file size is polled every `poll_interval`. Lines are only emitted once
/// their terminating newline has been written. The file is read again from
/// the start when it shrinks, when it is replaced by another file, or when
/// the bytes before the read offset no longer match what was read, which
/// covers a truncation followed by growth past the old offset. With a level
/// set, only lines containing that bracketed tag are emitted.
pub fn follow_file(
    path: PathBuf,
    name: String,
    level: Option<LevelFilter>,
    poll_interval: Duration,
) -> LineStream {
    let state = FollowState {
        path,
        name,
        level_tag: level.and_then(|l| l.bracketed()),
        poll_interval,
        position: None,
        identity: None,
        guard: Vec::new(),
        partial: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }
            if let Some(line) = state.pending.pop_front() {
                return Some((Ok(line), state));
            }
            if let Err(e) = state.poll().await {
                debug!(file = %state.name, error = %e, "follow stream failed");
                state.finished = true;
                return Some((Err(e), state));
            }
        }
    })
    .boxed()
}

struct FollowState {
    path: PathBuf,
    name: String,
    level_tag: Option<String>,
    poll_interval: Duration,

    /// Byte offset already consumed, `None` until the first poll
    position: Option<u64>,

    /// Device and inode of the followed file
    identity: Option<(u64, u64)>,

    /// Last bytes before `position`
    guard: Vec<u8>,

    /// Bytes of an unterminated trailing line
    partial: Vec<u8>,

    /// Complete lines waiting to be yielded
    pending: VecDeque<String>,

    finished: bool,
}

impl FollowState {
    async fn poll(&mut self) -> Result<(), SourceError> {
        let Some(mut position) = self.position else {
            // Start at the current end of file
            let mut file = self.open().await?;
            let metadata = file.metadata().await?;
            let len = metadata.len();
            self.identity = file_identity(&metadata);
            let guard_start = len.saturating_sub(GUARD_LEN);
            self.guard = read_range(&mut file, guard_start, len - guard_start).await?;
            self.position = Some(len);
            return Ok(());
        };

        tokio::time::sleep(self.poll_interval).await;
        let mut file = self.open().await?;
        let metadata = file.metadata().await?;
        let len = metadata.len();
        let identity = file_identity(&metadata);

        let rewritten = len < position
            || identity != self.identity
            || !self.guard_matches(&mut file, position).await?;
        self.identity = identity;

        if rewritten {
            debug!(file = %self.name, "file truncated or replaced, rewinding");
            position = 0;
            self.position = Some(0);
            self.guard.clear();
            self.partial.clear();
        }
        if len == position {
            return Ok(());
        }

        let buf = read_range(&mut file, position, len - position).await?;
        self.position = Some(position + buf.len() as u64);
        trace!(file = %self.name, bytes = buf.len(), "read appended bytes");

        self.guard.extend_from_slice(&buf);
        let excess = self.guard.len().saturating_sub(GUARD_LEN as usize);
        self.guard.drain(..excess);

        self.partial.extend_from_slice(&buf);
        self.split_lines();
        Ok(())
    }

    async fn open(&self) -> Result<File, SourceError> {
        File::open(&self.path)
            .await
            .map_err(|e| SourceError::for_file(&self.name, e))
    }

    /// Whether the bytes before `position` are still the ones read last
    async fn guard_matches(&self, file: &mut File, position: u64) -> Result<bool, SourceError> {
        if self.guard.is_empty() {
            return Ok(true);
        }
        let len = self.guard.len() as u64;
        let current = read_range(file, position.saturating_sub(len), len).await?;
        Ok(current == self.guard)
    }

    fn split_lines(&mut self) {
        while let Some(idx) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=idx).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            let keep = self
                .level_tag
                .as_deref()
                .is_none_or(|tag| line.contains(tag));
            if keep {
                self.pending.push_back(line.to_string());
            }
        }
    }
}

/// Read up to `len` bytes starting at `offset`
async fn read_range(file: &mut File, offset: u64, len: u64) -> Result<Vec<u8>, SourceError> {
    file.seek(SeekFrom::Start(offset)).await?;
    let mut buf = Vec::with_capacity(len as usize);
    (&mut *file).take(len).read_to_end(&mut buf).await?;
    Ok(buf)
}

#[cfg(unix)]
fn file_identity(metadata: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn file_identity(_metadata: &Metadata) -> Option<(u64, u64)> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn append(path: &std::path::Path, content: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    async fn next_line(stream: &mut LineStream) -> Option<Result<String, SourceError>> {
        tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_follow_emits_only_appended_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "[INFO] before\n").unwrap();

        let mut stream = follow_file(
            path.clone(),
            "app.log".to_string(),
            None,
            Duration::from_millis(10),
        );

        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            append(&writer_path, "[INFO] after 1\n[WARN] after");
            tokio::time::sleep(Duration::from_millis(50)).await;
            append(&writer_path, " 2\n");
        });

        assert_eq!(next_line(&mut stream).await.unwrap().unwrap(), "[INFO] after 1");
        assert_eq!(next_line(&mut stream).await.unwrap().unwrap(), "[WARN] after 2");
    }

    #[tokio::test]
    async fn test_follow_level_filter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "").unwrap();

        let mut stream = follow_file(
            path.clone(),
            "app.log".to_string(),
            Some(LevelFilter::Error),
            Duration::from_millis(10),
        );

        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            append(&writer_path, "[INFO] skip\n[ERROR] keep\n");
        });

        assert_eq!(next_line(&mut stream).await.unwrap().unwrap(), "[ERROR] keep");
    }

    #[tokio::test]
    async fn test_follow_rewinds_after_truncation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "[INFO] a fairly long first line\n").unwrap();

        let mut stream = follow_file(
            path.clone(),
            "app.log".to_string(),
            None,
            Duration::from_millis(300),
        );

        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(&writer_path, "[INFO] short\n").unwrap();
        });

        assert_eq!(next_line(&mut stream).await.unwrap().unwrap(), "[INFO] short");
    }

    #[tokio::test]
    async fn test_follow_rewinds_when_rewritten_past_offset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "[INFO] old\n").unwrap();

        let mut stream = follow_file(
            path.clone(),
            "app.log".to_string(),
            None,
            Duration::from_millis(300),
        );

        // Truncated and regrown past the old offset between two polls
        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(&writer_path, "[INFO] brand new line after rotation\n").unwrap();
        });

        assert_eq!(
            next_line(&mut stream).await.unwrap().unwrap(),
            "[INFO] brand new line after rotation"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_follow_rewinds_when_file_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "[INFO] old\n").unwrap();

        let mut stream = follow_file(
            path.clone(),
            "app.log".to_string(),
            None,
            Duration::from_millis(300),
        );

        // Same leading bytes, but a different file moved into place
        let writer_path = path.clone();
        let staged = dir.path().join("staged");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(&staged, "[INFO] old\n[INFO] replacement\n").unwrap();
            std::fs::rename(&staged, &writer_path).unwrap();
        });

        assert_eq!(next_line(&mut stream).await.unwrap().unwrap(), "[INFO] old");
        assert_eq!(next_line(&mut stream).await.unwrap().unwrap(), "[INFO] replacement");
    }

    #[tokio::test]
    async fn test_follow_missing_file_errors_then_ends() {
        let dir = TempDir::new().unwrap();
        let mut stream = follow_file(
            dir.path().join("missing.log"),
            "missing.log".to_string(),
            None,
            Duration::from_millis(10),
        );

        let first = next_line(&mut stream).await.unwrap();
        assert!(matches!(first, Err(SourceError::NotFound(_))));
        assert!(next_line(&mut stream).await.is_none());
    }
}
