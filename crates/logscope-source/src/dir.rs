use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::read::MultiGzDecoder;
use futures::StreamExt;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::debug;

use logscope_types::{LevelFilter, LogFileInfo, is_compressed_name};

use crate::follow::follow_file;
use crate::{LineStream, LogSource, SourceError};

/// Number of lines returned by `tail_with_filter` when no limit is given
pub const DEFAULT_TAIL_LIMIT: usize = 200;

/// Line reader over a plain or decompressed log file
type LineReader = Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>;

/// Log source backed by a directory of `*.log` and `*.gz` files
#[derive(Clone, Debug)]
pub struct DirSource {
    /// Directory holding the log files
    dir: PathBuf,

    /// How often followed files are checked for growth
    poll_interval: Duration,

    /// File streamed when no file is selected
    default_stream_file: String,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            poll_interval: Duration::from_millis(1000),
            default_stream_file: "application.log".to_string(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_default_stream_file(mut self, name: impl Into<String>) -> Self {
        self.default_stream_file = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve an existing regular file inside the logs directory
    ///
    /// Rejects blank names and path separators, anything that is not a
    /// regular file (`NotFound`), and symlinks whose target lies outside the
    /// directory.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, SourceError> {
        validate_file_name(name)?;
        let path = self.dir.join(name);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| SourceError::for_file(name, e))?;
        if !metadata.is_file() {
            return Err(SourceError::NotFound(name.to_string()));
        }

        let dir = tokio::fs::canonicalize(&self.dir).await?;
        let path = tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| SourceError::for_file(name, e))?;
        if !path.starts_with(&dir) {
            debug!(file = name, target = %path.display(), "file resolves outside logs directory");
            return Err(SourceError::InvalidName(name.to_string()));
        }
        Ok(path)
    }

    /// Whole file contents, decompressed for `*.gz`
    async fn read_bytes(&self, name: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve(name).await?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SourceError::for_file(name, e))?;
        if is_compressed_name(name) {
            decompress(bytes).await
        } else {
            Ok(bytes)
        }
    }

    /// Last `limit` lines matching an optional regex
    ///
    /// A `limit` of 0 falls back to [`DEFAULT_TAIL_LIMIT`].
    pub async fn tail_with_filter(
        &self,
        name: &str,
        limit: usize,
        pattern: Option<&str>,
    ) -> Result<Vec<String>, SourceError> {
        let limit = if limit == 0 { DEFAULT_TAIL_LIMIT } else { limit };
        let regex = compile_optional(pattern)?;
        let mut lines = self.open_lines(name).await?;

        let mut last = VecDeque::with_capacity(limit);
        while let Some(line) = lines.next_line().await? {
            if regex.as_ref().is_none_or(|re| re.is_match(&line)) {
                if last.len() == limit {
                    last.pop_front();
                }
                last.push_back(line);
            }
        }
        Ok(last.into())
    }

    /// First `limit` lines matching a regex across the whole file
    ///
    /// An empty pattern matches nothing; a `limit` of 0 means unbounded.
    pub async fn search_lines(
        &self,
        name: &str,
        pattern: &str,
        limit: usize,
    ) -> Result<Vec<String>, SourceError> {
        let Some(regex) = compile_optional(Some(pattern))? else {
            return Ok(Vec::new());
        };
        let limit = if limit == 0 { usize::MAX } else { limit };
        let mut lines = self.open_lines(name).await?;

        let mut matches = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if regex.is_match(&line) {
                matches.push(line);
                if matches.len() >= limit {
                    break;
                }
            }
        }
        Ok(matches)
    }

    async fn open_lines(&self, name: &str) -> Result<LineReader, SourceError> {
        let reader: Box<dyn AsyncRead + Send + Unpin> = if is_compressed_name(name) {
            Box::new(Cursor::new(self.read_bytes(name).await?))
        } else {
            let path = self.resolve(name).await?;
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| SourceError::for_file(name, e))?;
            Box::new(file)
        };
        Ok(BufReader::new(reader).lines())
    }
}

impl LogSource for DirSource {
    async fn list_files(&self) -> Result<Vec<LogFileInfo>, SourceError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "logs directory missing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".log") && !is_compressed_name(&name) {
                continue;
            }
            let modified: DateTime<Utc> = metadata.modified()?.into();
            files.push(LogFileInfo::new(name, metadata.len(), modified));
        }

        // Most recently modified first
        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(files)
    }

    async fn fetch_file_content(&self, name: &str) -> Result<String, SourceError> {
        let bytes = self.read_bytes(name).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn open_log_stream(&self, file: Option<&str>, level: Option<LevelFilter>) -> LineStream {
        let name = file.unwrap_or(&self.default_stream_file).to_string();
        if is_compressed_name(&name) {
            return futures::stream::once(async move { Err(SourceError::Compressed(name)) }).boxed();
        }

        let source = self.clone();
        let poll_interval = self.poll_interval;
        futures::stream::once(async move {
            let path = source.resolve(&name).await;
            (path, name)
        })
        .flat_map(move |(path, name)| match path {
            Ok(path) => follow_file(path, name, level, poll_interval),
            Err(e) => futures::stream::once(async move { Err(e) }).boxed(),
        })
        .boxed()
    }
}

fn validate_file_name(name: &str) -> Result<(), SourceError> {
    if name.trim().is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(SourceError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Inflate a gzip file, including concatenated members
async fn decompress(bytes: Vec<u8>) -> Result<Vec<u8>, SourceError> {
    tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        MultiGzDecoder::new(bytes.as_slice()).read_to_end(&mut out)?;
        Ok::<_, SourceError>(out)
    })
    .await
    .map_err(|e| SourceError::Transport(e.to_string()))?
}

fn compile_optional(pattern: Option<&str>) -> Result<Option<Regex>, SourceError> {
    match pattern {
        Some(p) if !p.trim().is_empty() => Ok(Some(Regex::new(p)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn set_mtime(dir: &TempDir, name: &str, secs_ago: u64) {
        let file = fs::File::options()
            .write(true)
            .open(dir.path().join(name))
            .unwrap();
        let time = SystemTime::now() - Duration::from_secs(secs_ago);
        file.set_modified(time).unwrap();
    }

    #[tokio::test]
    async fn test_list_files_newest_first() {
        let dir = TempDir::new().unwrap();
        write(&dir, "old.log", "a\n");
        write(&dir, "new.log", "b\n");
        write(&dir, "notes.txt", "c\n");
        fs::create_dir(dir.path().join("nested.log")).unwrap();
        set_mtime(&dir, "old.log", 3600);
        set_mtime(&dir, "new.log", 10);

        let source = DirSource::new(dir.path());
        let files = source.list_files().await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["new.log", "old.log"]);
        assert_eq!(files[0].size_bytes, 2);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let source = DirSource::new(dir.path().join("missing"));
        assert!(source.list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_content() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app.log", "[INFO] a\n[ERROR] b\n");
        let source = DirSource::new(dir.path());
        let text = source.fetch_file_content("app.log").await.unwrap();
        assert_eq!(text, "[INFO] a\n[ERROR] b\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = DirSource::new(dir.path());
        let err = source.fetch_file_content("nope.log").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_traversal_names() {
        let source = DirSource::new("/tmp/logs");
        for name in ["", "  ", "../etc/passwd", "a/b.log", "a\\b.log", ".."] {
            let err = source.fetch_file_content(name).await.unwrap_err();
            assert!(matches!(err, SourceError::InvalidName(_)), "{name:?}");
        }
    }

    #[tokio::test]
    async fn test_tail_with_filter() {
        let dir = TempDir::new().unwrap();
        let content: String = (1..=10)
            .map(|i| {
                let level = if i % 2 == 0 { "ERROR" } else { "INFO" };
                format!("[{}] line {}\n", level, i)
            })
            .collect();
        write(&dir, "app.log", &content);
        let source = DirSource::new(dir.path());

        let tail = source.tail_with_filter("app.log", 2, Some("ERROR")).await.unwrap();
        assert_eq!(tail, vec!["[ERROR] line 8", "[ERROR] line 10"]);

        let all = source.tail_with_filter("app.log", 0, None).await.unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn test_search_lines() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app.log", "disk full\nok\ndisk slow\ndisk gone\n");
        let source = DirSource::new(dir.path());

        let hits = source.search_lines("app.log", "^disk", 2).await.unwrap();
        assert_eq!(hits, vec!["disk full", "disk slow"]);

        let none = source.search_lines("app.log", "", 10).await.unwrap();
        assert!(none.is_empty());

        let err = source.search_lines("app.log", "(", 10).await.unwrap_err();
        assert!(matches!(err, SourceError::Pattern(_)));
    }

    fn write_gz(dir: &TempDir, name: &str, content: &str) {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let file = fs::File::create(dir.path().join(name)).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[tokio::test]
    async fn test_compressed_files_listed_and_read() {
        let dir = TempDir::new().unwrap();
        write(&dir, "application.log", "[INFO] current\n");
        write_gz(
            &dir,
            "application-2025-08-10-1.log.gz",
            "[INFO] rotated a\n[ERROR] rotated b\n[INFO] rotated c\n",
        );
        set_mtime(&dir, "application-2025-08-10-1.log.gz", 3600);
        let source = DirSource::new(dir.path());

        let files = source.list_files().await.unwrap();
        let listed: Vec<_> = files.iter().map(|f| (f.name.as_str(), f.compressed)).collect();
        assert_eq!(
            listed,
            vec![
                ("application.log", false),
                ("application-2025-08-10-1.log.gz", true)
            ]
        );

        let name = "application-2025-08-10-1.log.gz";
        let text = source.fetch_file_content(name).await.unwrap();
        assert_eq!(text, "[INFO] rotated a\n[ERROR] rotated b\n[INFO] rotated c\n");

        let tail = source.tail_with_filter(name, 1, Some("INFO")).await.unwrap();
        assert_eq!(tail, vec!["[INFO] rotated c"]);

        let hits = source.search_lines(name, "ERROR", 0).await.unwrap();
        assert_eq!(hits, vec!["[ERROR] rotated b"]);

        let mut stream = source.open_log_stream(Some(name), None);
        assert!(matches!(
            stream.next().await.unwrap(),
            Err(SourceError::Compressed(_))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_gz_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.log.gz", "not gzip at all");
        let source = DirSource::new(dir.path());
        let err = source.fetch_file_content("broken.log.gz").await.unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test]
    async fn test_fetch_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested.log")).unwrap();
        let source = DirSource::new(dir.path());

        let err = source.fetch_file_content("nested.log").await.unwrap_err();
        assert!(err.is_not_found());
        let err = source.tail_with_filter("nested.log", 0, None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_outside_dir_rejected() {
        let outside = TempDir::new().unwrap();
        write(&outside, "secret.log", "[INFO] secret\n");
        let dir = TempDir::new().unwrap();
        write(&dir, "app.log", "[INFO] ok\n");
        std::os::unix::fs::symlink(outside.path().join("secret.log"), dir.path().join("link.log"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("app.log"), dir.path().join("alias.log"))
            .unwrap();
        let source = DirSource::new(dir.path());

        let err = source.fetch_file_content("link.log").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidName(_)));
        assert_eq!(source.fetch_file_content("alias.log").await.unwrap(), "[INFO] ok\n");

        let mut stream = source.open_log_stream(Some("link.log"), None);
        assert!(matches!(
            stream.next().await.unwrap(),
            Err(SourceError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = DirSource::new(dir.path());
        let mut stream = source.open_log_stream(None, None);
        assert!(matches!(
            stream.next().await.unwrap(),
            Err(SourceError::NotFound(_))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_invalid_name_errors() {
        let source = DirSource::new("/tmp/logs");
        let mut stream = source.open_log_stream(Some("../x.log"), None);
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(SourceError::InvalidName(_))));
        assert!(stream.next().await.is_none());
    }
}
