//! Incremental line tailing for an append-only journal file.
//!
//! `byte_offset` always points at the first byte not yet folded into a
//! complete record. Every poll re-seeks there and reads to the current
//! end of file, so a trailing partial line is naturally re-read (and
//! completed) alongside whatever was appended since — `byte_offset` only
//! advances past bytes that end up inside a finished line. The cursor
//! persisted in `cursor_store` is therefore sufficient to resume after a
//! restart without redelivering or duplicating lines.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::cursor_store::CursorState;

/// A single line read off the journal, paired with the byte offset and
/// line count the cursor should be advanced to once it is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailedLine {
    pub text: String,
    pub byte_offset: u64,
    pub line_count: u64,
}

pub struct FileTailer {
    path: PathBuf,
    byte_offset: u64,
    line_count: u64,
    partial: String,
    last_uuid: Option<String>,
}

impl FileTailer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            byte_offset: 0,
            line_count: 0,
            partial: String::new(),
            last_uuid: None,
        }
    }

    pub fn resume(path: impl Into<PathBuf>, cursor: &CursorState) -> Self {
        Self {
            path: path.into(),
            byte_offset: cursor.byte_offset,
            line_count: cursor.line_count,
            partial: String::new(),
            last_uuid: cursor.last_uuid.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cursor(&self) -> CursorState {
        CursorState {
            byte_offset: self.byte_offset,
            line_count: self.line_count,
            last_uuid: self.last_uuid.clone(),
        }
    }

    /// True count of bytes read from disk this session, including a
    /// trailing partial line not yet folded into `byte_offset`. Used by
    /// the watcher to decide whether a poll made progress, distinct from
    /// `cursor().byte_offset`, which only advances on complete lines.
    pub fn read_position(&self) -> u64 {
        self.byte_offset + self.partial.len() as u64
    }

    /// Record the `uuid` of the most recently delivered record, when
    /// present. Called by the watcher after it decodes each line's raw
    /// JSON, since the tailer itself only deals in text lines.
    pub fn note_record_uuid(&mut self, uuid: Option<&str>) {
        if let Some(uuid) = uuid {
            self.last_uuid = Some(uuid.to_string());
        }
    }

    /// Read every complete line appended since the last poll. Returns an
    /// empty vec when the file hasn't grown or doesn't exist yet (the
    /// session file may not have been created at startup).
    pub async fn poll(&mut self) -> std::io::Result<Vec<TailedLine>> {
        let mut file = match File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let len = file.metadata().await?.len();
        if len < self.byte_offset {
            // File was truncated or replaced: start over from the top.
            self.byte_offset = 0;
            self.line_count = 0;
            self.partial.clear();
        }
        if len == self.byte_offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.byte_offset)).await?;
        let mut buf = Vec::with_capacity((len - self.byte_offset) as usize);
        file.read_to_end(&mut buf).await?;

        // `buf` starts at `self.byte_offset`, which sits just before any
        // partial line left over from the previous poll — so that partial
        // is re-read here as part of `chunk` rather than reassembled by
        // hand, and `self.partial` is reset below to hold only whatever
        // tail (if any) this poll leaves unterminated.
        let chunk = String::from_utf8_lossy(&buf);
        self.partial.clear();
        let mut consumed_bytes = 0usize;
        let mut lines = Vec::new();

        for segment in chunk.split_inclusive('\n') {
            if let Some(line) = segment.strip_suffix('\n') {
                consumed_bytes += segment.len();
                if !line.trim().is_empty() {
                    self.line_count += 1;
                    self.byte_offset += consumed_bytes as u64;
                    consumed_bytes = 0;
                    lines.push(TailedLine {
                        text: line.to_string(),
                        byte_offset: self.byte_offset,
                        line_count: self.line_count,
                    });
                } else {
                    self.byte_offset += consumed_bytes as u64;
                    consumed_bytes = 0;
                }
            } else {
                // Trailing partial line: buffer it and stop consuming.
                // `byte_offset` is left where it is, so the next poll
                // re-reads these bytes from disk instead of prepending
                // them from memory.
                self.partial.push_str(segment);
                break;
            }
        }

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn reads_complete_lines_only() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"a\":1}}\n{{\"a\":2}}\n{{\"a\":3").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(file.path());
        let lines = tailer.poll().await.unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, r#"{"a":1}"#);
        assert_eq!(lines[1].text, r#"{"a":2}"#);
        assert_eq!(lines[1].line_count, 2);
    }

    #[tokio::test]
    async fn partial_line_completes_on_next_poll() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"a\":1").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(file.path());
        let first = tailer.poll().await.unwrap();
        assert!(first.is_empty());

        write!(file, "}}\n").unwrap();
        file.flush().unwrap();
        let second = tailer.poll().await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].text, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn partial_line_grows_across_several_polls_without_duplication() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"a\"").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(file.path());
        assert!(tailer.poll().await.unwrap().is_empty());

        write!(file, ":1,\"b\"").unwrap();
        file.flush().unwrap();
        assert!(tailer.poll().await.unwrap().is_empty());

        write!(file, ":2}}\n").unwrap();
        file.flush().unwrap();
        let lines = tailer.poll().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, r#"{"a":1,"b":2}"#);
    }

    #[tokio::test]
    async fn read_position_tracks_unterminated_partial_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"a\":1}}\n{{\"a\":2").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(file.path());
        let lines = tailer.poll().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(tailer.cursor().byte_offset, lines[0].byte_offset);
        assert_eq!(tailer.read_position(), file.path().metadata().unwrap().len());
    }

    #[tokio::test]
    async fn no_growth_returns_empty() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"a\":1}}\n").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(file.path());
        assert_eq!(tailer.poll().await.unwrap().len(), 1);
        assert!(tailer.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn note_record_uuid_is_carried_into_cursor() {
        let mut tailer = FileTailer::new("/tmp/irrelevant.jsonl");
        assert_eq!(tailer.cursor().last_uuid, None);
        tailer.note_record_uuid(Some("abc-123"));
        assert_eq!(tailer.cursor().last_uuid, Some("abc-123".to_string()));
        tailer.note_record_uuid(None);
        assert_eq!(tailer.cursor().last_uuid, Some("abc-123".to_string()));
    }

    #[tokio::test]
    async fn missing_file_yields_empty_not_error() {
        let mut tailer = FileTailer::new("/no/such/file.jsonl");
        assert!(tailer.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resume_from_cursor_skips_delivered_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"a\":1}}\n{{\"a\":2}}\n").unwrap();
        file.flush().unwrap();

        let mut first = FileTailer::new(file.path());
        first.poll().await.unwrap();
        let cursor = first.cursor();

        write!(file, "{{\"a\":3}}\n").unwrap();
        file.flush().unwrap();

        let mut resumed = FileTailer::resume(file.path(), &cursor);
        let lines = resumed.poll().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, r#"{"a":3}"#);
    }

    #[tokio::test]
    async fn blank_lines_are_skipped_but_advance_offset() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"a\":1}}\n\n{{\"a\":2}}\n").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(file.path());
        let lines = tailer.poll().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line_count, 2);
    }
}
