//! File-backed history: one JSON-encoded [`Turn`] per line.
//!
//! A batch of turns is encoded up front and written with a single call, so a
//! crash can tear at most the last line. A torn tail is closed off with a
//! newline before the next append, and lines that fail to parse are skipped
//! on read with a warning instead of poisoning the whole log.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::HistoryBackend;
use crate::error::ParleyError;
use crate::types::Turn;

/// JSON-lines history log at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonlBackend {
    path: PathBuf,
}

impl JsonlBackend {
    /// The file and its parent directory are created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> Result<(), ParleyError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl HistoryBackend for JsonlBackend {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn append_batch(&self, turns: &[Turn]) -> Result<(), ParleyError> {
        if turns.is_empty() {
            return Ok(());
        }
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ParleyError::History(format!("cannot open {}: {e}", self.path.display()))
            })?;

        let mut buf = String::new();
        if has_torn_tail(&mut file)? {
            warn!(path = %self.path.display(), "Closing off torn history record");
            buf.push('\n');
        }
        for turn in turns {
            buf.push_str(&serde_json::to_string(turn)?);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Turn>, ParleyError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ParleyError::Io(err)),
        };

        let mut turns = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Turn>(&line) {
                Ok(turn) => turns.push(turn),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping corrupted history record"
                ),
            }
        }
        debug!(path = %self.path.display(), count = turns.len(), "History loaded");
        Ok(turns)
    }

    fn truncate(&self) -> Result<(), ParleyError> {
        match OpenOptions::new().write(true).open(&self.path) {
            Ok(file) => {
                file.set_len(0)?;
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ParleyError::Io(err)),
        }
    }
}

/// True when the file is non-empty and its last byte is not a newline.
fn has_torn_tail(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use tempfile::TempDir;

    fn temp_backend() -> (TempDir, JsonlBackend) {
        let dir = TempDir::new().unwrap();
        let backend = JsonlBackend::new(dir.path().join("nested").join("history.jsonl"));
        (dir, backend)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, backend) = temp_backend();
        assert!(backend.read_all().unwrap().is_empty());
        backend.truncate().unwrap();
    }

    #[test]
    fn appends_survive_a_new_backend_instance() {
        let (_dir, backend) = temp_backend();
        backend.append(&Turn::user("hello")).unwrap();
        backend.append(&Turn::assistant("hi")).unwrap();

        let reopened = JsonlBackend::new(backend.path());
        let turns = reopened.read_all().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role(), Role::User);
        assert_eq!(turns[1].content(), "hi");
    }

    #[test]
    fn corrupt_lines_are_skipped() {
        let (_dir, backend) = temp_backend();
        backend.append(&Turn::user("first")).unwrap();
        let mut file = OpenOptions::new().append(true).open(backend.path()).unwrap();
        file.write_all(b"{not-json\n\n").unwrap();
        backend.append(&Turn::user("second")).unwrap();

        let contents: Vec<String> = backend
            .read_all()
            .unwrap()
            .iter()
            .map(|t| t.content().to_string())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn append_after_a_torn_record_is_still_readable() {
        let (_dir, backend) = temp_backend();
        backend.append(&Turn::user("first")).unwrap();
        let mut file = OpenOptions::new().append(true).open(backend.path()).unwrap();
        file.write_all(br#"{"id":"00000000-0000"#).unwrap();
        drop(file);

        backend
            .append(&Turn::new(Role::Assistant, "after restart"))
            .unwrap();
        let contents: Vec<String> = backend
            .read_all()
            .unwrap()
            .iter()
            .map(|t| t.content().to_string())
            .collect();
        assert_eq!(contents, vec!["first", "after restart"]);
    }

    #[test]
    fn batch_lands_as_consecutive_lines() {
        let (_dir, backend) = temp_backend();
        backend
            .append_batch(&[Turn::user("question"), Turn::assistant("answer")])
            .unwrap();
        let raw = fs::read_to_string(backend.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));
        assert_eq!(backend.read_all().unwrap()[1].role(), Role::Assistant);
    }

    #[test]
    fn truncate_empties_the_file_in_place() {
        let (_dir, backend) = temp_backend();
        backend.append(&Turn::user("gone")).unwrap();
        backend.truncate().unwrap();
        assert!(backend.path().exists());
        assert!(backend.read_all().unwrap().is_empty());

        backend.append(&Turn::user("after")).unwrap();
        assert_eq!(backend.read_all().unwrap().len(), 1);
    }

    #[test]
    fn unwritable_path_is_a_history_error() {
        let dir = TempDir::new().unwrap();
        let backend = JsonlBackend::new(dir.path());
        let err = backend.append(&Turn::user("nowhere")).unwrap_err();
        assert!(matches!(err, ParleyError::History(_)));
    }
}
