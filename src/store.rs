use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use walkdir::WalkDir;

use crate::model::{Channel, Message};
use crate::{AppError, Result};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| AppError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| AppError::JsonParse(format!("{}: {}", path.display(), e)))
}

/// Writes `data` as indented JSON, creating missing parent directories.
///
/// The content goes to a `.tmp` sibling first and is renamed into place once
/// fully flushed, so `path` only ever holds a complete document.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| AppError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let tmp_path = partial_path(path);
    let written = File::create(&tmp_path)
        .map_err(|e| AppError::WriteFile {
            path: tmp_path.display().to_string(),
            source: e,
        })
        .and_then(|file| write_json_to(file, &tmp_path, data))
        .and_then(|()| {
            fs::rename(&tmp_path, path).map_err(|e| AppError::WriteFile {
                path: path.display().to_string(),
                source: e,
            })
        });

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

/// Serializes into `writer` and flushes it. `path` only labels errors.
fn write_json_to<W: Write, T: Serialize + ?Sized>(writer: W, path: &Path, data: &T) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, data).map_err(|e| {
        if e.is_io() {
            AppError::WriteFile {
                path: path.display().to_string(),
                source: e.into(),
            }
        } else {
            AppError::JsonSerialize(e.to_string())
        }
    })?;
    writer.flush().map_err(|e| AppError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Directory of per-channel message files. A file's presence marks its
/// channel as done.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    raw_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn artifact_path(&self, channel: &Channel) -> PathBuf {
        let file_name: String = channel
            .name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.raw_dir.join(format!("{}.json", file_name))
    }

    pub fn exists(&self, channel: &Channel) -> bool {
        self.artifact_path(channel).exists()
    }

    pub fn save(&self, channel: &Channel, messages: &[Message]) -> Result<PathBuf> {
        let path = self.artifact_path(channel);
        write_json(&path, messages)?;
        Ok(path)
    }

    /// Every stored message, file by file in name order.
    pub fn load_all(&self) -> Result<Vec<Message>> {
        let mut all_messages = Vec::with_capacity(4000);
        let mut files = 0;

        for entry in WalkDir::new(&self.raw_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| AppError::ReadFile {
                path: self.raw_dir.display().to_string(),
                source: e.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let messages: Vec<Message> = read_json(path)?;
            all_messages.extend(messages);
            files += 1;
        }

        info!(
            messages = all_messages.len(),
            files,
            "loaded messages from {}",
            self.raw_dir.display()
        );
        Ok(all_messages)
    }
}
