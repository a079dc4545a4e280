//! File system storage for comments

use gallery_core::comment::{Comment, CommentRepository};
use gallery_core::error::{GalleryError, Result};
use gallery_core::types::CommentId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Schema version written into every comment file
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// On-disk wrapper around a stored comment
#[derive(Debug, Serialize, Deserialize)]
struct CommentFile {
    schema_version: String,
    comment: Comment,
}

/// File system based comment storage
///
/// One `comments/<id>.json` document per comment.
pub struct FileSystemStorage {
    /// Base directory for storage
    base_dir: PathBuf,
    /// Comments subdirectory
    comments_dir: PathBuf,
    /// Serialises id allocation
    insert_lock: Mutex<()>,
}

impl FileSystemStorage {
    /// Create a new file system storage
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let comments_dir = base_dir.join("comments");

        let storage = Self {
            base_dir,
            comments_dir,
            insert_lock: Mutex::new(()),
        };

        storage.ensure_dirs()?;
        Ok(storage)
    }

    /// Platform data directory, or ~/.gallery-comments
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "gallery-comments", "gallery-comments")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".gallery-comments")
            })
    }

    /// Create storage in the default directory
    pub fn default_location() -> Result<Self> {
        Self::new(Self::default_dir())
    }

    /// Ensure required directories exist
    fn ensure_dirs(&self) -> Result<()> {
        if !self.comments_dir.exists() {
            fs::create_dir_all(&self.comments_dir).map_err(|e| {
                GalleryError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create comments directory: {}", e),
                ))
            })?;
            debug!("Created comments directory: {:?}", self.comments_dir);
        }
        Ok(())
    }

    /// Get the path for a comment file
    fn comment_path(&self, id: CommentId) -> PathBuf {
        self.comments_dir.join(format!("{}.json", id))
    }

    /// Get a temporary path for atomic writes
    fn temp_path(&self, id: CommentId) -> PathBuf {
        self.comments_dir.join(format!(".{}.json.tmp", id))
    }

    /// Write comment atomically (write to temp, then rename)
    fn atomic_write(&self, id: CommentId, comment: &Comment) -> Result<()> {
        let temp_path = self.temp_path(id);
        let final_path = self.comment_path(id);

        let mut stored = comment.clone();
        stored.id = Some(id);
        let file = CommentFile {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            comment: stored,
        };

        let temp_file = fs::File::create(&temp_path).map_err(|e| {
            GalleryError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create temp file: {}", e),
            ))
        })?;
        let mut writer = BufWriter::new(temp_file);
        serde_json::to_writer_pretty(&mut writer, &file)?;
        writer.flush()?;

        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            GalleryError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file: {}", e),
            ))
        })?;

        debug!("Saved comment {} to {:?}", id, final_path);
        Ok(())
    }

    /// Read and parse a comment file
    fn read_comment(&self, path: &Path) -> Result<Comment> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let comment_file: CommentFile = serde_json::from_reader(reader)?;

        if comment_file.schema_version != CURRENT_SCHEMA_VERSION {
            return Err(GalleryError::UnsupportedSchemaVersion(
                comment_file.schema_version,
            ));
        }

        Ok(comment_file.comment)
    }

    /// IDs of all stored comment files
    fn stored_ids(&self) -> Result<Vec<CommentId>> {
        let entries = fs::read_dir(&self.comments_dir).map_err(|e| {
            GalleryError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read comments directory: {}", e),
            ))
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.extension().map(|e| e == "json").unwrap_or(false) {
                continue;
            }
            // Temp files start with '.', so they fail to parse here too
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(id) => ids.push(CommentId(id)),
                None => debug!("Skipping {:?}", path),
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Get base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get comments directory
    pub fn comments_dir(&self) -> &PathBuf {
        &self.comments_dir
    }
}

impl CommentRepository for FileSystemStorage {
    fn find(&self, id: CommentId) -> Result<Option<Comment>> {
        let path = self.comment_path(id);
        if !path.exists() {
            return Ok(None);
        }
        self.read_comment(&path).map(Some)
    }

    fn insert(&self, comment: &Comment) -> Result<CommentId> {
        let _guard = self.insert_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let next = self
            .stored_ids()?
            .last()
            .map_or(1, |last| last.0 + 1);
        let id = CommentId(next);

        self.atomic_write(id, comment)?;
        Ok(id)
    }

    fn update(&self, id: CommentId, comment: &Comment) -> Result<()> {
        if !self.comment_path(id).exists() {
            return Err(GalleryError::CommentNotFound(id));
        }
        self.atomic_write(id, comment)
    }

    fn list(&self) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();

        for id in self.stored_ids()? {
            let path = self.comment_path(id);
            match self.read_comment(&path) {
                Ok(comment) => comments.push(comment),
                Err(e) => {
                    warn!("Failed to read comment file {:?}: {}", path, e);
                }
            }
        }

        Ok(comments)
    }
}
