//! Sandboxed file access.
//!
//! Every path is resolved against a canonical base directory, following
//! symlinks along whatever part of the path already exists. Paths that
//! contain a forbidden pattern or resolve outside the base are rejected before
//! any file is read or written.


use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::debug;

use crate::tools::{
    McpTool, ParamType, ToolDescriptor, ToolError, ToolParameter, ToolResult, ValidatedArgs,
};

/// Default maximum readable file size in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_024_000;

/// Upper bound accepted for `max_file_size`.
pub const MAX_FILE_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// Substrings that make a path unacceptable regardless of where it resolves.
pub const FORBIDDEN_PATTERNS: [&str; 4] = ["../", "..\\", "/etc/", "/root/"];

/// File manager settings, also the `[file_manager]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileManagerConfig {
    pub base_directory: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_file_size: u64,
}

impl Default for FileManagerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("."),
            allowed_extensions: [".txt", ".json", ".py", ".md"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl FileManagerConfig {
    /// Check value ranges without touching the filesystem.
    #[inline]
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size == 0 || self.max_file_size > MAX_FILE_SIZE_LIMIT {
            return Err(format!(
                "max_file_size must be between 1 and {} bytes, got {}",
                MAX_FILE_SIZE_LIMIT, self.max_file_size
            ));
        }
        if let Some(bad) = self
            .allowed_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(format!(
                "allowed extension '{}' must start with a dot followed by a suffix",
                bad
            ));
        }
        Ok(())
    }
}

/// Operation requested from the file manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
    List,
    Delete,
    CreateDir,
}

impl FileOperation {
    pub const NAMES: [&'static str; 5] = ["read", "write", "list", "delete", "create_dir"];
}

impl FromStr for FileOperation {
    type Err = ToolError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "list" => Ok(Self::List),
            "delete" => Ok(Self::Delete),
            "create_dir" => Ok(Self::CreateDir),
            other => Err(ToolError::InvalidInput(format!(
                "operation '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Serialize)]
struct DirEntryInfo {
    name: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    size: Option<u64>,
    modified: Option<f64>,
}

/// Read, write, list, delete files and create directories under a base
/// directory.
#[derive(Debug)]
pub struct FileManagerTool {
    descriptor: ToolDescriptor,
    base_directory: PathBuf,
    allowed_extensions: Vec<String>,
    max_file_size: u64,
}

impl FileManagerTool {
    /// Build the tool. The base directory must exist; it is canonicalized once
    /// here.
    #[inline]
    pub fn new(config: FileManagerConfig) -> Result<Self, ToolError> {
        config.validate().map_err(ToolError::InvalidInput)?;

        let base_directory = std::fs::canonicalize(&config.base_directory).map_err(|e| {
            ToolError::InvalidInput(format!(
                "base directory {} is not accessible: {}",
                config.base_directory.display(),
                e
            ))
        })?;

        let descriptor = ToolDescriptor::new(
            "file_manager",
            "Manage files and directories inside a sandboxed base directory",
            vec![
                ToolParameter::required("operation", ParamType::String, "File operation")
                    .with_allowed(FileOperation::NAMES),
                ToolParameter::required(
                    "file_path",
                    ParamType::String,
                    "Path relative to the base directory",
                ),
                ToolParameter::optional(
                    "content",
                    ParamType::String,
                    "Content for write operations",
                ),
                ToolParameter::optional("encoding", ParamType::String, "File encoding")
                    .with_default(json!("utf-8")),
            ],
        )?;

        Ok(Self {
            descriptor,
            base_directory,
            allowed_extensions: config.allowed_extensions,
            max_file_size: config.max_file_size,
        })
    }

    #[inline]
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Apply the path policy and return the absolute target path.
    #[inline]
    pub async fn resolve(&self, file_path: &str) -> Result<PathBuf, ToolError> {
        if file_path.trim().is_empty() {
            return Err(ToolError::InvalidInput("file path cannot be empty".to_string()));
        }

        if let Some(pattern) = FORBIDDEN_PATTERNS.iter().find(|p| file_path.contains(*p)) {
            return Err(ToolError::Policy(format!(
                "path contains forbidden pattern: {}",
                pattern
            )));
        }

        let joined = normalize(&self.base_directory.join(file_path));
        let resolved = resolve_existing_prefix(&joined).await?;

        if !resolved.starts_with(&self.base_directory) {
            return Err(ToolError::Policy(
                "path is outside the allowed base directory".to_string(),
            ));
        }

        Ok(resolved)
    }

    async fn read_file(&self, path: &Path, encoding: &str) -> Result<ToolResult, ToolError> {
        let meta = metadata_or(path, "file not found").await?;
        if !meta.is_file() {
            return Err(ToolError::InvalidInput("path is not a file".to_string()));
        }

        let extension = dotted_extension(path);
        if !self.allowed_extensions.iter().any(|e| *e == extension) {
            return Err(ToolError::Policy(format!(
                "extension not allowed. Allowed: {:?}",
                self.allowed_extensions
            )));
        }

        if meta.len() > self.max_file_size {
            return Err(ToolError::Policy(format!(
                "file too large: {} bytes exceeds the limit of {} bytes",
                meta.len(),
                self.max_file_size
            )));
        }

        let content = fs::read_to_string(path).await?;
        Ok(ToolResult::success(content)
            .with_metadata("file_size", meta.len())
            .with_metadata("encoding", encoding)
            .with_metadata("extension", extension))
    }

    async fn write_file(
        &self,
        path: &Path,
        content: Option<&str>,
        encoding: &str,
    ) -> Result<ToolResult, ToolError> {
        let content = content.ok_or_else(|| {
            ToolError::InvalidInput("content is required for write operation".to_string())
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await?;

        Ok(
            ToolResult::success(format!("File written successfully: {}", path.display()))
                .with_metadata("file_size", content.len())
                .with_metadata("encoding", encoding),
        )
    }

    async fn list_directory(&self, path: &Path) -> Result<ToolResult, ToolError> {
        let meta = metadata_or(path, "directory not found").await?;
        if !meta.is_dir() {
            return Err(ToolError::InvalidInput("path is not a directory".to_string()));
        }

        let mut items = Vec::new();
        let mut entries = fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64());
            items.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: if meta.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: meta.is_file().then(|| meta.len()),
                modified,
            });
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));

        let count = items.len();
        Ok(ToolResult::success(serde_json::to_string_pretty(&items)?)
            .with_metadata("item_count", count))
    }

    async fn delete_file(&self, path: &Path) -> Result<ToolResult, ToolError> {
        let meta = metadata_or(path, "file not found").await?;
        if !meta.is_file() {
            return Err(ToolError::InvalidInput("path is not a file".to_string()));
        }
        fs::remove_file(path).await?;
        Ok(ToolResult::success(format!("File deleted: {}", path.display())))
    }

    async fn create_directory(&self, path: &Path) -> Result<ToolResult, ToolError> {
        fs::create_dir_all(path).await?;
        Ok(ToolResult::success(format!(
            "Directory created: {}",
            path.display()
        )))
    }
}

#[async_trait]
impl McpTool for FileManagerTool {
    #[inline]
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        let operation: FileOperation = args.str("operation")?.parse()?;
        let path = self.resolve(args.str("file_path")?).await?;

        let encoding = args.opt_str("encoding").unwrap_or("utf-8");
        if !encoding.eq_ignore_ascii_case("utf-8") && !encoding.eq_ignore_ascii_case("utf8") {
            return Err(ToolError::InvalidInput(format!(
                "unsupported encoding: {}",
                encoding
            )));
        }

        debug!("file_manager {:?} on {}", operation, path.display());

        match operation {
            FileOperation::Read => self.read_file(&path, encoding).await,
            FileOperation::Write => {
                self.write_file(&path, args.opt_str("content"), encoding)
                    .await
            }
            FileOperation::List => self.list_directory(&path).await,
            FileOperation::Delete => self.delete_file(&path).await,
            FileOperation::CreateDir => self.create_directory(&path).await,
        }
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor of `path` and re-append the
/// components that do not exist yet, so symlinks anywhere along the existing
/// part are followed even when the target itself is new.
///
/// `path` must already be absolute and lexically normalized.
async fn resolve_existing_prefix(path: &Path) -> Result<PathBuf, ToolError> {
    let mut existing = path;
    let mut missing: Vec<&OsStr> = Vec::new();

    loop {
        if let Ok(mut real) = fs::canonicalize(existing).await {
            real.extend(missing.iter().rev());
            return Ok(real);
        }

        // Present but unresolvable: a dangling or looping symlink.
        if fs::symlink_metadata(existing).await.is_ok() {
            return Err(ToolError::Policy(format!(
                "path cannot be resolved: {}",
                existing.display()
            )));
        }

        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(path.to_path_buf()),
        }
    }
}

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

async fn metadata_or(path: &Path, not_found: &str) -> Result<std::fs::Metadata, ToolError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ToolError::NotFound(not_found.to_string())),
        Err(e) => Err(ToolError::Io(e)),
    }
}
