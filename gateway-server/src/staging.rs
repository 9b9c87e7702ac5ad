// gateway-server/src/staging.rs
use common::generate_secure_token;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

// Length of the random component in staged filenames
const TOKEN_LENGTH: usize = 12;
// Attempts before giving up on a colliding name
const CREATE_ATTEMPTS: u32 = 5;

/// Allocates identity-scoped staging files under a configured root.
/// Final paths look like `{root}/{identity}/{token}_{original}`, where
/// `token` is a random alphanumeric string, so concurrent allocations
/// for the same or different identities never share a path.
#[derive(Clone, Debug)]
pub struct StagingAllocator {
    root: PathBuf,
}

impl StagingAllocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create (idempotently) the directory for an identity and return it.
    pub async fn prepare_directory(&self, identity: &str) -> io::Result<PathBuf> {
        let dir = self.root.join(identity);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Open a new, exclusively-owned, empty file for an upload.
    /// `create_new` guarantees exclusivity at the filesystem level; a
    /// token collision surfaces as `AlreadyExists` and gets a fresh token.
    pub async fn allocate(&self, identity: &str, original_name: &str) -> io::Result<StagingFile> {
        let dir = self.prepare_directory(identity).await?;
        let name = sanitize_filename(original_name);

        for _ in 0..CREATE_ATTEMPTS {
            let token = generate_secure_token(TOKEN_LENGTH);
            let path = dir.join(format!("{}_{}", token, name));

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok(StagingFile { path, file }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "exhausted staging filename attempts",
        ))
    }
}

/// A staged upload in progress. Write chunks as they arrive, then call
/// `finalize` to flush, sync and close the handle before the path is
/// referenced anywhere else. Dropping without finalizing closes the
/// handle; the partial file stays on disk for external cleanup.
pub struct StagingFile {
    path: PathBuf,
    file: fs::File,
}

impl StagingFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await
    }

    /// Make the file durable and hand back its path. Consumes the handle
    /// so no write can happen after the path has been given out.
    pub async fn finalize(mut self) -> io::Result<PathBuf> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(self.path)
    }
}

/// Reduce a client-supplied filename to its final path component so it
/// cannot traverse outside the identity's directory.
fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_allocations_never_collide() {
        let root = tempfile::tempdir().unwrap();
        let allocator = StagingAllocator::new(root.path());

        let mut paths = HashSet::new();
        for _ in 0..32 {
            let staged = allocator.allocate("abc123", "video.mp4").await.unwrap();
            assert!(paths.insert(staged.path().to_path_buf()), "duplicate path");
        }
    }

    #[tokio::test]
    async fn test_paths_are_identity_scoped() {
        let root = tempfile::tempdir().unwrap();
        let allocator = StagingAllocator::new(root.path());

        let a = allocator.allocate("abc123", "video.mp4").await.unwrap();
        let b = allocator.allocate("xyz789", "video.mp4").await.unwrap();

        assert!(a.path().starts_with(root.path().join("abc123")));
        assert!(b.path().starts_with(root.path().join("xyz789")));
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_filename_embeds_original_after_token() {
        let root = tempfile::tempdir().unwrap();
        let allocator = StagingAllocator::new(root.path());

        let staged = allocator.allocate("abc123", "video.mp4").await.unwrap();
        let filename = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(filename.ends_with("_video.mp4"));
        assert_eq!(filename.len(), "_video.mp4".len() + 12);
    }

    #[tokio::test]
    async fn test_traversal_components_are_stripped() {
        let root = tempfile::tempdir().unwrap();
        let allocator = StagingAllocator::new(root.path());

        let staged = allocator
            .allocate("abc123", "../../../etc/passwd")
            .await
            .unwrap();
        assert!(staged.path().starts_with(root.path().join("abc123")));
        assert!(staged
            .path()
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("_passwd"));
    }

    #[tokio::test]
    async fn test_finalize_makes_bytes_durable() {
        let root = tempfile::tempdir().unwrap();
        let allocator = StagingAllocator::new(root.path());

        let mut staged = allocator.allocate("abc123", "video.mp4").await.unwrap();
        staged.write_chunk(b"hello ").await.unwrap();
        staged.write_chunk(b"world").await.unwrap();
        let path = staged.finalize().await.unwrap();

        let contents = std::fs::read(path).unwrap();
        assert_eq!(contents, b"hello world");
    }
}
