use crate::{connectors::sink::Sink, error::SinkError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Writes each dump to `<dir>/<name>`.
///
/// Content is first written to a hidden temporary file next to the target and
/// then renamed over it, so readers never observe a partially written dump.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        FileSink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target(&self, name: &str) -> Result<PathBuf, SinkError> {
        let path = Path::new(name);
        let valid = !name.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(SinkError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(path))
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn persist(&self, name: &str, content: &[u8]) -> Result<(), SinkError> {
        let target = self.target(name)?;
        let parent = target.parent().unwrap_or(&self.dir).to_path_buf();
        tokio::fs::create_dir_all(&parent).await?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SinkError::InvalidName(name.to_string()))?;
        let tmp = parent.join(format!(".{file_name}.tmp"));

        let replaced = async {
            tokio::fs::write(&tmp, content).await?;
            tokio::fs::rename(&tmp, &target).await
        };
        if let Err(e) = replaced.await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                debug!(path = %tmp.display(), error = %cleanup, "Temporary file not removed");
            }
            return Err(e.into());
        }

        debug!(path = %target.display(), bytes = content.len(), "Dump written");
        Ok(())
    }

    fn location(&self, name: &str) -> String {
        self.dir.join(name).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path().join("data"));

        sink.persist("dumpAgrovocEntities.json", b"[]").await.unwrap();

        let written = std::fs::read(tmp.path().join("data/dumpAgrovocEntities.json")).unwrap();
        assert_eq!(written, b"[]");
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("data"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_persist_replaces_previous_dump() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path());

        sink.persist("dump.json", b"[1]").await.unwrap();
        sink.persist("dump.json", b"[2]").await.unwrap();

        assert_eq!(std::fs::read(tmp.path().join("dump.json")).unwrap(), b"[2]");
    }

    fn leftover_tmp_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect()
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temporary_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("dump.json/occupied")).unwrap();
        let sink = FileSink::new(tmp.path());

        let err = sink.persist("dump.json", b"[]").await.unwrap_err();

        assert!(matches!(err, SinkError::Io(_)), "{err:?}");
        assert!(leftover_tmp_files(tmp.path()).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_write_removes_temporary_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A dangling link at the temporary path makes the write itself fail.
        std::os::unix::fs::symlink(
            tmp.path().join("missing/dir/target"),
            tmp.path().join(".dump.json.tmp"),
        )
        .unwrap();
        let sink = FileSink::new(tmp.path());

        let err = sink.persist("dump.json", b"[]").await.unwrap_err();

        assert!(matches!(err, SinkError::Io(_)), "{err:?}");
        assert!(leftover_tmp_files(tmp.path()).is_empty());
        assert!(!tmp.path().join("dump.json").exists());
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path());

        for name in ["", "../outside.json", "/etc/passwd", "a/../../b.json"] {
            assert!(
                matches!(
                    sink.persist(name, b"[]").await,
                    Err(SinkError::InvalidName(_))
                ),
                "{name:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_nested_names_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path());

        sink.persist("wikidata/entities.json", b"[]").await.unwrap();
        assert!(tmp.path().join("wikidata/entities.json").exists());
    }
}
