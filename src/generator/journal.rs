//! 请求日志文件
//!
//! 每个完成的派发单元追加一条记录；写入失败只告警，不影响本次运行

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// 单条已完成请求的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    pub method: String,
    pub url: String,
    pub body_size: usize,
    pub status: u16,
}

impl JournalRecord {
    fn render(&self) -> String {
        format!(
            "[Request] Method: {}, URL: {}, Body Size: {} bytes\n[Response] Status: {}\n",
            self.method, self.url, self.body_size, self.status
        )
    }
}

/// 追加写入的请求日志
pub struct RequestJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl RequestJournal {
    /// 创建（或清空）日志文件
    pub async fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录
    pub async fn append(&self, record: &JournalRecord) -> std::io::Result<()> {
        let line = record.render();
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// 追加一条记录，失败时仅记录告警
    pub async fn append_or_warn(&self, record: &JournalRecord) {
        if let Err(e) = self.append(record).await {
            tracing::warn!(
                path = %self.path.display(),
                "写入请求日志失败: {}",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(method: &str, status: u16) -> JournalRecord {
        JournalRecord {
            method: method.to_string(),
            url: "http://localhost:8080/collect".to_string(),
            body_size: 42,
            status,
        }
    }

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "stale content\n").unwrap();

        let _journal = RequestJournal::create(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_append_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let journal = RequestJournal::create(&path).await.unwrap();

        journal.append(&record("POST", 200)).await.unwrap();
        journal.append(&record("GET", 404)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "[Request] Method: POST, URL: http://localhost:8080/collect, Body Size: 42 bytes\n\
             [Response] Status: 200\n\
             [Request] Method: GET, URL: http://localhost:8080/collect, Body Size: 42 bytes\n\
             [Response] Status: 404\n"
        );
    }

    #[tokio::test]
    async fn test_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("log.txt");
        assert!(RequestJournal::create(&path).await.is_err());
    }
}
