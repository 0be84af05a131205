//! 收集器业务逻辑服务
//!
//! 存储句柄由外部注入；所有存储调用都通过 `spawn_blocking` 移出异步运行时

use std::sync::Arc;

use bytes::Bytes;

use super::error::StoreError;
use super::model::{LogEntry, LogPage, PageQuery, TrafficStats};
use super::store::LogStore;

/// 入库日志固定记录的状态码
pub const COLLECTED_STATUS: u16 = 200;

/// 由入站请求推导日志条目
pub fn derive_entry(method: &str, path: &str, body: &[u8]) -> LogEntry {
    LogEntry {
        method: method.to_string(),
        path: path.to_string(),
        status_code: COLLECTED_STATUS,
        request_size_bytes: body.len() as u64,
    }
}

/// 收集器服务
pub struct CollectorService {
    store: Arc<dyn LogStore>,
}

impl CollectorService {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn LogStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref())).await?
    }

    /// 记录一次入站请求，成功后返回写入的条目
    pub async fn collect(
        &self,
        method: &str,
        path: &str,
        body: Bytes,
    ) -> Result<LogEntry, StoreError> {
        let entry = derive_entry(method, path, &body);
        let record = entry.clone();
        self.blocking(move |store| store.insert(&record)).await?;
        Ok(entry)
    }

    pub async fn list_all(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.blocking(|store| store.list_all()).await
    }

    pub async fn list_by_method(&self, method: String) -> Result<Vec<LogEntry>, StoreError> {
        self.blocking(move |store| store.list_by_method(&method)).await
    }

    pub async fn list_paged(&self, query: PageQuery) -> Result<LogPage, StoreError> {
        self.blocking(move |store| store.list_paged(&query)).await
    }

    pub async fn stats(&self) -> Result<TrafficStats, StoreError> {
        self.blocking(|store| store.stats()).await
    }

    pub async fn truncate(&self) -> Result<(), StoreError> {
        self.blocking(|store| store.truncate()).await
    }
}
