//! 请求日志存储
//!
//! `LogStore` 是同步接口，由 `CollectorService` 通过 `spawn_blocking` 调用。

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};

use super::error::StoreError;
use super::model::{LogEntry, LogPage, PageQuery, TrafficStats};

/// 日志存储接口
pub trait LogStore: Send + Sync {
    /// 追加一条日志
    fn insert(&self, entry: &LogEntry) -> Result<(), StoreError>;

    /// 按插入顺序列出全部日志
    fn list_all(&self) -> Result<Vec<LogEntry>, StoreError>;

    /// 按 method 精确匹配
    fn list_by_method(&self, method: &str) -> Result<Vec<LogEntry>, StoreError>;

    /// 过滤 + 分页
    fn list_paged(&self, query: &PageQuery) -> Result<LogPage, StoreError>;

    /// 聚合统计
    fn stats(&self) -> Result<TrafficStats, StoreError>;

    /// 清空全部日志
    fn truncate(&self) -> Result<(), StoreError>;
}

const SELECT_COLUMNS: &str = "SELECT method, url, status_code, request_size FROM request_logs";

/// SQLite 实现
pub struct SqliteLogStore {
    conn: Mutex<Connection>,
}

impl SqliteLogStore {
    /// 打开（或创建）数据库文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS request_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                status_code INTEGER NOT NULL,
                request_size INTEGER NOT NULL CHECK (request_size >= 0)
            );
            CREATE INDEX IF NOT EXISTS idx_request_logs_method ON request_logs(method);
            CREATE INDEX IF NOT EXISTS idx_request_logs_url ON request_logs(url);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
        Ok(LogEntry {
            method: row.get(0)?,
            path: row.get(1)?,
            status_code: row.get::<_, i64>(2)? as u16,
            request_size_bytes: row.get::<_, i64>(3)?.max(0) as u64,
        })
    }

    /// 根据过滤器构建 WHERE 子句，值全部走参数绑定
    fn build_filter(query: &PageQuery) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let mut where_clauses = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref method) = query.method {
            where_clauses.push(format!("method = ?{}", params.len() + 1));
            params.push(Box::new(method.clone()));
        }
        if let Some(ref path) = query.path {
            where_clauses.push(format!("url = ?{}", params.len() + 1));
            params.push(Box::new(path.clone()));
        }
        if let Some(status) = query.status_code {
            where_clauses.push(format!("status_code = ?{}", params.len() + 1));
            params.push(Box::new(i64::from(status)));
        }
        if let Some(size) = query.request_size_bytes {
            where_clauses.push(format!("request_size = ?{}", params.len() + 1));
            params.push(Box::new(i64::try_from(size).unwrap_or(i64::MAX)));
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };
        (where_sql, params)
    }

    fn count_matching(&self, query: &PageQuery) -> Result<u64, StoreError> {
        let (where_sql, params) = Self::build_filter(query);
        let count_sql = format!("SELECT COUNT(*) FROM request_logs {}", where_sql);

        let conn = self.conn.lock();
        let total: i64 = conn.query_row(
            &count_sql,
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    fn fetch_page(&self, query: &PageQuery) -> Result<Vec<LogEntry>, StoreError> {
        let (where_sql, mut params) = Self::build_filter(query);
        let page_sql = format!(
            "{} {} ORDER BY method ASC, id ASC LIMIT ?{} OFFSET ?{}",
            SELECT_COLUMNS,
            where_sql,
            params.len() + 1,
            params.len() + 2
        );
        params.push(Box::new(i64::from(query.limit)));
        params.push(Box::new(i64::try_from(query.offset()).unwrap_or(i64::MAX)));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&page_sql)?;
        let logs = stmt
            .query_map(
                rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
                Self::map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// 出现次数最多的列值，次数相同时取字典序最小者；空表返回空字符串
    fn most_frequent(conn: &Connection, column: &str) -> Result<String, StoreError> {
        let sql = format!(
            "SELECT {col} FROM request_logs GROUP BY {col} ORDER BY COUNT(*) DESC, {col} ASC LIMIT 1",
            col = column
        );
        let value: Option<String> = conn.query_row(&sql, [], |row| row.get(0)).optional()?;
        Ok(value.unwrap_or_default())
    }
}

impl LogStore for SqliteLogStore {
    fn insert(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO request_logs (method, url, status_code, request_size) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                entry.method,
                entry.path,
                i64::from(entry.status_code),
                i64::try_from(entry.request_size_bytes).unwrap_or(i64::MAX),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<LogEntry>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))?;
        let logs = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn list_by_method(&self, method: &str) -> Result<Vec<LogEntry>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare(&format!("{} WHERE method = ?1 ORDER BY id ASC", SELECT_COLUMNS))?;
        let logs = stmt
            .query_map([method], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn list_paged(&self, query: &PageQuery) -> Result<LogPage, StoreError> {
        // 计数与取页分别加锁，两者之间可能有新写入
        let total = self.count_matching(query)?;
        let logs = self.fetch_page(query)?;
        Ok(LogPage { logs, total })
    }

    fn stats(&self) -> Result<TrafficStats, StoreError> {
        let conn = self.conn.lock();

        let (total_requests, avg_request_size_bytes): (i64, f64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(AVG(request_size), 0.0) FROM request_logs",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if total_requests == 0 {
            return Ok(TrafficStats::empty());
        }

        Ok(TrafficStats {
            total_requests: total_requests as u64,
            most_used_method: Self::most_frequent(&conn, "method")?,
            most_accessed_path: Self::most_frequent(&conn, "url")?,
            avg_request_size_bytes,
        })
    }

    fn truncate(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM request_logs", [])?;
        // 重置自增序列
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'request_logs'", [])?;
        tx.commit()?;
        Ok(())
    }
}
