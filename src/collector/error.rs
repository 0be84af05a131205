//! 收集器错误类型

use axum::http::StatusCode;

use super::types::ErrorResponse;

/// 存储层错误
#[derive(Debug)]
pub enum StoreError {
    /// SQLite 执行失败
    Sqlite(rusqlite::Error),
    /// 阻塞任务执行失败（panic 或被取消）
    Task(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "database error: {}", e),
            StoreError::Task(e) => write!(f, "store task failed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Sqlite(e) => Some(e),
            StoreError::Task(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Task(e.to_string())
    }
}

/// 收集器 API 错误
#[derive(Debug)]
pub enum CollectorError {
    /// 查询参数缺失或非法（不会触达存储）
    Validation(String),
    /// 读取请求体失败
    BodyRead(String),
    /// 存储失败
    Store(StoreError),
}

impl CollectorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CollectorError::Validation(_) => StatusCode::BAD_REQUEST,
            CollectorError::BodyRead(_) | CollectorError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 转换为对外的 JSON 错误体
    ///
    /// 存储错误的细节只写日志，不返回给调用方
    pub fn into_response(self) -> ErrorResponse {
        match self {
            CollectorError::Validation(message) => ErrorResponse::invalid_request(message),
            CollectorError::BodyRead(_) => {
                ErrorResponse::internal_error("Failed to read request body")
            }
            CollectorError::Store(_) => ErrorResponse::internal_error("Database error"),
        }
    }
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::Validation(msg) => write!(f, "invalid request: {}", msg),
            CollectorError::BodyRead(msg) => write!(f, "failed to read request body: {}", msg),
            CollectorError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<StoreError> for CollectorError {
    fn from(e: StoreError) -> Self {
        CollectorError::Store(e)
    }
}
