//! 收集器 API 处理器

use axum::{
    body::{Body, to_bytes},
    extract::{Query, State, rejection::QueryRejection},
    http::{Method, Uri},
    response::{IntoResponse, Json},
};

use super::error::CollectorError;
use super::router::CollectorState;
use super::types::{
    LogListResponse, LogsQuery, MessageResponse, MethodLogsResponse, MethodQuery,
};

/// 单个请求体的读取上限
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

fn error_response(e: CollectorError) -> axum::response::Response {
    (e.status_code(), Json(e.into_response())).into_response()
}

/// 原始查询键值对；无法解析的查询串转为校验错误
fn query_pairs(
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Vec<(String, String)>, CollectorError> {
    query
        .map(|Query(pairs)| pairs)
        .map_err(|e| CollectorError::Validation(e.body_text()))
}

/// GET /
pub async fn welcome() -> impl IntoResponse {
    Json(MessageResponse::new("Welcome to Traffic Stats Collector!"))
}

/// ANY /collect
/// 记录入站请求的 method、路径和请求体大小
pub async fn collect(
    State(state): State<CollectorState>,
    method: Method,
    uri: Uri,
    body: Body,
) -> impl IntoResponse {
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("读取请求体失败: {}", e);
            return error_response(CollectorError::BodyRead(e.to_string()));
        }
    };

    match state.service.collect(method.as_str(), uri.path(), body).await {
        Ok(entry) => {
            tracing::info!(
                method = %entry.method,
                url = %entry.path,
                status_code = entry.status_code,
                request_size = entry.request_size_bytes,
                "请求已记录"
            );
            Json(MessageResponse::new("Data received")).into_response()
        }
        Err(e) => {
            tracing::error!("写入请求日志失败: {}", e);
            error_response(e.into())
        }
    }
}

/// GET /logs
/// 过滤 + 分页查询
pub async fn get_logs(
    State(state): State<CollectorState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> impl IntoResponse {
    let query = query_pairs(query).and_then(|pairs| LogsQuery::from_pairs(pairs).into_page_query());
    let query = match query {
        Ok(query) => query,
        Err(e) => {
            tracing::warn!("查询参数非法: {}", e);
            return error_response(e);
        }
    };
    let (page, limit) = (query.page, query.limit);

    match state.service.list_paged(query).await {
        Ok(result) => {
            tracing::info!(total_logs = result.total, page, limit, "日志查询成功");
            Json(LogListResponse {
                total_logs: result.total,
                page,
                limit,
                logs: result.logs,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!("查询请求日志失败: {}", e);
            error_response(e.into())
        }
    }
}

/// GET /logs/method
/// 按 method 精确查询，`method` 参数必填
pub async fn get_logs_by_method(
    State(state): State<CollectorState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> impl IntoResponse {
    let method =
        query_pairs(query).and_then(|pairs| MethodQuery::from_pairs(pairs).required_method());
    let method = match method {
        Ok(method) => method,
        Err(e) => {
            tracing::warn!(parameter = "method", "查询参数非法: {}", e);
            return error_response(e);
        }
    };

    match state.service.list_by_method(method.clone()).await {
        Ok(logs) => {
            tracing::info!(method = %method, log_count = logs.len(), "按 method 查询成功");
            Json(MethodLogsResponse { logs }).into_response()
        }
        Err(e) => {
            tracing::error!(method = %method, "按 method 查询失败: {}", e);
            error_response(e.into())
        }
    }
}

/// GET /stats
pub async fn get_stats(State(state): State<CollectorState>) -> impl IntoResponse {
    match state.service.stats().await {
        Ok(stats) => {
            tracing::info!(
                total_requests = stats.total_requests,
                most_used_method = %stats.most_used_method,
                most_accessed_url = %stats.most_accessed_path,
                avg_request_size = stats.avg_request_size_bytes,
                "统计查询成功"
            );
            Json(stats).into_response()
        }
        Err(e) => {
            tracing::error!("获取流量统计失败: {}", e);
            error_response(e.into())
        }
    }
}

/// DELETE /logs
pub async fn clear_logs(State(state): State<CollectorState>) -> impl IntoResponse {
    match state.service.truncate().await {
        Ok(()) => {
            tracing::info!("请求日志已清空");
            Json(MessageResponse::new("Logs cleared")).into_response()
        }
        Err(e) => {
            tracing::error!("清空请求日志失败: {}", e);
            error_response(e.into())
        }
    }
}
