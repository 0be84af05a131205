//! 收集器 API 路由

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get},
};

use super::handlers::{clear_logs, collect, get_logs, get_logs_by_method, get_stats, welcome};
use super::service::CollectorService;

/// 收集器 API 状态
#[derive(Clone)]
pub struct CollectorState {
    pub service: Arc<CollectorService>,
}

/// 创建收集器路由
///
/// # 端点
/// - `GET /` - 欢迎信息
/// - `ANY /collect` - 记录入站请求
/// - `GET /logs` - 过滤 + 分页查询
/// - `DELETE /logs` - 清空日志
/// - `GET /logs/method` - 按 method 查询
/// - `GET /stats` - 流量统计
pub fn create_collector_router(service: Arc<CollectorService>) -> Router {
    let state = CollectorState { service };

    Router::new()
        .route("/", get(welcome))
        .route("/collect", any(collect))
        .route("/logs", get(get_logs).delete(clear_logs))
        .route("/logs/method", get(get_logs_by_method))
        .route("/stats", get(get_stats))
        .with_state(state)
}
