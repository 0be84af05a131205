//! 流量收集器
//!
//! 接收入站请求元数据、持久化存储，并提供过滤/分页/统计查询

pub mod error;
pub mod model;
pub mod service;
pub mod store;
pub mod types;
mod handlers;
mod router;

pub use error::{CollectorError, StoreError};
pub use router::create_collector_router;
pub use service::CollectorService;
pub use store::{LogStore, SqliteLogStore};
