//! 流量生成器
//!
//! 按配置的速率并发发送随机变体的 HTTP 请求

pub mod dispatcher;
pub mod journal;
pub mod variant;

pub use dispatcher::{DispatchRun, DispatchSummary, Dispatcher};
pub use journal::RequestJournal;
pub use variant::RequestVariant;
