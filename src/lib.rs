//! 合成流量测试工具
//!
//! - `generator`: 按速率并发发送随机 HTTP 请求
//! - `collector`: 记录入站请求并提供查询/统计 API

pub mod collector;
pub mod generator;
pub mod http_client;
pub mod model;
pub mod server;
