//! 请求变体目录
//!
//! 封闭集合 {GET, POST, PUT, DELETE}；POST/PUT 每次调用都生成新的 JSON 负载

use reqwest::Method;
use serde::Serialize;

/// 随机 JSON 负载
#[derive(Debug, Clone, Serialize)]
pub struct RandomPayload {
    pub id: u32,
    pub value: f64,
    pub info: String,
}

impl RandomPayload {
    pub fn generate() -> Self {
        Self {
            id: fastrand::u32(..1000),
            value: fastrand::f64() * 100.0,
            info: format!("RandomInfo{}", fastrand::u32(..100)),
        }
    }
}

/// 请求变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestVariant {
    Get,
    Post,
    Put,
    Delete,
}

impl RequestVariant {
    pub const ALL: [RequestVariant; 4] = [
        RequestVariant::Get,
        RequestVariant::Post,
        RequestVariant::Put,
        RequestVariant::Delete,
    ];

    /// 均匀随机选择一个变体
    pub fn random() -> Self {
        Self::ALL[fastrand::usize(..Self::ALL.len())]
    }

    pub fn method(&self) -> Method {
        match self {
            RequestVariant::Get => Method::GET,
            RequestVariant::Post => Method::POST,
            RequestVariant::Put => Method::PUT,
            RequestVariant::Delete => Method::DELETE,
        }
    }

    /// 构建请求体，GET/DELETE 无请求体
    pub fn body(&self) -> Option<Vec<u8>> {
        match self {
            RequestVariant::Post | RequestVariant::Put => {
                // 纯数据结构序列化不会失败
                serde_json::to_vec(&RandomPayload::generate()).ok()
            }
            RequestVariant::Get | RequestVariant::Delete => None,
        }
    }
}

impl std::fmt::Display for RequestVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method().as_str())
    }
}
