//! 收集器 API 请求/响应类型

use std::collections::HashMap;

use serde::Serialize;

use super::error::CollectorError;
use super::model::{LogEntry, PageQuery};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// GET /logs 查询参数
///
/// 全部按字符串接收，空字符串视为未提供
#[derive(Debug, Default)]
pub struct LogsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
    pub byte_size: Option<String>,
}

impl LogsQuery {
    /// 从原始查询键值对构造，同名参数取第一个值
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut values = first_values(pairs);
        Self {
            page: values.remove("page"),
            limit: values.remove("limit"),
            method: values.remove("method"),
            url: values.remove("url"),
            status: values.remove("status"),
            byte_size: values.remove("byte_size"),
        }
    }

    /// 转换为存储层过滤器
    ///
    /// 非法的 page/limit 回退为默认值；非法的 status/byte_size 返回校验错误
    pub fn into_page_query(self) -> Result<PageQuery, CollectorError> {
        let page = parse_positive(non_empty(self.page), "page", DEFAULT_PAGE);
        let limit = parse_positive(non_empty(self.limit), "limit", DEFAULT_LIMIT);

        let status_code = non_empty(self.status)
            .map(|s| {
                s.parse::<u16>().map_err(|_| {
                    CollectorError::Validation(format!("Invalid status parameter: {}", s))
                })
            })
            .transpose()?;
        let request_size_bytes = non_empty(self.byte_size)
            .map(|s| {
                s.parse::<u64>().map_err(|_| {
                    CollectorError::Validation(format!("Invalid byte_size parameter: {}", s))
                })
            })
            .transpose()?;

        Ok(PageQuery {
            method: non_empty(self.method),
            path: non_empty(self.url),
            status_code,
            request_size_bytes,
            page,
            limit,
        })
    }
}

/// GET /logs/method 查询参数
#[derive(Debug, Default)]
pub struct MethodQuery {
    pub method: Option<String>,
}

impl MethodQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            method: first_values(pairs).remove("method"),
        }
    }

    pub fn required_method(self) -> Result<String, CollectorError> {
        non_empty(self.method).ok_or_else(|| {
            CollectorError::Validation("Method query parameter is required".to_string())
        })
    }
}

fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (key, value) in pairs {
        values.entry(key).or_insert(value);
    }
    values
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_positive(value: Option<String>, name: &str, default: u32) -> u32 {
    match value {
        None => default,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                tracing::warn!(parameter = name, provided = %raw, default, "分页参数非法，使用默认值");
                default
            }
        },
    }
}

/// 通用消息响应
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// GET /logs 分页响应
#[derive(Debug, Serialize)]
pub struct LogListResponse {
    pub total_logs: u64,
    pub page: u32,
    pub limit: u32,
    pub logs: Vec<LogEntry>,
}

/// GET /logs/method 响应
#[derive(Debug, Serialize)]
pub struct MethodLogsResponse {
    pub logs: Vec<LogEntry>,
}

/// 错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                error_type: error_type.into(),
                message: message.into(),
            },
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request_error", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}
