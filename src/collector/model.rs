//! 请求日志数据模型

use serde::{Deserialize, Serialize};

/// 收集器观察到的单条入站请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub method: String,
    #[serde(rename = "url")]
    pub path: String,
    pub status_code: u16,
    #[serde(rename = "request_size")]
    pub request_size_bytes: u64,
}

impl LogEntry {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        status_code: u16,
        request_size_bytes: u64,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status_code,
            request_size_bytes,
        }
    }
}

/// 分页查询过滤器
///
/// 所有过滤字段按 AND 组合；`page`/`limit` 由路由层保证为正数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub method: Option<String>,
    pub path: Option<String>,
    pub status_code: Option<u16>,
    pub request_size_bytes: Option<u64>,
    pub page: u32,
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            method: None,
            path: None,
            status_code: None,
            request_size_bytes: None,
            page: 1,
            limit: 10,
        }
    }
}

impl PageQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// 一页结果及过滤后的总数
///
/// `total` 与 `logs` 来自两次独立查询，并发写入时可能不完全一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPage {
    pub logs: Vec<LogEntry>,
    pub total: u64,
}

/// 流量统计，每次查询时从全部日志重新计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficStats {
    pub total_requests: u64,
    pub most_used_method: String,
    #[serde(rename = "most_accessed_url")]
    pub most_accessed_path: String,
    #[serde(rename = "avg_request_size")]
    pub avg_request_size_bytes: f64,
}

impl TrafficStats {
    pub fn empty() -> Self {
        Self {
            total_requests: 0,
            most_used_method: String::new(),
            most_accessed_path: String::new(),
            avg_request_size_bytes: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_wire_format() {
        let entry = LogEntry::new("POST", "/x", 200, 42);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"method": "POST", "url": "/x", "status_code": 200, "request_size": 42})
        );
    }

    #[test]
    fn test_stats_wire_format() {
        let json = serde_json::to_value(TrafficStats::empty()).unwrap();
        assert_eq!(json["total_requests"], 0);
        assert_eq!(json["most_used_method"], "");
        assert_eq!(json["most_accessed_url"], "");
        assert_eq!(json["avg_request_size"], 0.0);
    }

    #[test]
    fn test_page_offset() {
        let query = PageQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
        assert_eq!(PageQuery::default().offset(), 0);
    }
}
