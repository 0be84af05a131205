use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 单次运行允许的最大请求数
pub const MAX_API_COUNT: u32 = 8192;

/// 流量生成器配置
///
/// 由 `config.yaml` 中的扁平键值对解析而来：
/// - `NO_OF_API`: 请求总数，取值 (0, 8192]
/// - `API_RATE`: 发起速率，格式 `<数量>/<s|m|h>`
/// - `COLLECTOR_URL`: 收集器地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub api_count: u32,
    /// 两次派发之间的间隔
    pub interval: Duration,
    pub collector_url: String,
}

impl GeneratorConfig {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.yaml"
    }

    /// 从 YAML 文件加载配置，文件不存在时直接报错
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(&content).context("解析配置文件失败")?;

        let raw: BTreeMap<String, String> = raw
            .into_iter()
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key, v)))
            .collect();
        Self::parse(&raw)
    }

    /// 校验原始键值对并转换为配置
    pub fn parse(raw: &BTreeMap<String, String>) -> anyhow::Result<Self> {
        let api_count = raw
            .get("NO_OF_API")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|n| (1..=MAX_API_COUNT).contains(n))
            .ok_or_else(|| anyhow::anyhow!("invalid NO_OF_API value"))?;

        let interval = parse_rate(raw.get("API_RATE").map(String::as_str).unwrap_or(""))?;

        let collector_url = match raw.get("COLLECTOR_URL") {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => anyhow::bail!("COLLECTOR_URL not set"),
        };

        Ok(Self {
            api_count,
            interval,
            collector_url,
        })
    }
}

/// 将 `5/s`、`100/m`、`3000/h` 形式的速率转换为派发间隔
pub fn parse_rate(rate: &str) -> anyhow::Result<Duration> {
    const FORMAT_ERROR: &str = "invalid API_RATE format, use '2/s', '100/m', or '3000/h'";

    let (count, unit) = rate
        .split_once('/')
        .ok_or_else(|| anyhow::anyhow!(FORMAT_ERROR))?;
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        anyhow::bail!(FORMAT_ERROR);
    }

    let unit = match unit.to_ascii_lowercase().as_str() {
        "s" => Duration::from_secs(1),
        "m" => Duration::from_secs(60),
        "h" => Duration::from_secs(60 * 60),
        _ => anyhow::bail!(FORMAT_ERROR),
    };

    let count: u32 = count
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid API_RATE value"))?;
    // 速率过高时间隔会截断为 0
    let interval = unit.checked_div(count).unwrap_or_default();
    if interval.is_zero() {
        anyhow::bail!("invalid API_RATE value");
    }
    Ok(interval)
}

/// YAML 中的数字和字符串都按字符串处理
fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 收集器 HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    /// 收到退出信号后等待在途请求完成的最长时间（秒）
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

/// 收集器存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// 流量收集器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

fn default_db_path() -> String {
    "traffic_stats.db".to_string()
}

impl CollectorConfig {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "collector.yaml"
    }

    /// 从 YAML 文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: CollectorConfig =
            serde_yaml::from_str(content).context("解析配置文件失败")?;
        if config.server.port == 0 {
            anyhow::bail!("server.port must be specified");
        }
        if config.database.path.trim().is_empty() {
            anyhow::bail!("database.path must not be empty");
        }
        Ok(config)
    }

    /// 监听地址
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn raw(count: &str, rate: &str, url: Option<&str>) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("NO_OF_API".to_string(), count.to_string());
        map.insert("API_RATE".to_string(), rate.to_string());
        if let Some(url) = url {
            map.insert("COLLECTOR_URL".to_string(), url.to_string());
        }
        map
    }

    #[test]
    fn test_parse_valid_config() {
        let raw = raw("10", "5/s", Some("http://collector:8080/collect"));
        let config = GeneratorConfig::parse(&raw).unwrap();
        assert_eq!(config.api_count, 10);
        assert_eq!(config.interval, Duration::from_millis(200));
        assert_eq!(config.collector_url, "http://collector:8080/collect");
    }

    #[test]
    fn test_parse_rate_units() {
        assert_eq!(parse_rate("10/s").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_rate("100/m").unwrap(), Duration::from_millis(600));
        assert_eq!(parse_rate("3000/H").unwrap(), Duration::from_millis(1200));
    }

    #[test]
    fn test_parse_invalid_api_count() {
        for count in ["-1", "0", "8193", "abc", ""] {
            let err = GeneratorConfig::parse(&raw(count, "5/s", Some("http://x"))).unwrap_err();
            assert!(err.to_string().contains("invalid NO_OF_API value"), "{count}");
        }
        assert!(GeneratorConfig::parse(&raw("8192", "5/s", Some("http://x"))).is_ok());
    }

    #[test]
    fn test_parse_invalid_rate_format() {
        for rate in ["1000x/m", "invalid-rate", "5/d", "/s", "5/", "-5/s"] {
            let err = GeneratorConfig::parse(&raw("10", rate, Some("http://x"))).unwrap_err();
            assert!(err.to_string().contains("invalid API_RATE format"), "{rate}");
        }
    }

    #[test]
    fn test_parse_zero_rate_rejected() {
        let err = GeneratorConfig::parse(&raw("10", "0/s", Some("http://x"))).unwrap_err();
        assert!(err.to_string().contains("invalid API_RATE value"));
    }

    #[test]
    fn test_parse_rate_too_high_rejected() {
        let err = parse_rate("2000000000/s").unwrap_err();
        assert!(err.to_string().contains("invalid API_RATE value"));
        assert_eq!(parse_rate("1000000000/s").unwrap(), Duration::from_nanos(1));
    }

    #[test]
    fn test_parse_missing_collector_url() {
        let err = GeneratorConfig::parse(&raw("10", "5/s", None)).unwrap_err();
        assert!(err.to_string().contains("COLLECTOR_URL not set"));

        let err = GeneratorConfig::parse(&raw("10", "5/s", Some(""))).unwrap_err();
        assert!(err.to_string().contains("COLLECTOR_URL not set"));
    }

    #[test]
    fn test_load_generator_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "NO_OF_API: 5\nAPI_RATE: \"5/s\"\nCOLLECTOR_URL: \"http://x\""
        )
        .unwrap();

        let config = GeneratorConfig::load(file.path()).unwrap();
        assert_eq!(config.api_count, 5);
        assert_eq!(config.interval, Duration::from_millis(200));
        assert_eq!(config.collector_url, "http://x");
    }

    #[test]
    fn test_load_generator_config_missing_file() {
        assert!(GeneratorConfig::load("/nonexistent/config.yaml").is_err());
    }

    #[test]
    fn test_collector_config_defaults() {
        let config = CollectorConfig::from_yaml("server:\n  port: 8080\n").unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.database.path, "traffic_stats.db");
    }

    #[test]
    fn test_collector_config_requires_port() {
        assert!(CollectorConfig::from_yaml("server:\n  host: 127.0.0.1\n").is_err());
        assert!(CollectorConfig::from_yaml("server:\n  port: 0\n").is_err());
    }
}
