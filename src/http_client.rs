//! 派发用 HTTP Client
//!
//! 所有派发单元共享同一个 `reqwest::Client`（内部连接池），克隆开销很小

use reqwest::Client;
use std::time::Duration;

/// 生成器发出请求时携带的 User-Agent
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// 构建派发用的 HTTP Client
///
/// `timeout` 覆盖单次请求的整个生命周期；超时计为传输失败，不会重试
pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    if timeout.is_zero() {
        anyhow::bail!("request timeout must be greater than zero");
    }

    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::HeaderMap, routing::get};

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(build_client(Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_user_agent_sent() {
        let app = Router::new().route(
            "/",
            get(|headers: HeaderMap| async move {
                headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = build_client(Duration::from_secs(5)).unwrap();
        let agent = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(agent, USER_AGENT);
    }

    #[tokio::test]
    async fn test_timeout_is_transport_failure() {
        let app = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = build_client(Duration::from_millis(100)).unwrap();
        let err = client.get(format!("http://{}/", addr)).send().await.unwrap_err();
        assert!(err.is_timeout());
    }
}
