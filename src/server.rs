//! HTTP 服务启动与优雅退出

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// 运行服务直到 `shutdown` 完成
///
/// 收到退出信号后不再接受新连接，在途请求最多再处理 `grace` 时长，超时后强制退出
pub async fn serve_with_grace<S>(
    listener: TcpListener,
    app: Router,
    shutdown: S,
    grace: Duration,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let stop = Arc::new(Notify::new());
    let stop_signal = stop.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop_signal.notified().await })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result?;
            return Ok(());
        }
        _ = shutdown => {
            tracing::info!(grace_secs = grace.as_secs_f64(), "收到退出信号，等待在途请求完成");
            // notify_one 会保留许可，即使服务端尚未开始等待
            stop.notify_one();
        }
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result?;
            tracing::info!("服务已优雅退出");
        }
        Err(_) => {
            tracing::warn!("在途请求未在宽限期内完成，强制退出");
        }
    }
    Ok(())
}

/// 等待 SIGINT / SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("监听 Ctrl+C 失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("监听 SIGTERM 失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::time::Instant;
    use tokio::sync::oneshot;

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        (listener, addr)
    }

    #[tokio::test]
    async fn test_shutdown_lets_in_flight_request_finish() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "done"
            }),
        );
        let (listener, addr) = bind().await;
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_with_grace(
            listener,
            app,
            async move {
                let _ = rx.await;
            },
            Duration::from_secs(5),
        ));

        let request = tokio::spawn(async move {
            reqwest::get(format!("{}/slow", addr)).await.unwrap().text().await.unwrap()
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        assert_eq!(request.await.unwrap(), "done");
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_grace_is_bounded() {
        let app = Router::new().route(
            "/hang",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "never"
            }),
        );
        let (listener, addr) = bind().await;
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_with_grace(
            listener,
            app,
            async move {
                let _ = rx.await;
            },
            Duration::from_millis(200),
        ));

        let _request = tokio::spawn(async move { reqwest::get(format!("{}/hang", addr)).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let start = Instant::now();
        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
