//! 限速并发派发器
//!
//! 派发循环是单线程的：每启动一个派发单元就休眠一个间隔，
//! 限制的是启动速率而不是响应速率。全部单元启动后等待它们全部结束。

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::task::JoinSet;

use super::journal::{JournalRecord, RequestJournal};
use super::variant::RequestVariant;

/// 一次派发运行的参数
#[derive(Debug, Clone)]
pub struct DispatchRun {
    pub count: u32,
    pub interval: Duration,
    pub target_url: String,
}

/// 派发结果汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub elapsed: Duration,
    pub spawned: u32,
    /// 收到了响应（任意状态码）的单元数
    pub succeeded: u32,
    /// 传输失败或任务异常退出的单元数
    pub failed: u32,
}

impl DispatchSummary {
    pub fn completed(&self) -> u32 {
        self.succeeded + self.failed
    }
}

/// 派发器
pub struct Dispatcher {
    client: Client,
    journal: Option<Arc<RequestJournal>>,
}

impl Dispatcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Arc<RequestJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// 执行派发，返回耗时与计数
    ///
    /// 没有取消路径：总会等到全部 `count` 个单元结束
    pub async fn run(&self, run: &DispatchRun) -> DispatchSummary {
        let start = Instant::now();
        let target: Arc<str> = Arc::from(run.target_url.as_str());
        let mut units = JoinSet::new();
        let mut spawned = 0;

        for i in 0..run.count {
            let client = self.client.clone();
            let target = target.clone();
            let journal = self.journal.clone();
            units.spawn(async move { dispatch_unit(i, client, target, journal).await });
            spawned += 1;
            tokio::time::sleep(run.interval).await;
        }

        let mut succeeded = 0;
        let mut failed = 0;
        while let Some(result) = units.join_next().await {
            match result {
                Ok(true) => succeeded += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::error!("派发单元异常退出: {}", e);
                    failed += 1;
                }
            }
        }

        let summary = DispatchSummary {
            elapsed: start.elapsed(),
            spawned,
            succeeded,
            failed,
        };
        tracing::info!(
            spawned = summary.spawned,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "派发完成"
        );
        summary
    }
}

/// 单个派发单元：随机选择变体，发送一次请求，不重试
///
/// 返回是否收到响应
async fn dispatch_unit(
    index: u32,
    client: Client,
    target: Arc<str>,
    journal: Option<Arc<RequestJournal>>,
) -> bool {
    let variant = RequestVariant::random();
    let body = variant.body();
    let body_size = body.as_ref().map(Vec::len).unwrap_or(0);

    let mut request = client.request(variant.method(), &*target);
    if let Some(body) = body {
        request = request
            .header("Content-Type", "application/json")
            .body(body);
    }

    match request.send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            tracing::debug!(
                unit = index,
                method = %variant,
                url = %target,
                body_size,
                status,
                "请求已完成"
            );
            if let Some(journal) = journal {
                journal
                    .append_or_warn(&JournalRecord {
                        method: variant.to_string(),
                        url: target.to_string(),
                        body_size,
                        status,
                    })
                    .await;
            }
            true
        }
        Err(e) => {
            tracing::warn!(
                unit = index,
                method = %variant,
                url = %target,
                "请求发送失败: {}",
                e
            );
            false
        }
    }
}
