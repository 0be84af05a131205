use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use traffic_harness::collector::{CollectorService, SqliteLogStore, create_collector_router};
use traffic_harness::generator::{DispatchRun, Dispatcher, RequestJournal};
use traffic_harness::http_client::build_client;
use traffic_harness::model::config::{CollectorConfig, GeneratorConfig};
use traffic_harness::server::{serve_with_grace, shutdown_signal};

#[derive(Parser, Debug)]
#[command(name = "traffic-harness", version, about = "合成流量生成器与收集器")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 按配置的速率发送请求，全部完成后退出
    Generator {
        /// 配置文件路径
        #[arg(short, long, default_value = GeneratorConfig::default_config_path())]
        config: String,

        /// 请求日志文件路径（启动时清空）
        #[arg(long, default_value = "log.txt")]
        journal: String,

        /// 单次请求超时（秒）
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// 启动收集器 HTTP 服务
    Collector {
        /// 配置文件路径
        #[arg(short, long, default_value = CollectorConfig::default_config_path())]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Generator {
            config,
            journal,
            timeout_secs,
        } => run_generator(&config, &journal, Duration::from_secs(timeout_secs)).await,
        Command::Collector { config } => run_collector(&config).await,
    }
}

async fn run_generator(
    config_path: &str,
    journal_path: &str,
    timeout: Duration,
) -> anyhow::Result<()> {
    let journal = RequestJournal::create(journal_path)
        .await
        .with_context(|| format!("清空请求日志文件失败: {}", journal_path))?;
    let config = GeneratorConfig::load(config_path)?;
    let client = build_client(timeout)?;

    tracing::info!(
        count = config.api_count,
        interval_ms = config.interval.as_millis() as u64,
        url = %config.collector_url,
        "流量生成器启动"
    );

    let dispatcher = Dispatcher::new(client).with_journal(Arc::new(journal));
    let summary = dispatcher
        .run(&DispatchRun {
            count: config.api_count,
            interval: config.interval,
            target_url: config.collector_url,
        })
        .await;

    println!(
        "Total time taken: {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );
    tracing::info!("流量生成器已结束");
    Ok(())
}

async fn run_collector(config_path: &str) -> anyhow::Result<()> {
    let config = CollectorConfig::load(config_path)?;

    let store = SqliteLogStore::open(&config.database.path)
        .with_context(|| format!("打开数据库失败: {}", config.database.path))?;
    tracing::info!(path = %config.database.path, "数据库已就绪");

    let service = Arc::new(CollectorService::new(Arc::new(store)));
    let app = create_collector_router(service);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {}", addr))?;
    tracing::info!(address = %addr, "流量收集器已启动");

    serve_with_grace(listener, app, shutdown_signal(), config.shutdown_grace()).await
}
