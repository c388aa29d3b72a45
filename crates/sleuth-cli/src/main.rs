use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sleuth_core::app::{ConsumerConfig, WorkerBuilder};
use sleuth_core::domain::constants::{RCA_TASKS_QUEUE, TIMELINE_TOPIC};
use sleuth_core::domain::timeline::AgentMeta;
use sleuth_core::impls::{HttpRcaInvoker, InMemoryWorkQueue, JsonLinesEventBus, RedrivePolicy};
use sleuth_core::observability::{LogFormat, init_logging};

/// sleuth：RCA タスクを処理して RootCauseProposed を timeline に publish する
#[derive(Debug, Parser)]
#[command(name = "sleuth")]
#[command(about = "Consumes RCA tasks and publishes root-cause hypotheses")]
#[command(version)]
struct Args {
    /// 購読する作業キュー名
    #[arg(long, env = "RCA_QUEUE", default_value = RCA_TASKS_QUEUE)]
    queue_name: String,

    /// long poll の待ち時間（秒）
    #[arg(long, env = "SQS_WAIT_TIME_SECONDS", default_value = "5")]
    wait_time_secs: u64,

    /// 1 回の receive で受け取る最大件数
    #[arg(long, env = "SQS_MAX_MESSAGES", default_value = "10")]
    max_messages: usize,

    #[arg(long, env = "SQS_VISIBILITY_TIMEOUT_SECONDS", default_value = "30")]
    visibility_timeout_secs: u64,

    /// これを超えて受信された message は dead letter に移す
    #[arg(long, env = "SQS_MAX_RECEIVE_COUNT")]
    max_receive_count: Option<u32>,

    /// 起動時にキューへ投入する JSON-lines ファイル（1 行 = 1 message）
    #[arg(long, env = "RCA_SEED_FILE")]
    seed: Option<PathBuf>,

    #[arg(long, env = "TIMELINE_TOPIC", default_value = TIMELINE_TOPIC)]
    topic: String,

    /// timeline イベントの追記先
    #[arg(long, env = "TIMELINE_EVENTS_PATH", default_value = "timeline.jsonl")]
    events_out: PathBuf,

    /// RCA 関数の URL
    #[arg(long, env = "RCA_ENDPOINT")]
    rca_endpoint: String,

    #[arg(long, env = "RCA_API_TOKEN", hide_env_values = true)]
    rca_token: Option<String>,

    /// 設定すると timeline イベントに agent を付ける
    #[arg(long, env = "RCA_AGENT_NAME")]
    agent_name: Option<String>,

    /// `json` or `pretty`
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_format);

    // (A) 作業キュー（開発用の in-memory）
    let queue = Arc::new(InMemoryWorkQueue::new(Duration::from_secs(
        args.visibility_timeout_secs,
    )));
    match args.max_receive_count {
        Some(max_receive_count) => {
            queue
                .create_queue_with_redrive(&args.queue_name, RedrivePolicy { max_receive_count })
                .await;
        }
        None => queue.create_queue(&args.queue_name).await,
    }
    if let Some(path) = args.seed.as_deref() {
        let seeded = seed_queue(&queue, &args.queue_name, path).await?;
        tracing::info!(queue = %args.queue_name, seeded, "seeded work queue");
    }

    // (B) RCA 関数とイベントバス
    let mut rca = HttpRcaInvoker::new(&args.rca_endpoint);
    if let Some(token) = args.rca_token {
        rca = rca.with_api_token(token);
    }
    let bus = JsonLinesEventBus::new(&args.events_out);

    // (C) ワイヤリング（設定ミスはここで落とす）
    let mut builder = WorkerBuilder::new()
        .work_queue(queue)
        .rca_invoker(Arc::new(rca))
        .event_bus(Arc::new(bus))
        .topic(args.topic)
        .consumer_config(ConsumerConfig {
            wait_time: Duration::from_secs(args.wait_time_secs),
            max_messages: args.max_messages,
        });
    if let Some(name) = args.agent_name {
        builder = builder.agent(AgentMeta {
            name,
            version: env!("CARGO_PKG_VERSION").to_string(),
        });
    }
    let worker = builder.build().context("invalid worker configuration")?;

    // (D) SIGTERM / SIGINT まで処理
    tracing::info!(
        queue = %args.queue_name,
        rca_endpoint = %args.rca_endpoint,
        events_out = %args.events_out.display(),
        "starting rca worker"
    );
    let stats = worker
        .run_until_signal(&args.queue_name)
        .await
        .context("rca worker failed")?;

    tracing::info!(stats = %serde_json::to_string(&stats)?, "rca worker exited");
    Ok(())
}

/// 空行を除いた各行を 1 message として投入する
async fn seed_queue(
    queue: &InMemoryWorkQueue,
    queue_name: &str,
    path: &Path,
) -> anyhow::Result<usize> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;

    let mut seeded = 0;
    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        queue.send_message(queue_name, line).await?;
        seeded += 1;
    }
    Ok(seeded)
}
