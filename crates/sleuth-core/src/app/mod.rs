//! App - アプリケーション層
//!
//! ports を組み合わせてワーカーのロジックを実装する。
//!
//! # 主要コンポーネント
//! - **QueueConsumer**: poll ループ（receive→decode→handle→delete）
//! - **RcaTaskHandler**: ContextBuilt → RCA → RootCauseProposed
//! - **EventPublisher**: 遅延接続 + 同期 flush の publish
//! - **Shutdown**: signal 駆動の協調的停止
//! - **WorkerBuilder / Worker**: 構築・ワイヤリングと実行

pub mod builder;
pub mod consumer;
pub mod handler;
pub mod publisher;
pub mod shutdown;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, Worker, WorkerBuilder};
pub use self::consumer::{ConsumerConfig, MessageOutcome, QueueConsumer};
pub use self::handler::{Handler, RcaTaskHandler};
pub use self::publisher::EventPublisher;
pub use self::shutdown::{ShutdownController, ShutdownToken, install_signal_handlers};
pub use self::status::ConsumerStats;
