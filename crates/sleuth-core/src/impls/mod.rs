//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryWorkQueue**: 開発用の作業キュー（visibility timeout / redrive 付き）
//! - **InMemoryEventBus**: テスト用のイベントバス
//! - **JsonLinesEventBus**: ファイル追記型のイベントバス
//! - **HttpRcaInvoker**: HTTP 越しの RCA 関数呼び出し
//!
//! # 本番用実装
//! SQS / Kafka のアダプタは別クレートに配置する想定。
//! ports の trait を実装すれば WorkerBuilder にそのまま渡せる。

pub mod http_rca;
pub mod inmem_bus;
pub mod inmem_queue;
pub mod jsonl_bus;

// 主要な型を再エクスポート
pub use self::http_rca::HttpRcaInvoker;
pub use self::inmem_bus::InMemoryEventBus;
pub use self::inmem_queue::{InMemoryWorkQueue, QueueStats, RedrivePolicy};
pub use self::jsonl_bus::JsonLinesEventBus;
