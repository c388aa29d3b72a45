//! sleuth-core
//!
//! Core building blocks for the Sleuth RCA worker.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task_event, timeline, rca, prompts, idempotency, errors）
//! - **ports**: 抽象化レイヤー（WorkQueue, EventTransport, RcaInvoker, Clock）
//! - **app**: アプリケーションロジック（consumer, handler, publisher, shutdown, builder）
//! - **impls**: 実装（InMemoryWorkQueue, InMemoryEventBus, JsonLinesEventBus, HttpRcaInvoker）
//! - **observability**: tracing の初期化と span

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
pub mod observability;
