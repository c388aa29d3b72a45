//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。各 trait は外部システム
//! （作業キュー、イベントバス、RCA 関数、時計）へのインターフェースで、
//! 実装の詳細を隠蔽する。開発用の実装は `impls` にある。

pub mod clock;
pub mod event_bus;
pub mod rca;
pub mod work_queue;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_bus::{BusRecord, EventTransport, TransportConnector};
pub use self::rca::RcaInvoker;
pub use self::work_queue::{QueueAddress, QueueMessage, ReceiveOptions, WorkQueue};
