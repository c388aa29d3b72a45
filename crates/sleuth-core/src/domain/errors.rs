//! Errors - エラー型と分類
//!
//! 各 seam（queue / event bus / RCA / decode / handler / consumer）ごとに
//! thiserror の enum を持ち、`kind()` で運用上の分類 `ErrorKind` に落とす。

use thiserror::Error;

use super::ids::ReceiptHandle;

/// ErrorKind は実行エラーの分類
///
/// - Configuration: 起動時の設定ミス（リトライ無意味、プロセスは非ゼロ終了）
/// - Transient: インフラの一時的な失敗（ログを出してループ継続）
/// - MalformedMessage: メッセージ本文の不備（ack せず再配送に任せる）
/// - Collaborator: RCA 呼び出しの失敗（MalformedMessage と同じ扱い）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transient,
    MalformedMessage,
    Collaborator,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("receipt handle {0} is expired or already used")]
    InvalidReceipt(ReceiptHandle),

    #[error("queue transport error: {0}")]
    Transport(String),
}

impl QueueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::QueueNotFound(_) => ErrorKind::Configuration,
            Self::InvalidReceipt(_) | Self::Transport(_) => ErrorKind::Transient,
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event bus connection failed: {0}")]
    Connect(String),

    #[error("event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("event send failed: {0}")]
    Send(String),

    #[error("event flush failed: {0}")]
    Flush(String),
}

impl PublishError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Transient
    }
}

#[derive(Debug, Error)]
pub enum RcaError {
    #[error("rca collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("rca collaborator returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("rca collaborator returned an invalid result: {0}")]
    InvalidResult(String),
}

impl RcaError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Collaborator
    }
}

#[derive(Debug, Error)]
#[error("message body is not a valid {task_type}: {source}")]
pub struct DecodeError {
    pub task_type: &'static str,
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedMessage
    }
}

/// Handler が返すエラー
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Rca(#[from] RcaError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rca(e) => e.kind(),
            Self::Publish(e) => e.kind(),
        }
    }
}

/// Errors that escape the consumer loop. Per-message errors never do.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("failed to resolve queue '{queue}': {source}")]
    Resolve {
        queue: String,
        #[source]
        source: QueueError,
    },

    #[error("failed to install signal handlers: {0}")]
    SignalSetup(#[source] std::io::Error),
}

impl ConsumerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolve { .. } | Self::SignalSetup(_) => ErrorKind::Configuration,
        }
    }
}
