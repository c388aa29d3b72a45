//! Shutdown - 協調的な停止
//!
//! `running` フラグを `watch` チャネルで表現する。
//! - `ShutdownController::stop()` でフラグを倒す（signal ハンドラから呼ばれる）
//! - `ShutdownToken::is_stopped()` はループ先頭で 1 回だけ読む
//!
//! in-flight の receive / handler を中断することはしない。停止が効くのは
//! 次のイテレーションの先頭から。

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 停止要求を出す側
#[derive(Debug)]
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// 停止要求を読む側（clone して複数の consumer に配れる）
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown. Returns `true` if this call flipped the flag.
    pub fn stop(&self) -> bool {
        // send_replace works even when no token is alive
        !self.tx.send_replace(true)
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownToken {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }
}

/// SIGTERM / SIGINT を受けたら停止要求を出すタスクを起動する。
///
/// 登録はこの関数の中で同期的に済ませるので、戻った時点で signal は捕捉される。
#[cfg(unix)]
pub fn install_signal_handlers(
    controller: ShutdownController,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = terminate.recv() => "SIGTERM",
                _ = interrupt.recv() => "SIGINT",
            };
            if controller.stop() {
                tracing::info!(signal = name, "received signal, shutting down consumer");
            } else {
                tracing::info!(signal = name, "received signal, shutdown already in progress");
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn install_signal_handlers(
    controller: ShutdownController,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if controller.stop() {
                tracing::info!(signal = "ctrl-c", "received signal, shutting down consumer");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_visible_to_existing_and_new_tokens() {
        let controller = ShutdownController::new();
        let before = controller.token();
        assert!(!before.is_stopped());

        assert!(controller.stop());
        assert!(before.is_stopped());
        assert!(controller.token().is_stopped());
        assert!(controller.is_stopped());
    }

    #[test]
    fn test_second_stop_reports_no_transition() {
        let controller = ShutdownController::new();
        assert!(controller.stop());
        assert!(!controller.stop());
    }

    #[test]
    fn test_stop_without_tokens_does_not_fail() {
        let controller = ShutdownController::new();
        assert!(controller.stop());
        assert!(controller.is_stopped());
    }
}
