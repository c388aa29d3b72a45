//! Status - consumer の累積カウンタ
//!
//! 運用者がログで状況を追えるように、停止時にまとめて出す。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerStats {
    /// 実行した receive の回数（失敗含む）
    pub polls: u64,
    pub receive_errors: u64,
    pub received: u64,
    /// handler 成功 + delete 成功
    pub acked: u64,
    pub decode_failures: u64,
    pub handler_failures: u64,
    /// handler は成功したが delete に失敗（再配送されうる）
    pub delete_failures: u64,
}

impl ConsumerStats {
    /// まだキューに残っている（再配送候補の）件数
    pub fn left_for_redelivery(&self) -> u64 {
        self.decode_failures + self.handler_failures + self.delete_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_for_redelivery_counts_every_unacked_path() {
        let stats = ConsumerStats {
            received: 6,
            acked: 2,
            decode_failures: 1,
            handler_failures: 2,
            delete_failures: 1,
            ..ConsumerStats::default()
        };
        assert_eq!(stats.left_for_redelivery(), 4);
        assert_eq!(stats.acked + stats.left_for_redelivery(), stats.received);
    }
}
