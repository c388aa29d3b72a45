//! RcaInvoker port - 外部の root-cause analysis 関数
//!
//! 中身は見えない遠隔呼び出しとして扱う。タイムアウトは呼び出し先の責任で、
//! こちらからは打ち切らない。

use async_trait::async_trait;

use crate::domain::errors::RcaError;
use crate::domain::rca::{RcaRequest, RcaResult};

#[async_trait]
pub trait RcaInvoker: Send + Sync {
    async fn run_rca(&self, request: RcaRequest) -> Result<RcaResult, RcaError>;
}
