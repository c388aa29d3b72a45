//! Domain identifiers (strongly-typed IDs).
//!
//! 外部から届く識別子（tenant / incident）とキューが払い出す識別子
//! （message id / receipt handle）はすべて文字列ですが、取り違えを型で防ぐために
//! Phantom type パターンで包みます。
//!
//! ## Phantom Type パターン
//! `Id<T>` は共通実装を提供し、`T` は実行時には使わないマーカー型です。
//! `TenantId` と `IncidentId` は同じ `String` を持っていても混同できません。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// エラーメッセージで使うフィールド名（例: "tenant_id"）
    fn field() -> &'static str;
}

/// 空文字列の ID を拒否したときのエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be a non-blank string")]
pub struct BlankIdError {
    pub field: &'static str,
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let tenant = TenantId::parse("t1")?;
/// let incident = IncidentId::parse("inc-42")?;
/// // tenant と incident は異なる型なので、混同できない
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// 検証付きで作成（空白のみの文字列は拒否）
    pub fn parse(value: impl Into<String>) -> Result<Self, BlankIdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(BlankIdError { field: T::field() });
        }
        Ok(Self::new(value))
    }

    /// 検証なしで作成
    ///
    /// キューが払い出した値やメッセージ本文から読んだ値に使う。
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // 空文字列もそのまま受け取る（欠落だけが decode エラー）
        String::deserialize(deserializer).map(Self::new)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tenant {}

impl IdMarker for Tenant {
    fn field() -> &'static str {
        "tenant_id"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Incident {}

impl IdMarker for Incident {
    fn field() -> &'static str {
        "incident_id"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Message {}

impl IdMarker for Message {
    fn field() -> &'static str {
        "message_id"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Receipt {}

impl IdMarker for Receipt {
    fn field() -> &'static str {
        "receipt_handle"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of the tenant that owns an incident.
pub type TenantId = Id<Tenant>;

/// Identifier of an incident (also the event-bus partition key).
pub type IncidentId = Id<Incident>;

/// Opaque identifier assigned by the work queue to one message.
pub type MessageId = Id<Message>;

/// Per-delivery acknowledgement token; valid until the visibility timeout expires.
pub type ReceiptHandle = Id<Receipt>;
