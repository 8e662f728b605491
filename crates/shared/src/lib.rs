//! # HBD Reminder 共有ユーティリティ
//!
//! ワークスペース全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - domain / infra / service のすべてから依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - tracing 系の依存は `observability` feature の背後に置く

pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use error_response::ErrorResponse;
pub use health::HealthResponse;
