//! # ユースケース層
//!
//! Birthday Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・送信手段・時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `birthday`: 誕生日記録の登録・一覧
//! - `notification`: 単発の誕生日メール送信とテンプレート
//! - `scan`: 日次スキャン

pub mod birthday;
pub mod notification;
pub mod scan;

pub use birthday::{BirthdayUseCaseImpl, CreateBirthdayInput};
pub use notification::{NotificationUseCaseImpl, SendBirthdayEmailInput, TemplateRenderer};
pub use scan::{DEFAULT_PACING, DEFAULT_PACING_MS, ScanOutcome, ScanSummary, ScanUseCaseImpl};
