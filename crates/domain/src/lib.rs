//! # HBD Reminder ドメイン層
//!
//! 誕生日記録と通知に関するドメインモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! service → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層（DB、メール送信）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`birthday`] - 誕生日エンティティと月日マッチング
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメインエラー
//! - [`notification`] - メール通知のドメインモデル
//! - [`value_objects`] - 名前・メールアドレスなどの値オブジェクト
//!
//! ## 使用例
//!
//! ```rust
//! use hbd_domain::{DomainError, value_objects::PersonName};
//!
//! let name = PersonName::new("山田花子").unwrap();
//! assert_eq!(name.as_str(), "山田花子");
//!
//! let error = PersonName::new("  ").unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! ```

#[macro_use]
mod macros;

pub mod birthday;
pub mod clock;
pub mod error;
pub mod notification;
pub mod value_objects;

pub use error::DomainError;
