//! # リポジトリ実装
//!
//! 誕生日記録の永続化を担当するリポジトリを提供する。
//!
//! ## 設計方針
//!
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod birthday_repository;

pub use birthday_repository::{BirthdayRepository, PostgresBirthdayRepository};
