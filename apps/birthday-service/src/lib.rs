//! # Birthday Service ライブラリ
//!
//! Birthday Service の設定・ユースケース・ハンドラを公開する。
//! 結合テストからルーターを組み立てるために使う。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
