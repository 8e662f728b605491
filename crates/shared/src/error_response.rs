//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス `{ "error": "..." }` を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービス側の責務（shared に axum 依存を入れない）
//! - 固定メッセージは便利コンストラクタで提供し、文言の揺れを防ぐ

use serde::{Deserialize, Serialize};

/// エラーレスポンス
///
/// フロントエンドは `error` フィールドの文字列をそのまま表示する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
   pub error: String,
}

impl ErrorResponse {
   /// 任意のメッセージでエラーレスポンスを作成する
   pub fn new(message: impl Into<String>) -> Self {
      Self {
         error: message.into(),
      }
   }

   /// メール送信基盤が未設定
   pub fn not_configured() -> Self {
      Self::new("Email service not configured")
   }

   /// 500 Internal Server Error
   ///
   /// 内部情報を漏らさないため固定文言。
   pub fn internal_error() -> Self {
      Self::new("Internal server error")
   }
}
