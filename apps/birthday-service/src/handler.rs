//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置し、親モジュールで re-export する
//! - ハンドラは薄く保ち、ビジネスロジックは usecase 層に委譲する
//! - JSON ボディの解析失敗も `{ "error": "..." }` 形式の 400 として返す
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `birthday`: 誕生日記録の登録・一覧
//! - `notification`: 単発の誕生日メール送信
//! - `scan`: 日次スキャン

pub mod birthday;
pub mod health;
pub mod notification;
pub mod scan;

use std::sync::Arc;

use axum::{
    Router,
    extract::rejection::JsonRejection,
    routing::{get, post},
};
pub use birthday::{BirthdayState, create_birthday, list_birthdays};
pub use health::health_check;
pub use notification::{NotificationState, send_birthday_email};
pub use scan::{ScanState, run_daily_scan};

use crate::error::ServiceError;

/// 全エンドポイントを束ねたルーターを構築する
pub fn router(
    birthday_state: Arc<BirthdayState>,
    notification_state: Arc<NotificationState>,
    scan_state: Arc<ScanState>,
) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/birthdays", get(list_birthdays).post(create_birthday))
                .with_state(birthday_state),
        )
        .merge(
            Router::new()
                .route("/notify", post(send_birthday_email))
                .with_state(notification_state),
        )
        .merge(
            Router::new()
                .route("/scan", get(run_daily_scan))
                .with_state(scan_state),
        )
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("JSON ボディの解析に失敗: {}", rejection.body_text());
        Self::Validation("Invalid JSON body".to_string())
    }
}
