//! # 日次スキャンハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /scan` - 今日が誕生日の未送信記録に通知メールを送信
//!
//! 外部スケジューラから 1 日 1 回呼ばれることを想定する。
//!
//! ## レスポンス例
//!
//! ```json
//! {
//!   "message": "Processed 2 birthdays",
//!   "total": 2,
//!   "successful": 1,
//!   "failed": 1,
//!   "skipped": 0,
//!   "details": {
//!     "successful": [{ "id": "...", "birthday": "Hanako" }],
//!     "failed": [{ "id": "...", "birthday": "Taro", "error": "..." }],
//!     "skipped": []
//!   }
//! }
//! ```
//!
//! 対象がない場合は `{ "message": "No birthdays today" }` のみを返す。

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    usecase::scan::{ScanOutcome, ScanSummary, ScanUseCaseImpl},
};

/// 日次スキャン API の共有状態
pub struct ScanState {
    pub usecase: ScanUseCaseImpl,
}

// --- レスポンス型 ---

/// 対象がない場合のレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 日次スキャンの集計レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponse {
    pub message:    String,
    pub total:      usize,
    pub successful: usize,
    pub failed:     usize,
    pub skipped:    usize,
    pub details:    ScanDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanDetails {
    pub successful: Vec<SentDto>,
    pub failed:     Vec<FailedDto>,
    pub skipped:    Vec<SkippedDto>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SentDto {
    pub id:       Uuid,
    pub birthday: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FailedDto {
    pub id:       Uuid,
    pub birthday: String,
    pub error:    String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SkippedDto {
    pub id:       Uuid,
    pub birthday: String,
    pub reason:   String,
}

impl From<&ScanSummary> for ScanResponse {
    fn from(summary: &ScanSummary) -> Self {
        let mut details = ScanDetails {
            successful: Vec::new(),
            failed:     Vec::new(),
            skipped:    Vec::new(),
        };

        for outcome in &summary.outcomes {
            let id = *outcome.id().as_uuid();
            let birthday = outcome.name().to_string();
            match outcome {
                ScanOutcome::Sent { .. } => details.successful.push(SentDto { id, birthday }),
                ScanOutcome::Failed { reason, .. } => details.failed.push(FailedDto {
                    id,
                    birthday,
                    error: reason.clone(),
                }),
                ScanOutcome::Skipped { reason, .. } => details.skipped.push(SkippedDto {
                    id,
                    birthday,
                    reason: reason.clone(),
                }),
            }
        }

        Self {
            message: format!("Processed {} birthdays", summary.total),
            total: summary.total,
            successful: details.successful.len(),
            failed: details.failed.len(),
            skipped: details.skipped.len(),
            details,
        }
    }
}

// --- ハンドラ ---

/// GET /scan
///
/// ## レスポンス
///
/// - `200 OK`: 集計結果（対象なしの場合はメッセージのみ）
/// - `409 Conflict`: スキャンが実行中
/// - `500 Internal Server Error`: 記録の取得に失敗、または送信基盤が未構成
///
/// スキャンは独立したタスクで実行するため、クライアントが応答を待たずに
/// 切断しても対象の記録はすべて処理される。
#[tracing::instrument(skip_all)]
pub async fn run_daily_scan(
    State(state): State<Arc<ScanState>>,
) -> Result<Response, ServiceError> {
    // リクエストが途中で切断されてもバッチは最後まで処理する
    let summary = tokio::spawn(async move { state.usecase.run_daily_scan().await })
        .await
        .map_err(|e| ServiceError::Internal(format!("日次スキャンのタスクが異常終了: {e}")))??;

    if summary.is_empty() {
        return Ok(Json(MessageResponse {
            message: "No birthdays today".to_string(),
        })
        .into_response());
    }

    Ok(Json(ScanResponse::from(&summary)).into_response())
}
