//! # Birthday Service エラー定義
//!
//! サービス固有のエラーと、HTTP レスポンス `{ "error": "..." }` への変換を定義する。
//!
//! | バリアント | ステータス | 本文 |
//! |---|---|---|
//! | `Validation` | 400 | 検証メッセージ |
//! | `NotConfigured` | 500 | `Email service not configured` |
//! | `Database` | 500 | 呼び出し元が指定した文言 |
//! | `SendFailed` | 500 | `Failed to send email` |
//! | `ScanInProgress` | 409 | `Scan already in progress` |
//! | `Internal` | 500 | `Internal server error` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hbd_domain::{DomainError, notification::NotificationError};
use hbd_infra::InfraError;
use hbd_shared::{
    ErrorResponse,
    event_log::error::{category, kind},
};
use thiserror::Error;

/// Birthday Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 入力が不正
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// メール送信基盤が未構成
    #[error("メール送信基盤が設定されていません")]
    NotConfigured,

    /// データベースエラー
    ///
    /// `context` はクライアントへ返す文言（例: `"Failed to save birthday"`）。
    #[error("データベースエラー（{context}）: {source}")]
    Database {
        context: &'static str,
        #[source]
        source:  InfraError,
    },

    /// 単発通知の送信失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(#[source] NotificationError),

    /// 日次スキャンが実行中
    #[error("日次スキャンが既に実行中です")]
    ScanInProgress,

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl ServiceError {
    /// InfraError を文脈付きの Database エラーに変換するクロージャを返す
    ///
    /// `repo.find_all().await.map_err(ServiceError::database("Failed to read birthdays"))?`
    pub fn database(context: &'static str) -> impl FnOnce(InfraError) -> Self {
        move |source| Self::Database { context, source }
    }
}

impl From<DomainError> for ServiceError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(msg) => Self::Validation(msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            ServiceError::NotConfigured => {
                tracing::error!("メール送信基盤が設定されていません");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::not_configured(),
                )
            }
            ServiceError::Database { context, source } => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::DATABASE,
                    span_trace = %source.span_trace(),
                    "{}: {}",
                    context,
                    source
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(*context),
                )
            }
            ServiceError::SendFailed(e) => {
                tracing::error!(
                    error.category = category::EXTERNAL_SERVICE,
                    error.kind = kind::MAIL_DELIVERY,
                    "メール送信に失敗: {}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Failed to send email"),
                )
            }
            ServiceError::ScanInProgress => (
                StatusCode::CONFLICT,
                ErrorResponse::new("Scan already in progress"),
            ),
            ServiceError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
