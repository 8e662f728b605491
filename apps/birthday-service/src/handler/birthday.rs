//! # 誕生日記録ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /birthdays` - 誕生日記録の一覧（新しい順）
//! - `POST /birthdays` - 誕生日記録の登録

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use hbd_domain::birthday::Birthday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    usecase::birthday::{BirthdayUseCaseImpl, CreateBirthdayInput},
};

/// 誕生日記録 API の共有状態
pub struct BirthdayState {
    pub usecase: BirthdayUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 誕生日記録の登録リクエスト
///
/// 必須項目の欠落を検証メッセージで返すため、すべて `Option` で受ける。
#[derive(Debug, Deserialize)]
pub struct CreateBirthdayRequest {
    pub name:     Option<String>,
    pub date:     Option<String>,
    pub email:    Option<String>,
    pub comments: Option<String>,
}

/// 誕生日記録 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BirthdayDto {
    pub id:            Uuid,
    pub name:          String,
    /// `YYYY-MM-DD`
    pub date:          String,
    pub email:         Option<String>,
    pub comments:      Option<String>,
    pub email_sent:    bool,
    pub email_sent_at: Option<String>,
    pub created_at:    String,
}

impl From<&Birthday> for BirthdayDto {
    fn from(birthday: &Birthday) -> Self {
        Self {
            id:            *birthday.id().as_uuid(),
            name:          birthday.name().as_str().to_string(),
            date:          birthday.date().format("%Y-%m-%d").to_string(),
            email:         birthday.email().map(|e| e.as_str().to_string()),
            comments:      birthday.comments().map(|c| c.as_str().to_string()),
            email_sent:    birthday.email_sent(),
            email_sent_at: birthday.email_sent_at().map(|t| t.to_rfc3339()),
            created_at:    birthday.created_at().to_rfc3339(),
        }
    }
}

/// 誕生日記録の登録レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBirthdayResponse {
    pub message:  String,
    pub birthday: BirthdayDto,
}

// --- ハンドラ ---

/// GET /birthdays
#[tracing::instrument(skip_all)]
pub async fn list_birthdays(
    State(state): State<Arc<BirthdayState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let birthdays = state.usecase.list_birthdays().await?;

    let items: Vec<BirthdayDto> = birthdays.iter().map(BirthdayDto::from).collect();
    Ok(Json(items))
}

/// POST /birthdays
///
/// ## レスポンス
///
/// - `201 Created`: 登録された記録
/// - `400 Bad Request`: 名前・日付の欠落、日付形式やメールアドレスの不正
/// - `500 Internal Server Error`: 保存に失敗
#[tracing::instrument(skip_all)]
pub async fn create_birthday(
    State(state): State<Arc<BirthdayState>>,
    payload: Result<Json<CreateBirthdayRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(req) = payload?;

    let input = CreateBirthdayInput {
        name:     req.name,
        date:     req.date,
        email:    req.email,
        comments: req.comments,
    };

    let birthday = state.usecase.create_birthday(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBirthdayResponse {
            message:  "Birthday saved successfully".to_string(),
            birthday: BirthdayDto::from(&birthday),
        }),
    ))
}
