//! # 単発通知ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /notify` - 指定した宛先に誕生日メールを 1 通送信

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ServiceError,
    usecase::notification::{NotificationUseCaseImpl, SendBirthdayEmailInput},
};

/// 単発通知 API の共有状態
pub struct NotificationState {
    pub usecase: NotificationUseCaseImpl,
}

/// 単発通知リクエスト
#[derive(Debug, Deserialize)]
pub struct SendBirthdayEmailRequest {
    pub to:                   Option<String>,
    pub name:                 Option<String>,
    #[serde(rename = "birthdayPersonName")]
    pub birthday_person_name: Option<String>,
}

/// 単発通知レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct SendBirthdayEmailResponse {
    pub message: String,
}

/// POST /notify
///
/// ## レスポンス
///
/// - `200 OK`: 送信成功
/// - `400 Bad Request`: 必須項目の欠落、メールアドレスの不正
/// - `500 Internal Server Error`: 送信基盤が未構成、または送信失敗
#[tracing::instrument(skip_all)]
pub async fn send_birthday_email(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<SendBirthdayEmailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(req) = payload?;

    let input = SendBirthdayEmailInput {
        to:                   req.to,
        name:                 req.name,
        birthday_person_name: req.birthday_person_name,
    };

    state.usecase.send_birthday_email(input).await?;

    Ok(Json(SendBirthdayEmailResponse {
        message: "Birthday email sent successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode},
        routing::post,
    };
    use hbd_infra::{mock::MockNotificationSender, notification::NotificationSender};
    use hbd_shared::ErrorResponse;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::usecase::notification::TemplateRenderer;

    fn create_test_app(sender: Option<MockNotificationSender>) -> Router {
        let usecase = NotificationUseCaseImpl::new(
            sender.map(|s| Arc::new(s) as Arc<dyn NotificationSender>),
            Arc::new(TemplateRenderer::new().unwrap()),
        );
        let state = Arc::new(NotificationState { usecase });

        Router::new()
            .route("/notify", post(send_birthday_email))
            .with_state(state)
    }

    fn notify_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/notify")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_body<T: serde::de::DeserializeOwned>(
        response: axum::http::Response<Body>,
    ) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_送信に成功すると200() {
        // Given
        let sender = MockNotificationSender::new();
        let sut = create_test_app(Some(sender.clone()));

        // When
        let response = sut
            .oneshot(notify_request(serde_json::json!({
                "to": "friend@example.com",
                "name": "Taro",
                "birthdayPersonName": "Hanako"
            })))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: SendBirthdayEmailResponse = response_body(response).await;
        assert_eq!(body.message, "Birthday email sent successfully");
        let sent = sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.to, "friend@example.com");
    }

    #[tokio::test]
    async fn test_post_必須項目が欠けていると400() {
        // Given
        let sender = MockNotificationSender::new();
        let sut = create_test_app(Some(sender.clone()));

        // When
        let response = sut
            .oneshot(notify_request(serde_json::json!({
                "to": "friend@example.com",
                "name": "Taro"
            })))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.error, "Missing required fields");
        assert_eq!(sender.attempts(), 0);
    }

    #[tokio::test]
    async fn test_post_送信基盤が未構成なら500() {
        // Given
        let sut = create_test_app(None);

        // When
        let response = sut
            .oneshot(notify_request(serde_json::json!({
                "to": "friend@example.com",
                "name": "Taro",
                "birthdayPersonName": "Hanako"
            })))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.error, "Email service not configured");
    }

    #[tokio::test]
    async fn test_post_送信に失敗すると500() {
        // Given
        let sender = MockNotificationSender::new();
        sender.fail_for("friend@example.com");
        let sut = create_test_app(Some(sender));

        // When
        let response = sut
            .oneshot(notify_request(serde_json::json!({
                "to": "friend@example.com",
                "name": "Taro",
                "birthdayPersonName": "Hanako"
            })))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.error, "Failed to send email");
    }
}
