//! Resend 通知送信実装
//!
//! Resend の HTTP API（`POST /emails`）を reqwest で呼び出してメールを送信する。

use async_trait::async_trait;
use hbd_domain::notification::{EmailMessage, NotificationError};
use serde::Serialize;

use super::NotificationSender;

/// Resend API のデフォルトベース URL
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

/// `POST /emails` のリクエストボディ
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from:    &'a str,
    to:      [&'a str; 1],
    subject: &'a str,
    html:    &'a str,
    text:    &'a str,
}

/// Resend 通知送信
#[derive(Clone)]
pub struct ResendNotificationSender {
    client:       reqwest::Client,
    base_url:     String,
    api_key:      String,
    from_address: String,
}

impl ResendNotificationSender {
    /// 新しい Resend 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `base_url`: API のベース URL（例: `https://api.resend.com`）
    /// - `api_key`: Resend の API キー
    /// - `from_address`: 送信元（例: `Birthday Reminder <onboarding@resend.dev>`）
    pub fn new(base_url: &str, api_key: String, from_address: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            from_address,
        }
    }
}

impl std::fmt::Debug for ResendNotificationSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendNotificationSender")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

#[async_trait]
impl NotificationSender for ResendNotificationSender {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let body = SendEmailRequest {
            from:    &self.from_address,
            to:      [email.to.as_str()],
            subject: &email.subject,
            html:    &email.html_body,
            text:    &email.text_body,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("Resend API 呼び出し失敗: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::SendFailed(format!(
                "Resend API エラー {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn リクエストボディはresendの形式でシリアライズされる() {
        let body = SendEmailRequest {
            from:    "Birthday Reminder <onboarding@resend.dev>",
            to:      ["hanako@example.com"],
            subject: "🎉 It's 山田花子's Birthday Today!",
            html:    "<h1>Happy Birthday!</h1>",
            text:    "Happy Birthday!",
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "from": "Birthday Reminder <onboarding@resend.dev>",
                "to": ["hanako@example.com"],
                "subject": "🎉 It's 山田花子's Birthday Today!",
                "html": "<h1>Happy Birthday!</h1>",
                "text": "Happy Birthday!",
            })
        );
    }

    #[test]
    fn debug出力でapiキーはマスクされる() {
        let sender = ResendNotificationSender::new(
            "https://api.resend.com/",
            "re_secret".to_string(),
            "Birthday Reminder <onboarding@resend.dev>".to_string(),
        );

        let debug = format!("{sender:?}");

        assert!(!debug.contains("re_secret"));
        assert!(debug.contains("\"https://api.resend.com\""));
    }

    #[tokio::test]
    async fn 接続できない場合はsend_failedになる() {
        let sender = ResendNotificationSender::new(
            "http://127.0.0.1:1",
            "re_test".to_string(),
            "Birthday Reminder <onboarding@resend.dev>".to_string(),
        );
        let email = EmailMessage {
            to:        "hanako@example.com".to_string(),
            subject:   "件名".to_string(),
            html_body: "<p>本文</p>".to_string(),
            text_body: "本文".to_string(),
        };

        let result = sender.send_email(&email).await;

        assert!(matches!(result, Err(NotificationError::SendFailed(_))));
    }
}
