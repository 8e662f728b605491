//! Noop 通知送信実装
//!
//! メールを送らずに宛先と件名をログに残す。`NOTIFICATION_BACKEND=noop` で選ばれ、
//! ローカル開発でスキャンの流れだけを確認するときに使う。
//! 本文は debug レベルでのみ出力する。

use async_trait::async_trait;
use hbd_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;

/// Noop 通知送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(
            notification.backend = "noop",
            notification.recipient = %email.to,
            notification.subject = %email.subject,
            "誕生日メールを送信せずに破棄"
        );
        tracing::debug!(text_body = %email.text_body, "破棄したメールの本文");
        Ok(())
    }
}
