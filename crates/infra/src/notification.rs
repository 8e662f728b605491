//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **3 つの実装**: Resend API（本番用）、SMTP（Mailpit 開発用）、Noop（ローカル確認用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択

mod noop;
mod resend;
mod smtp;

use async_trait::async_trait;
use hbd_domain::notification::{EmailMessage, NotificationError};
pub use noop::NoopNotificationSender;
pub use resend::{DEFAULT_RESEND_API_URL, ResendNotificationSender};
pub use smtp::SmtpNotificationSender;

/// メール送信トレイト
///
/// 送信手段が未設定の場合は呼び出し側で `Option<Arc<dyn NotificationSender>>` として
/// 不在を表現する。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
