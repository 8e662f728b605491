//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで誕生日メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **件名パターン**: `🎉 It's {本人名}'s Birthday Today!`
//! - **HTML は自動エスケープ**: 名前に含まれるタグはそのまま表示される

use hbd_domain::notification::{BirthdayNotification, EmailMessage, NotificationError};
use tera::{Context, Tera};

const HTML_TEMPLATE: &str = "birthday.html";
const TEXT_TEMPLATE: &str = "birthday.txt";

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`BirthdayNotification` から
/// `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    HTML_TEMPLATE,
                    include_str!("../../../templates/notifications/birthday.html"),
                ),
                (
                    TEXT_TEMPLATE,
                    include_str!("../../../templates/notifications/birthday.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 通知からメールメッセージを生成する
    pub fn render(
        &self,
        notification: &BirthdayNotification,
    ) -> Result<EmailMessage, NotificationError> {
        let celebrant_name = notification.celebrant_name().as_str();

        let mut context = Context::new();
        context.insert("celebrant_name", celebrant_name);
        // 空文字列は tera の if で偽になる
        context.insert(
            "recipient_name",
            notification
                .recipient_name()
                .map(|name| name.as_str())
                .unwrap_or(""),
        );

        let html_body = self
            .engine
            .render(HTML_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(TEXT_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(EmailMessage {
            to: notification.recipient_email().to_string(),
            subject: format!("🎉 It's {celebrant_name}'s Birthday Today!"),
            html_body,
            text_body,
        })
    }
}
