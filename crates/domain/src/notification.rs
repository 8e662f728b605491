//! # 通知
//!
//! 誕生日メール通知に関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **通知イベントとメール生成の分離**: [`BirthdayNotification`] は宛先と差し込み値のみを持ち、
//!   件名・本文の生成は TemplateRenderer（birthday-service）が担う
//! - **送信手段の抽象化**: [`EmailMessage`] を受け取る NotificationSender（infra）が実際の送信を行う

use thiserror::Error;

use crate::value_objects::{Email, PersonName};

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 誕生日通知
///
/// 日次スキャンでは受信者名を持たず、単発通知では受信者名を挨拶行に使う。
#[derive(Debug, Clone)]
pub struct BirthdayNotification {
    recipient_email: Email,
    recipient_name:  Option<PersonName>,
    celebrant_name:  PersonName,
}

impl BirthdayNotification {
    pub fn new(
        recipient_email: Email,
        recipient_name: Option<PersonName>,
        celebrant_name: PersonName,
    ) -> Self {
        Self {
            recipient_email,
            recipient_name,
            celebrant_name,
        }
    }

    pub fn recipient_email(&self) -> &Email {
        &self.recipient_email
    }

    pub fn recipient_name(&self) -> Option<&PersonName> {
        self.recipient_name.as_ref()
    }

    /// 誕生日を迎える本人の名前
    pub fn celebrant_name(&self) -> &PersonName {
        &self.celebrant_name
    }
}
