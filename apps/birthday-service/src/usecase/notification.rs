//! # 通知ユースケース
//!
//! 宛先を指定した単発の誕生日メール送信を扱う。誕生日記録は参照・更新しない。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによるメール生成

pub mod template_renderer;

use std::sync::Arc;

use hbd_domain::{
    notification::BirthdayNotification,
    value_objects::{Email, PersonName},
};
use hbd_infra::notification::NotificationSender;
use hbd_shared::{event_log::event, log_business_event};
pub use template_renderer::TemplateRenderer;

use crate::error::ServiceError;

/// 単発通知の入力
#[derive(Debug, Clone, Default)]
pub struct SendBirthdayEmailInput {
    /// 送信先メールアドレス
    pub to:                   Option<String>,
    /// 受信者の名前（挨拶行に使う）
    pub name:                 Option<String>,
    /// 誕生日を迎える本人の名前
    pub birthday_person_name: Option<String>,
}

/// 通知ユースケース
pub struct NotificationUseCaseImpl {
    sender:   Option<Arc<dyn NotificationSender>>,
    renderer: Arc<TemplateRenderer>,
}

impl NotificationUseCaseImpl {
    pub fn new(
        sender: Option<Arc<dyn NotificationSender>>,
        renderer: Arc<TemplateRenderer>,
    ) -> Self {
        Self { sender, renderer }
    }

    /// 誕生日メールを 1 通送信する
    ///
    /// # エラー
    ///
    /// - 送信基盤が未構成: `ServiceError::NotConfigured`（入力検証より先に判定）
    /// - 入力の欠落・不正: `ServiceError::Validation`
    /// - 送信失敗: `ServiceError::SendFailed`
    pub async fn send_birthday_email(
        &self,
        input: SendBirthdayEmailInput,
    ) -> Result<(), ServiceError> {
        let sender = self.sender.as_ref().ok_or(ServiceError::NotConfigured)?;

        let (Some(to), Some(name), Some(celebrant)) = (
            non_blank(input.to),
            non_blank(input.name),
            non_blank(input.birthday_person_name),
        ) else {
            return Err(ServiceError::Validation(
                "Missing required fields".to_string(),
            ));
        };

        let notification = BirthdayNotification::new(
            Email::new(to)?,
            Some(PersonName::new(name)?),
            PersonName::new(celebrant)?,
        );

        let email = self
            .renderer
            .render(&notification)
            .map_err(ServiceError::SendFailed)?;

        match sender.send_email(&email).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.result = event::result::SUCCESS,
                    notification.recipient = %email.to,
                    "誕生日メール送信成功"
                );
                Ok(())
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.result = event::result::FAILURE,
                    notification.recipient = %email.to,
                    error = %e,
                    "誕生日メール送信失敗"
                );
                Err(ServiceError::SendFailed(e))
            }
        }
    }
}

/// 空白のみの文字列を未入力として扱う
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
