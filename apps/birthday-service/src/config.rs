//! # Birthday Service 設定
//!
//! 環境変数から Birthday Service サーバーの設定を読み込む。
//!
//! 不正な値は起動時に [`ConfigError`] として報告し、黙って既定値に戻さない。

use std::{env, str::FromStr, sync::Arc, time::Duration};

use hbd_infra::notification::{
    DEFAULT_RESEND_API_URL,
    NoopNotificationSender,
    NotificationSender,
    ResendNotificationSender,
    SmtpNotificationSender,
};
use thiserror::Error;

use crate::usecase::scan::DEFAULT_PACING_MS;

/// 送信元の既定値（Resend のサンドボックスドメイン）
const DEFAULT_FROM_ADDRESS: &str = "Birthday Reminder <onboarding@resend.dev>";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値を解釈できない
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Birthday Service サーバーの設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 日次スキャンでの送信間隔
    pub scan_pacing:  Duration,
    /// 通知設定
    pub notification: NotificationConfig,
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationBackend {
    /// Resend HTTP API
    Resend,
    /// SMTP（Mailpit など）
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える。
#[derive(Clone)]
pub struct NotificationConfig {
    pub backend:        NotificationBackend,
    /// Resend API キー（未設定なら送信基盤は未構成扱い）
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub smtp_host:      String,
    pub smtp_port:      u16,
    /// 送信元（表示名付き可）
    pub from_address:   String,
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("backend", &self.backend)
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("resend_api_url", &self.resend_api_url)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let pacing_ms: u64 = parse_or("SCAN_PACING_MS", get("SCAN_PACING_MS"), DEFAULT_PACING_MS)?;

        Ok(Self {
            host:         get("HBD_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port:         parse_required("HBD_PORT", get("HBD_PORT"))?,
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            scan_pacing:  Duration::from_millis(pacing_ms),
            notification: NotificationConfig {
                backend:        parse_or(
                    "NOTIFICATION_BACKEND",
                    get("NOTIFICATION_BACKEND"),
                    NotificationBackend::Resend,
                )?,
                resend_api_key: get("RESEND_API_KEY"),
                resend_api_url: get("RESEND_API_URL")
                    .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),
                smtp_host:      get("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
                smtp_port:      parse_or("SMTP_PORT", get("SMTP_PORT"), 1025)?,
                from_address:   get("NOTIFICATION_FROM_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            },
        })
    }
}

impl NotificationConfig {
    /// 設定に応じたメール送信実装を構築する
    ///
    /// Resend バックエンドで API キーが無い場合は `None`（未構成）を返す。
    pub fn build_sender(&self) -> Option<Arc<dyn NotificationSender>> {
        match self.backend {
            NotificationBackend::Resend => {
                let api_key = self.resend_api_key.clone()?;
                Some(Arc::new(ResendNotificationSender::new(
                    &self.resend_api_url,
                    api_key,
                    self.from_address.clone(),
                )))
            }
            NotificationBackend::Smtp => Some(Arc::new(SmtpNotificationSender::new(
                &self.smtp_host,
                self.smtp_port,
                self.from_address.clone(),
            ))),
            NotificationBackend::Noop => Some(Arc::new(NoopNotificationSender)),
        }
    }
}

fn parse_required<T: FromStr>(name: &'static str, value: Option<String>) -> Result<T, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(name))?;
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
