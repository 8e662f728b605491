//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのリポジトリとメール送信。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! hbd-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hbd_domain::{
    birthday::{Birthday, BirthdayId, MonthDay},
    notification::{EmailMessage, NotificationError},
};
use tokio::time::Instant;

use crate::{error::InfraError, notification::NotificationSender, repository::BirthdayRepository};

// ===== MockBirthdayRepository =====

/// 障害注入できる操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    Insert,
    FindAll,
    FindUnsent,
    MarkSent,
}

#[derive(Clone, Default)]
pub struct MockBirthdayRepository {
    birthdays: Arc<Mutex<Vec<Birthday>>>,
    failing:   Arc<Mutex<HashSet<RepositoryOperation>>>,
}

impl MockBirthdayRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_birthday(&self, birthday: Birthday) {
        self.birthdays.lock().unwrap().push(birthday);
    }

    /// 指定した操作を以降すべて失敗させる
    pub fn fail_on(&self, operation: RepositoryOperation) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn find_by_id(&self, id: &BirthdayId) -> Option<Birthday> {
        self.birthdays
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id() == id)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.birthdays.lock().unwrap().len()
    }

    fn check(&self, operation: RepositoryOperation) -> Result<(), InfraError> {
        if self.failing.lock().unwrap().contains(&operation) {
            return Err(InfraError::unexpected(format!(
                "モック: {operation:?} の障害を注入"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BirthdayRepository for MockBirthdayRepository {
    async fn insert(&self, birthday: &Birthday) -> Result<(), InfraError> {
        self.check(RepositoryOperation::Insert)?;
        self.birthdays.lock().unwrap().push(birthday.clone());
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Birthday>, InfraError> {
        self.check(RepositoryOperation::FindAll)?;
        let mut birthdays = self.birthdays.lock().unwrap().clone();
        birthdays.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().as_uuid().cmp(a.id().as_uuid()))
        });
        Ok(birthdays)
    }

    async fn find_unsent_by_month_day(
        &self,
        month_day: MonthDay,
    ) -> Result<Vec<Birthday>, InfraError> {
        self.check(RepositoryOperation::FindUnsent)?;
        let mut birthdays: Vec<Birthday> = self
            .birthdays
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.is_due_on(month_day))
            .cloned()
            .collect();
        birthdays.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(birthdays)
    }

    async fn mark_sent(&self, id: &BirthdayId, sent_at: DateTime<Utc>) -> Result<(), InfraError> {
        self.check(RepositoryOperation::MarkSent)?;
        let mut birthdays = self.birthdays.lock().unwrap();
        if let Some(pos) = birthdays.iter().position(|b| b.id() == id) {
            birthdays[pos] = birthdays[pos].clone().mark_sent(sent_at);
        }
        Ok(())
    }
}

// ===== MockNotificationSender =====

/// 送信記録
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message: EmailMessage,
    /// 送信時刻（tokio の仮想時間に従う）
    pub sent_at: Instant,
}

#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent:               Arc<Mutex<Vec<SentEmail>>>,
    failing_recipients: Arc<Mutex<HashSet<String>>>,
    attempts:           Arc<Mutex<usize>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定した宛先への送信を失敗させる
    pub fn fail_for(&self, recipient: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(recipient.to_string());
    }

    /// 送信に成功したメール
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// 失敗も含めた送信試行回数
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        *self.attempts.lock().unwrap() += 1;

        if self.failing_recipients.lock().unwrap().contains(&email.to) {
            return Err(NotificationError::SendFailed(format!(
                "モック: {} への送信を拒否",
                email.to
            )));
        }

        self.sent.lock().unwrap().push(SentEmail {
            message: email.clone(),
            sent_at: Instant::now(),
        });
        Ok(())
    }
}
