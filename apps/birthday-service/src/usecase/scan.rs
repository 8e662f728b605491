//! # 日次スキャンユースケース
//!
//! 今日が誕生日の未送信記録を抽出し、1 件ずつ間隔を空けてメールを送信し、
//! 成功した記録を送信済みにする。
//!
//! ## 処理フロー
//!
//! 1. 送信基盤が未構成なら記録を読む前に中断
//! 2. `Clock` の UTC 日付から月日を求め、未送信かつ月日一致の記録を作成順に取得
//! 3. メールアドレスのない記録はスキップとして集計（送信しない）
//! 4. 2 件目以降の送信前に `pacing` だけ待機し、1 件ずつ逐次送信
//! 5. 送信成功なら送信済みに更新、失敗なら未送信のまま次へ進む
//!
//! ## 設計方針
//!
//! - **部分失敗の許容**: 1 件の送信失敗でバッチ全体を止めない
//! - **少なくとも 1 回**: 送信成功後の更新に失敗しても送信成功として集計し、エラーログを残す
//! - **プロセス内の多重起動防止**: 実行中に再度呼ばれた場合は `ScanInProgress`

use std::{sync::Arc, time::Duration};

use hbd_domain::{
    birthday::{Birthday, BirthdayId, MonthDay},
    clock::Clock,
    notification::BirthdayNotification,
    value_objects::Email,
};
use hbd_infra::{notification::NotificationSender, repository::BirthdayRepository};
use hbd_shared::{
    event_log::{
        error::{category, kind},
        event,
    },
    log_business_event,
};
use tokio::sync::Mutex;

use super::notification::TemplateRenderer;
use crate::error::ServiceError;

/// 送信間隔の既定値（ミリ秒）
pub const DEFAULT_PACING_MS: u64 = 1000;

/// 送信間隔の既定値
pub const DEFAULT_PACING: Duration = Duration::from_millis(DEFAULT_PACING_MS);

/// メールアドレスがない場合のスキップ理由
pub const SKIP_REASON_NO_EMAIL: &str = "No email address";

/// 1 件ごとの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// 送信成功
    Sent { id: BirthdayId, name: String },
    /// 送信失敗（未送信のまま残る）
    Failed {
        id:     BirthdayId,
        name:   String,
        reason: String,
    },
    /// 送信対象外
    Skipped {
        id:     BirthdayId,
        name:   String,
        reason: String,
    },
}

impl ScanOutcome {
    pub fn id(&self) -> &BirthdayId {
        match self {
            Self::Sent { id, .. } | Self::Failed { id, .. } | Self::Skipped { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Sent { name, .. } | Self::Failed { name, .. } | Self::Skipped { name, .. } => {
                name
            }
        }
    }
}

/// 日次スキャンの集計結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// 抽出された記録の件数
    pub total:    usize,
    /// 処理順の結果
    pub outcomes: Vec<ScanOutcome>,
}

impl ScanSummary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn successful(&self) -> impl Iterator<Item = &ScanOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ScanOutcome::Sent { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &ScanOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ScanOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ScanOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ScanOutcome::Skipped { .. }))
    }

    pub fn successful_count(&self) -> usize {
        self.successful().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }
}

/// 日次スキャンユースケース
pub struct ScanUseCaseImpl {
    repo:     Arc<dyn BirthdayRepository>,
    sender:   Option<Arc<dyn NotificationSender>>,
    renderer: Arc<TemplateRenderer>,
    clock:    Arc<dyn Clock>,
    pacing:   Duration,
    running:  Mutex<()>,
}

impl ScanUseCaseImpl {
    pub fn new(
        repo: Arc<dyn BirthdayRepository>,
        sender: Option<Arc<dyn NotificationSender>>,
        renderer: Arc<TemplateRenderer>,
        clock: Arc<dyn Clock>,
        pacing: Duration,
    ) -> Self {
        Self {
            repo,
            sender,
            renderer,
            clock,
            pacing,
            running: Mutex::new(()),
        }
    }

    /// 今日が誕生日の記録に通知メールを送信する
    ///
    /// # エラー
    ///
    /// - 送信基盤が未構成: `ServiceError::NotConfigured`
    /// - 実行中のスキャンがある: `ServiceError::ScanInProgress`
    /// - 記録の取得に失敗: `ServiceError::Database`（集計結果は返さない）
    #[tracing::instrument(skip_all)]
    pub async fn run_daily_scan(&self) -> Result<ScanSummary, ServiceError> {
        let sender = self.sender.as_ref().ok_or(ServiceError::NotConfigured)?;
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| ServiceError::ScanInProgress)?;

        let today = MonthDay::from_date(self.clock.today());

        log_business_event!(
            event.category = event::category::SCAN,
            event.action = event::action::SCAN_STARTED,
            scan.month_day = %today,
            "日次スキャン開始"
        );

        let birthdays = self
            .repo
            .find_unsent_by_month_day(today)
            .await
            .map_err(ServiceError::database("Failed to fetch birthdays"))?;

        let mut summary = ScanSummary {
            total:    birthdays.len(),
            outcomes: Vec::with_capacity(birthdays.len()),
        };
        let mut attempted = 0usize;

        for birthday in birthdays {
            let Some(email) = birthday.email() else {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SKIPPED,
                    event.entity_type = event::entity_type::BIRTHDAY,
                    event.entity_id = %birthday.id(),
                    event.result = event::result::SKIPPED,
                    "メールアドレスがないため送信をスキップ"
                );
                summary.outcomes.push(ScanOutcome::Skipped {
                    id:     birthday.id().clone(),
                    name:   birthday.name().as_str().to_string(),
                    reason: SKIP_REASON_NO_EMAIL.to_string(),
                });
                continue;
            };

            if attempted > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            attempted += 1;

            let outcome = self.notify(sender.as_ref(), &birthday, email).await;
            summary.outcomes.push(outcome);
        }

        let result = if summary.failed_count() == 0 {
            event::result::SUCCESS
        } else {
            event::result::FAILURE
        };
        log_business_event!(
            event.category = event::category::SCAN,
            event.action = event::action::SCAN_COMPLETED,
            event.result = result,
            scan.total = summary.total,
            scan.successful = summary.successful_count(),
            scan.failed = summary.failed_count(),
            scan.skipped = summary.skipped_count(),
            "日次スキャン完了"
        );

        Ok(summary)
    }

    /// 1 件分の送信と送信済み更新
    async fn notify(
        &self,
        sender: &dyn NotificationSender,
        birthday: &Birthday,
        email: &Email,
    ) -> ScanOutcome {
        let id = birthday.id().clone();
        let name = birthday.name().as_str().to_string();

        let notification = BirthdayNotification::new(email.clone(), None, birthday.name().clone());

        let result = match self.renderer.render(&notification) {
            Ok(message) => sender.send_email(&message).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_FAILED,
                event.entity_type = event::entity_type::BIRTHDAY,
                event.entity_id = %id,
                event.result = event::result::FAILURE,
                error = %e,
                "誕生日メール送信失敗"
            );
            return ScanOutcome::Failed {
                id,
                name,
                reason: e.to_string(),
            };
        }

        if let Err(e) = self.repo.mark_sent(&id, self.clock.now()).await {
            // 送信は完了しているため成功として扱う。次回スキャンで再送されうる
            tracing::error!(
                error.category = category::INFRASTRUCTURE,
                error.kind = kind::MARK_SENT,
                birthday_id = %id,
                span_trace = %e.span_trace(),
                "送信済みへの更新に失敗: {}",
                e
            );
        }

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_SENT,
            event.entity_type = event::entity_type::BIRTHDAY,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "誕生日メール送信成功"
        );

        ScanOutcome::Sent { id, name }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use hbd_domain::{birthday::NewBirthday, clock::FixedClock, value_objects::PersonName};
    use hbd_infra::mock::{MockBirthdayRepository, MockNotificationSender, RepositoryOperation};
    use pretty_assertions::assert_eq;

    use super::*;

    /// 2026-05-01 09:00 UTC
    fn today_clock() -> FixedClock {
        FixedClock::on(2026, 5, 1)
    }

    fn created(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
    }

    fn birthday(
        name: &str,
        date: (i32, u32, u32),
        email: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Birthday {
        Birthday::new(NewBirthday {
            id: BirthdayId::new(),
            name: PersonName::new(name).unwrap(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            email: email.map(|e| Email::new(e).unwrap()),
            comments: None,
            created_at,
        })
    }

    struct Fixture {
        repo:   MockBirthdayRepository,
        sender: MockNotificationSender,
        sut:    ScanUseCaseImpl,
    }

    fn fixture_with(clock: FixedClock, configured: bool) -> Fixture {
        let repo = MockBirthdayRepository::new();
        let sender = MockNotificationSender::new();
        let sut = ScanUseCaseImpl::new(
            Arc::new(repo.clone()),
            configured.then(|| Arc::new(sender.clone()) as Arc<dyn NotificationSender>),
            Arc::new(TemplateRenderer::new().unwrap()),
            Arc::new(clock),
            DEFAULT_PACING,
        );
        Fixture { repo, sender, sut }
    }

    fn fixture() -> Fixture {
        fixture_with(today_clock(), true)
    }

    #[tokio::test(start_paused = true)]
    async fn test_対象がなければ空の集計を返す() {
        let f = fixture();
        f.repo
            .add_birthday(birthday("別の日", (1990, 5, 2), Some("a@example.com"), created(0)));

        let summary = f.sut.run_daily_scan().await.unwrap();

        assert!(summary.is_empty());
        assert_eq!(summary.successful_count(), 0);
        assert_eq!(summary.failed_count(), 0);
        assert_eq!(f.sender.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_年に関係なく今日の月日の記録に送信し送信済みにする() {
        let f = fixture();
        let b = birthday("Hanako", (1990, 5, 1), Some("hanako@example.com"), created(0));
        let id = b.id().clone();
        f.repo.add_birthday(b);

        let summary = f.sut.run_daily_scan().await.unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.successful_count(), 1);
        assert_eq!(summary.failed_count(), 0);
        let sent = f.sender.sent_emails();
        assert_eq!(sent[0].message.to, "hanako@example.com");
        assert_eq!(sent[0].message.subject, "🎉 It's Hanako's Birthday Today!");
        let stored = f.repo.find_by_id(&id).unwrap();
        assert!(stored.email_sent());
        assert_eq!(stored.email_sent_at(), Some(today_clock().now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_メールアドレスのない記録はスキップし送信しない() {
        let f = fixture();
        let b = birthday("Hanako", (1990, 5, 1), None, created(0));
        let id = b.id().clone();
        f.repo.add_birthday(b);

        let summary = f.sut.run_daily_scan().await.unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.successful_count(), 0);
        assert_eq!(summary.failed_count(), 0);
        assert_eq!(
            summary.skipped().collect::<Vec<_>>(),
            vec![&ScanOutcome::Skipped {
                id:     id.clone(),
                name:   "Hanako".to_string(),
                reason: SKIP_REASON_NO_EMAIL.to_string(),
            }]
        );
        assert_eq!(f.sender.attempts(), 0);
        assert!(!f.repo.find_by_id(&id).unwrap().email_sent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_送信失敗は他の記録の送信を妨げず未送信のまま残る() {
        let f = fixture();
        let first = birthday("First", (1980, 5, 1), Some("ng@example.com"), created(0));
        let second = birthday("Second", (1995, 5, 1), Some("ok@example.com"), created(10));
        let (first_id, second_id) = (first.id().clone(), second.id().clone());
        f.repo.add_birthday(second);
        f.repo.add_birthday(first);
        f.sender.fail_for("ng@example.com");

        let summary = f.sut.run_daily_scan().await.unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.successful_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.outcomes[0].id(), &first_id);
        assert!(matches!(summary.outcomes[0], ScanOutcome::Failed { .. }));
        assert_eq!(summary.outcomes[1].id(), &second_id);
        assert!(!f.repo.find_by_id(&first_id).unwrap().email_sent());
        assert!(f.repo.find_by_id(&second_id).unwrap().email_sent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_同日に再実行しても再送しない() {
        let f = fixture();
        f.repo
            .add_birthday(birthday("Hanako", (1990, 5, 1), Some("hanako@example.com"), created(0)));

        f.sut.run_daily_scan().await.unwrap();
        let second = f.sut.run_daily_scan().await.unwrap();

        assert!(second.is_empty());
        assert_eq!(f.sender.sent_emails().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_送信の間隔を空ける() {
        let f = fixture();
        for i in 0..3 {
            f.repo.add_birthday(birthday(
                &format!("Person{i}"),
                (1990, 5, 1),
                Some(&format!("p{i}@example.com")),
                created(i),
            ));
        }
        let started = tokio::time::Instant::now();

        f.sut.run_daily_scan().await.unwrap();

        let sent = f.sender.sent_emails();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].sent_at.duration_since(started), Duration::ZERO);
        assert!(sent[1].sent_at.duration_since(sent[0].sent_at) >= DEFAULT_PACING);
        assert!(sent[2].sent_at.duration_since(sent[1].sent_at) >= DEFAULT_PACING);
        assert!(started.elapsed() >= DEFAULT_PACING * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_スキップした記録は送信間隔に数えない() {
        let f = fixture();
        f.repo
            .add_birthday(birthday("NoEmail", (1990, 5, 1), None, created(0)));
        f.repo
            .add_birthday(birthday("Hanako", (1990, 5, 1), Some("hanako@example.com"), created(1)));
        let started = tokio::time::Instant::now();

        f.sut.run_daily_scan().await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_閏日の記録は平年の2月28日と3月1日には送信しない() {
        for (month, day) in [(2, 28), (3, 1)] {
            let f = fixture_with(FixedClock::on(2027, month, day), true);
            f.repo
                .add_birthday(birthday("Leap", (2000, 2, 29), Some("leap@example.com"), created(0)));

            let summary = f.sut.run_daily_scan().await.unwrap();

            assert!(summary.is_empty());
        }

        let f = fixture_with(FixedClock::on(2028, 2, 29), true);
        f.repo
            .add_birthday(birthday("Leap", (2000, 2, 29), Some("leap@example.com"), created(0)));
        assert_eq!(f.sut.run_daily_scan().await.unwrap().successful_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_送信基盤が未構成なら記録を読まずに中断する() {
        let f = fixture_with(today_clock(), false);
        f.repo.fail_on(RepositoryOperation::FindUnsent);

        let result = f.sut.run_daily_scan().await;

        assert!(matches!(result, Err(ServiceError::NotConfigured)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_記録の取得に失敗するとdatabaseエラー() {
        let f = fixture();
        f.repo.fail_on(RepositoryOperation::FindUnsent);

        let result = f.sut.run_daily_scan().await;

        assert!(matches!(
            result,
            Err(ServiceError::Database { context: "Failed to fetch birthdays", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_送信済み更新に失敗しても送信成功として集計し次回再送される() {
        let f = fixture();
        let b = birthday("Hanako", (1990, 5, 1), Some("hanako@example.com"), created(0));
        let id = b.id().clone();
        f.repo.add_birthday(b);
        f.repo.fail_on(RepositoryOperation::MarkSent);

        let summary = f.sut.run_daily_scan().await.unwrap();

        assert_eq!(summary.successful_count(), 1);
        assert_eq!(summary.failed_count(), 0);
        assert!(!f.repo.find_by_id(&id).unwrap().email_sent());

        let rerun = f.sut.run_daily_scan().await.unwrap();

        assert_eq!(rerun.successful_count(), 1);
        assert_eq!(f.sender.sent_emails().len(), 2);
        assert!(!f.repo.find_by_id(&id).unwrap().email_sent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_送信に失敗した試行も送信間隔に数える() {
        let f = fixture();
        f.repo
            .add_birthday(birthday("First", (1990, 5, 1), Some("ng@example.com"), created(0)));
        f.repo
            .add_birthday(birthday("Second", (1990, 5, 1), Some("ok@example.com"), created(1)));
        f.sender.fail_for("ng@example.com");
        let started = tokio::time::Instant::now();

        let summary = f.sut.run_daily_scan().await.unwrap();

        assert_eq!(summary.failed_count(), 1);
        assert_eq!(f.sender.attempts(), 2);
        let sent = f.sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].sent_at.duration_since(started) >= DEFAULT_PACING);
    }

    #[tokio::test(start_paused = true)]
    async fn test_実行中のスキャンがあればscan_in_progress() {
        let f = Arc::new(fixture());
        for i in 0..2 {
            f.repo.add_birthday(birthday(
                &format!("Person{i}"),
                (1990, 5, 1),
                Some(&format!("p{i}@example.com")),
                created(i),
            ));
        }

        let running = {
            let f = Arc::clone(&f);
            tokio::spawn(async move { f.sut.run_daily_scan().await })
        };
        // 1 件目の送信後、送信間隔の待機に入るまで進める
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let concurrent = f.sut.run_daily_scan().await;

        assert!(matches!(concurrent, Err(ServiceError::ScanInProgress)));
        let first = running.await.unwrap().unwrap();
        assert_eq!(first.successful_count(), 2);
    }
}
