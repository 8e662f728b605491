//! # 誕生日
//!
//! 誕生日記録エンティティと、日次スキャンで使う月日マッチングを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Birthday`] | 誕生日記録 | 名前・生年月日・任意の通知先 |
//! | [`MonthDay`] | 月日 | 年を無視した比較キー |
//!
//! ## 設計方針
//!
//! - **年は比較に使わない**: 生年月日の月と日だけを「今日」と突き合わせる
//! - **2/29 は 2/29 にのみ一致**: 平年の 2/28 や 3/1 に繰り上げない
//! - **送信済みは一方向**: `email_sent` は一度 true になったら戻らない

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    DomainError,
    value_objects::{Comments, Email, PersonName},
};

// ============================================================================
// BirthdayId
// ============================================================================

define_uuid_id! {
    /// 誕生日記録の一意識別子
    ///
    /// birthdays テーブルの主キー。UUID v7 を使用。
    pub struct BirthdayId;
}

// ============================================================================
// MonthDay
// ============================================================================

/// 月日（年を持たない暦日）
///
/// 閏年基準で検証するため 02-29 も表現できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day:   u32,
}

impl MonthDay {
    /// 月日を作成する
    ///
    /// # エラー
    ///
    /// 閏年においても存在しない月日の場合は `DomainError::Validation` を返す。
    pub fn new(month: u32, day: u32) -> Result<Self, DomainError> {
        // 2000 年は閏年
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(DomainError::Validation(format!(
                "Invalid month/day: {month:02}-{day:02}"
            )));
        }
        Ok(Self { month, day })
    }

    /// 日付から月日を取り出す
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day:   date.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// 日付の月日が一致するか（年は無視）
    pub fn matches(&self, date: &NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }
}

impl std::fmt::Display for MonthDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

// ============================================================================
// Birthday
// ============================================================================

/// 誕生日記録の作成パラメータ
pub struct NewBirthday {
    pub id:         BirthdayId,
    pub name:       PersonName,
    pub date:       NaiveDate,
    pub email:      Option<Email>,
    pub comments:   Option<Comments>,
    pub created_at: DateTime<Utc>,
}

/// DB から復元するための行データ
pub struct BirthdayRecord {
    pub id:            BirthdayId,
    pub name:          PersonName,
    pub date:          NaiveDate,
    pub email:         Option<Email>,
    pub comments:      Option<Comments>,
    pub email_sent:    bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_at:    DateTime<Utc>,
}

/// 誕生日記録エンティティ
///
/// # 不変条件
///
/// - `email_sent` が true なら `email_sent_at` は送信時刻を持つ
/// - `email` が無い記録は通知対象にならない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Birthday {
    id:            BirthdayId,
    name:          PersonName,
    date:          NaiveDate,
    email:         Option<Email>,
    comments:      Option<Comments>,
    email_sent:    bool,
    email_sent_at: Option<DateTime<Utc>>,
    created_at:    DateTime<Utc>,
}

impl Birthday {
    /// 新しい誕生日記録を作成する（未送信状態）
    pub fn new(params: NewBirthday) -> Self {
        Self {
            id:            params.id,
            name:          params.name,
            date:          params.date,
            email:         params.email,
            comments:      params.comments,
            email_sent:    false,
            email_sent_at: None,
            created_at:    params.created_at,
        }
    }

    /// DB からエンティティを復元する（バリデーションをスキップ）
    pub fn from_db(record: BirthdayRecord) -> Self {
        Self {
            id:            record.id,
            name:          record.name,
            date:          record.date,
            email:         record.email,
            comments:      record.comments,
            email_sent:    record.email_sent,
            email_sent_at: record.email_sent_at,
            created_at:    record.created_at,
        }
    }

    /// 指定した月日に通知すべき記録か
    ///
    /// 未送信で月日が一致する場合に true。メールアドレスの有無は問わない
    /// （宛先のない記録はスキャン側でスキップとして集計する）。
    pub fn is_due_on(&self, month_day: MonthDay) -> bool {
        !self.email_sent && month_day.matches(&self.date)
    }

    /// 送信済みに遷移する
    ///
    /// 既に送信済みの場合は元の送信時刻を保持したまま返す。
    pub fn mark_sent(self, now: DateTime<Utc>) -> Self {
        if self.email_sent {
            return self;
        }
        Self {
            email_sent: true,
            email_sent_at: Some(now),
            ..self
        }
    }

    // --- Getters ---

    pub fn id(&self) -> &BirthdayId {
        &self.id
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn email_sent(&self) -> bool {
        self.email_sent
    }

    pub fn email_sent_at(&self) -> Option<DateTime<Utc>> {
        self.email_sent_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// テスト
// ============================================================================
