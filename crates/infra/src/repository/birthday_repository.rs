//! # BirthdayRepository
//!
//! 誕生日記録の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **月日による抽出**: 生年月日の年は無視し、`EXTRACT(MONTH/DAY)` で比較する
//! - **条件付き更新**: `mark_sent` は未送信の行だけを更新し、送信時刻を上書きしない
//! - **決定的な順序**: 通知対象は `created_at` 昇順（同時刻は `id` 順）で返す
//! - **不正な行の読み飛ばし**: ドメインの検証を通らない行は警告ログを出して結果から除く。
//!   外部から書き込まれた 1 行のために当日のスキャン全体が止まらないようにする

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hbd_domain::{
    birthday::{Birthday, BirthdayId, BirthdayRecord, MonthDay},
    value_objects::{Comments, Email, PersonName},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 誕生日記録リポジトリトレイト
#[async_trait]
pub trait BirthdayRepository: Send + Sync {
    /// 誕生日記録を挿入する
    async fn insert(&self, birthday: &Birthday) -> Result<(), InfraError>;

    /// すべての誕生日記録を作成日時の降順で取得する
    async fn find_all(&self) -> Result<Vec<Birthday>, InfraError>;

    /// 指定した月日に誕生日を迎える未送信の記録を取得する
    ///
    /// メールアドレスを持たない記録も含まれる（スキャン側でスキップとして集計するため）。
    async fn find_unsent_by_month_day(
        &self,
        month_day: MonthDay,
    ) -> Result<Vec<Birthday>, InfraError>;

    /// 通知済みとして記録する
    ///
    /// 既に送信済みの行は更新しない。
    async fn mark_sent(&self, id: &BirthdayId, sent_at: DateTime<Utc>) -> Result<(), InfraError>;
}

/// DB の birthdays テーブルの行を表す中間構造体
///
/// `TryFrom` で `Birthday` への変換ロジックを一箇所に集約する。
#[derive(sqlx::FromRow)]
struct BirthdayRow {
    id:            Uuid,
    name:          String,
    birth_date:    NaiveDate,
    email:         Option<String>,
    comments:      Option<String>,
    email_sent:    bool,
    email_sent_at: Option<DateTime<Utc>>,
    created_at:    DateTime<Utc>,
}

impl TryFrom<BirthdayRow> for Birthday {
    type Error = InfraError;

    fn try_from(row: BirthdayRow) -> Result<Self, Self::Error> {
        Ok(Birthday::from_db(BirthdayRecord {
            id:            BirthdayId::from_uuid(row.id),
            name:          PersonName::new(row.name)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            date:          row.birth_date,
            email:         row
                .email
                .map(Email::new)
                .transpose()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            comments:      row
                .comments
                .map(Comments::new)
                .transpose()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            email_sent:    row.email_sent,
            email_sent_at: row.email_sent_at,
            created_at:    row.created_at,
        }))
    }
}

/// 行をエンティティに変換し、変換できない行は読み飛ばす
fn into_birthdays(rows: Vec<BirthdayRow>) -> Vec<Birthday> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Birthday::try_from(row) {
                Ok(birthday) => Some(birthday),
                Err(e) => {
                    tracing::warn!(
                        birthday_id = %id,
                        error = %e,
                        "検証を通らない誕生日記録を読み飛ばします"
                    );
                    None
                }
            }
        })
        .collect()
}

/// PostgreSQL 実装の BirthdayRepository
#[derive(Debug, Clone)]
pub struct PostgresBirthdayRepository {
    pool: PgPool,
}

impl PostgresBirthdayRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BirthdayRepository for PostgresBirthdayRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(birthday_id = %birthday.id()))]
    async fn insert(&self, birthday: &Birthday) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO birthdays (
                id, name, birth_date, email, comments,
                email_sent, email_sent_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(birthday.id().as_uuid())
        .bind(birthday.name().as_str())
        .bind(birthday.date())
        .bind(birthday.email().map(Email::as_str))
        .bind(birthday.comments().map(Comments::as_str))
        .bind(birthday.email_sent())
        .bind(birthday.email_sent_at())
        .bind(birthday.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<Birthday>, InfraError> {
        let rows = sqlx::query_as::<_, BirthdayRow>(
            r#"
            SELECT
                id,
                name,
                birth_date,
                email,
                comments,
                email_sent,
                email_sent_at,
                created_at
            FROM birthdays
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(into_birthdays(rows))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(month_day = %month_day))]
    async fn find_unsent_by_month_day(
        &self,
        month_day: MonthDay,
    ) -> Result<Vec<Birthday>, InfraError> {
        let rows = sqlx::query_as::<_, BirthdayRow>(
            r#"
            SELECT
                id,
                name,
                birth_date,
                email,
                comments,
                email_sent,
                email_sent_at,
                created_at
            FROM birthdays
            WHERE email_sent = FALSE
              AND EXTRACT(MONTH FROM birth_date)::INT = $1
              AND EXTRACT(DAY FROM birth_date)::INT = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(month_day.month() as i32)
        .bind(month_day.day() as i32)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_birthdays(rows))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(birthday_id = %id))]
    async fn mark_sent(&self, id: &BirthdayId, sent_at: DateTime<Utc>) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE birthdays
            SET email_sent = TRUE, email_sent_at = $2
            WHERE id = $1 AND email_sent = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn BirthdayRepository>>();
    }

    #[test]
    fn test_不正な名前の行は予期しないエラーになる() {
        let row = BirthdayRow {
            id:            Uuid::now_v7(),
            name:          "   ".to_string(),
            birth_date:    NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            email:         None,
            comments:      None,
            email_sent:    false,
            email_sent_at: None,
            created_at:    Utc::now(),
        };

        let result = Birthday::try_from(row);

        assert!(matches!(
            result.map_err(|e| e.to_string()),
            Err(msg) if msg.contains("Name is required")
        ));
    }

    #[test]
    fn test_不正な行は読み飛ばし残りの行を返す() {
        let good_id = Uuid::now_v7();
        let row = |id: Uuid, email: &str| BirthdayRow {
            id,
            name: "山田花子".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            email: Some(email.to_string()),
            comments: None,
            email_sent: false,
            email_sent_at: None,
            created_at: Utc::now(),
        };

        let birthdays = into_birthdays(vec![
            row(Uuid::now_v7(), "not-an-address"),
            row(good_id, "hanako@example.com"),
        ]);

        assert_eq!(birthdays.len(), 1);
        assert_eq!(birthdays[0].id().as_uuid(), &good_id);
    }

    #[test]
    fn test_行をエンティティに変換できる() {
        let id = Uuid::now_v7();
        let row = BirthdayRow {
            id,
            name: "山田花子".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            email: Some("hanako@example.com".to_string()),
            comments: Some("チーズケーキ".to_string()),
            email_sent: false,
            email_sent_at: None,
            created_at: Utc::now(),
        };

        let birthday = Birthday::try_from(row).unwrap();

        assert_eq!(birthday.id().as_uuid(), &id);
        assert_eq!(birthday.name().as_str(), "山田花子");
        assert_eq!(birthday.email().map(Email::as_str), Some("hanako@example.com"));
        assert!(!birthday.email_sent());
    }
}
