//! # 誕生日記録ユースケース
//!
//! 誕生日記録の登録と一覧取得を扱う。

use std::sync::Arc;

use chrono::NaiveDate;
use hbd_domain::{
    birthday::{Birthday, BirthdayId, NewBirthday},
    clock::Clock,
    value_objects::{Comments, Email, PersonName},
};
use hbd_infra::repository::BirthdayRepository;
use hbd_shared::{event_log::event, log_business_event};

use super::notification::non_blank;
use crate::error::ServiceError;

/// 誕生日記録の登録入力
#[derive(Debug, Clone, Default)]
pub struct CreateBirthdayInput {
    pub name:     Option<String>,
    /// `YYYY-MM-DD`
    pub date:     Option<String>,
    pub email:    Option<String>,
    pub comments: Option<String>,
}

/// 誕生日記録ユースケース
pub struct BirthdayUseCaseImpl {
    repo:  Arc<dyn BirthdayRepository>,
    clock: Arc<dyn Clock>,
}

impl BirthdayUseCaseImpl {
    pub fn new(repo: Arc<dyn BirthdayRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// 誕生日記録を登録する
    ///
    /// 名前と日付は必須。空白のみのメールアドレス・コメントは未入力として扱う。
    pub async fn create_birthday(
        &self,
        input: CreateBirthdayInput,
    ) -> Result<Birthday, ServiceError> {
        let (Some(name), Some(date)) = (non_blank(input.name), non_blank(input.date)) else {
            return Err(ServiceError::Validation(
                "Name and date are required".to_string(),
            ));
        };

        let birthday = Birthday::new(NewBirthday {
            id:         BirthdayId::new(),
            name:       PersonName::new(name)?,
            date:       parse_date(&date)?,
            email:      non_blank(input.email).map(Email::new).transpose()?,
            comments:   non_blank(input.comments).map(Comments::new).transpose()?,
            created_at: self.clock.now(),
        });

        self.repo
            .insert(&birthday)
            .await
            .map_err(ServiceError::database("Failed to save birthday"))?;

        log_business_event!(
            event.category = event::category::BIRTHDAY,
            event.action = event::action::BIRTHDAY_CREATED,
            event.entity_type = event::entity_type::BIRTHDAY,
            event.entity_id = %birthday.id(),
            event.result = event::result::SUCCESS,
            "誕生日記録を登録"
        );

        Ok(birthday)
    }

    /// すべての誕生日記録を新しい順に取得する
    pub async fn list_birthdays(&self) -> Result<Vec<Birthday>, ServiceError> {
        self.repo
            .find_all()
            .await
            .map_err(ServiceError::database("Failed to read birthdays"))
    }
}

/// `YYYY-MM-DD` 形式の日付を解釈する
fn parse_date(value: &str) -> Result<NaiveDate, ServiceError> {
    let value = value.trim();
    if value.len() != 10 {
        return Err(invalid_date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid_date())
}

fn invalid_date() -> ServiceError {
    ServiceError::Validation("Date must be in YYYY-MM-DD format".to_string())
}
