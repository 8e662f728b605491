//! # 値オブジェクト
//!
//! 誕生日記録を構成する、識別子を持たない不変オブジェクトを定義する。
//!
//! | 型 | 用途 | 制約 |
//! |---|------|------|
//! | [`PersonName`] | 誕生日の本人名・受信者名 | 1〜100 文字 |
//! | [`Comments`] | 自由記述メモ | 1〜1000 文字、PII としてマスク |
//! | [`Email`] | 通知先メールアドレス | `local@domain`、255 文字以内 |

use serde::{Deserialize, Serialize};

use crate::DomainError;

define_validated_string! {
    /// 人名（値オブジェクト）
    ///
    /// 前後の空白は除去される。通知メールの件名・本文に埋め込まれる。
    pub struct PersonName {
        label: "Name",
        max_length: 100,
    }
}

define_validated_string! {
    /// 誕生日記録に添えるコメント（値オブジェクト）
    ///
    /// 通知処理では使用しない。
    pub struct Comments {
        label: "Comments",
        max_length: 1000,
        pii: true,
    }
}

/// メールアドレスの最大長（DB: `VARCHAR(255)`）
const MAX_EMAIL_LENGTH: usize = 255;

/// メールアドレス（値オブジェクト）
///
/// # 不変条件
///
/// - 空文字列ではない
/// - `local@domain` の形式（local / domain とも空でない、空白を含まない）
/// - 最大 255 文字
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// 前後の空白は除去される。
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("Email is required".to_string()));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "Email address is invalid".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(DomainError::Validation(
                "Email address is invalid".to_string(),
            ));
        }

        if value.len() > MAX_EMAIL_LENGTH {
            return Err(DomainError::Validation(format!(
                "Email must be at most {MAX_EMAIL_LENGTH} characters"
            )));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
