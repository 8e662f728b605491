//! # Clock（時刻プロバイダ）
//!
//! ユースケース層での `Utc::now()` 直接呼び出しを置き換え、
//! テストで固定時刻を注入可能にするための抽象化。
//!
//! 「今日」は UTC の暦日で判定する（タイムゾーン補正は行わない）。

use chrono::{DateTime, NaiveDate, Utc};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// 今日の日付（UTC）
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// 実際のシステム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// 指定日の 09:00 UTC に固定する
    ///
    /// 不正な日付はパニックする（テスト専用）。
    pub fn on(year: i32, month: u32, day: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or_else(|| panic!("不正な日付: {year}-{month}-{day}"));
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_は現在時刻を返す() {
        let clock = SystemClock;
        let before = Utc::now();
        let result = clock.now();
        let after = Utc::now();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn test_fixed_clock_はコンストラクタで渡した時刻を返す() {
        let fixed_time = Utc::now();
        let clock = FixedClock::new(fixed_time);

        assert_eq!(clock.now(), fixed_time);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_todayはutcの暦日を返す() {
        // 2026-03-01 23:30 UTC
        let now = DateTime::from_timestamp(1_772_407_800, 0).unwrap();
        let clock = FixedClock::new(now);

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_fixed_clock_onは指定日に固定する() {
        let clock = FixedClock::on(2026, 10, 14);

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
    }
}
