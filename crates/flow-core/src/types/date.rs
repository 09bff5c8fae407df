//! 거래일 날짜 타입.
//!
//! 원격 계약과 캐시 키는 모두 8자리 `YYYYMMDD` 문자열을 사용합니다.
//! `TradeDate`는 그 표현을 생성 시점에 검증하는 래퍼입니다.
//! "오늘"은 한국 시장 기준이므로 Asia/Seoul 시간대에 고정됩니다.

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Asia::Seoul;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// `YYYYMMDD` 형식으로 직렬화되는 달력 날짜.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "utoipa-support", schema(value_type = String, example = "20250102"))]
pub struct TradeDate(NaiveDate);

impl TradeDate {
    /// 달력 날짜로부터 생성합니다.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// 8자리 `YYYYMMDD` 문자열을 파싱합니다.
    ///
    /// 자릿수가 다르거나 달력에 없는 날짜면 거부합니다.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Invalid trade date (expected YYYYMMDD): {}", s));
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|e| format!("Invalid trade date: {} - {}", s, e))
    }

    /// 서울 시간 기준 오늘 날짜.
    pub fn today_seoul() -> Self {
        Self(Utc::now().with_timezone(&Seoul).date_naive())
    }

    /// `n`일 전 달력 날짜 (거래일 아님).
    pub fn minus_days(self, n: i64) -> Self {
        Self(self.0 - Duration::days(n))
    }

    /// 이 날짜를 포함해 과거로 `count`개의 연속 달력 날짜 (내림차순).
    pub fn walk_back(self, count: usize) -> Vec<TradeDate> {
        (0..count).map(|i| self.minus_days(i as i64)).collect()
    }

    /// 내부 달력 날짜.
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for TradeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromStr for TradeDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for TradeDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for TradeDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let d = TradeDate::parse("20250102").unwrap();
        assert_eq!(d.to_string(), "20250102");
        assert_eq!(d.as_naive(), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TradeDate::parse("2025-01-02").is_err());
        assert!(TradeDate::parse("2025010").is_err());
        assert!(TradeDate::parse("202501023").is_err());
        assert!(TradeDate::parse("20250230").is_err()); // 2월 30일 없음
        assert!(TradeDate::parse("abcd0102").is_err());
    }

    #[test]
    fn test_minus_days_crosses_month() {
        let d = TradeDate::parse("20250301").unwrap();
        assert_eq!(d.minus_days(1).to_string(), "20250228");
        assert_eq!(d.minus_days(30).to_string(), "20250130");
    }

    #[test]
    fn test_walk_back_descending() {
        let d = TradeDate::parse("20250110").unwrap();
        let dates = d.walk_back(3);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0].to_string(), "20250110");
        assert_eq!(dates[1].to_string(), "20250109");
        assert_eq!(dates[2].to_string(), "20250108");
        assert!(dates[0] > dates[1] && dates[1] > dates[2]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let d = TradeDate::parse("20250102").unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"20250102\"");
        let back: TradeDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
