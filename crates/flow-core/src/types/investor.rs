//! 투자자 구분 정의.
//!
//! 한국거래소 통계는 투자자 주체를 외국인 / 개인 / 기관합계로 집계합니다.
//! 이 모듈은 세 구분을 닫힌 enum으로 정의하고, 각 구분이 사용되는 세 가지
//! 표현을 함께 제공합니다:
//! - `label()` - KRX 통계 화면의 한글 라벨 (원격 계약 및 캐시 키 값)
//! - `code()` - HTTP 쿼리 파라미터와 CSV 파일명에 쓰이는 ASCII 코드
//! - `invst_tp_cd()` - KRX 정보데이터시스템 폼 데이터의 투자자 코드

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 투자자 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InvestorClass {
    /// 외국인
    Foreigner,
    /// 개인
    Individual,
    /// 기관합계
    Institution,
}

impl InvestorClass {
    /// 세 구분 전체 (수집 작업에서 순회용).
    pub const ALL: [InvestorClass; 3] = [
        InvestorClass::Foreigner,
        InvestorClass::Individual,
        InvestorClass::Institution,
    ];

    /// KRX 한글 라벨. 원격 데이터 소스 계약과 캐시 키에 사용됩니다.
    pub fn label(&self) -> &'static str {
        match self {
            InvestorClass::Foreigner => "외국인",
            InvestorClass::Individual => "개인",
            InvestorClass::Institution => "기관합계",
        }
    }

    /// ASCII 코드. HTTP 쿼리 파라미터와 CSV 파일명에 사용됩니다.
    pub fn code(&self) -> &'static str {
        match self {
            InvestorClass::Foreigner => "foreigner",
            InvestorClass::Individual => "individual",
            InvestorClass::Institution => "institution",
        }
    }

    /// KRX 정보데이터시스템 invstTpCd 값.
    pub fn invst_tp_cd(&self) -> &'static str {
        match self {
            InvestorClass::Foreigner => "9000",
            InvestorClass::Individual => "8000",
            InvestorClass::Institution => "7050",
        }
    }
}

impl fmt::Display for InvestorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for InvestorClass {
    type Err = String;

    /// ASCII 코드와 한글 라벨 둘 다 허용합니다. 그 외 입력은 거부합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foreigner" | "외국인" => Ok(InvestorClass::Foreigner),
            "individual" | "개인" => Ok(InvestorClass::Individual),
            "institution" | "기관합계" => Ok(InvestorClass::Institution),
            _ => Err(format!("Invalid investor class: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_code_mapping() {
        assert_eq!(InvestorClass::Foreigner.label(), "외국인");
        assert_eq!(InvestorClass::Foreigner.code(), "foreigner");
        assert_eq!(InvestorClass::Foreigner.invst_tp_cd(), "9000");
        assert_eq!(InvestorClass::Individual.label(), "개인");
        assert_eq!(InvestorClass::Individual.invst_tp_cd(), "8000");
        assert_eq!(InvestorClass::Institution.label(), "기관합계");
        assert_eq!(InvestorClass::Institution.invst_tp_cd(), "7050");
    }

    #[test]
    fn test_from_str_accepts_code_and_label() {
        assert_eq!(
            "foreigner".parse::<InvestorClass>().unwrap(),
            InvestorClass::Foreigner
        );
        assert_eq!(
            "기관합계".parse::<InvestorClass>().unwrap(),
            InvestorClass::Institution
        );
        assert!("retail".parse::<InvestorClass>().is_err());
        assert!("FOREIGNER".parse::<InvestorClass>().is_err());
    }

    #[test]
    fn test_serde_uses_ascii_code() {
        let json = serde_json::to_string(&InvestorClass::Institution).unwrap();
        assert_eq!(json, "\"institution\"");

        let parsed: InvestorClass = serde_json::from_str("\"foreigner\"").unwrap();
        assert_eq!(parsed, InvestorClass::Foreigner);
    }
}
