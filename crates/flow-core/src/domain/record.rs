//! 순매수 레코드 및 응답 구조체.
//!
//! 파이프라인이 주고받는 데이터는 전부 이 모듈의 타입으로 표현됩니다.
//! 느슨한 맵 형태 대신 생성 시점에 정규화되는 명시적 레코드를 사용합니다.

use crate::types::{round2, InvestorClass, TradeDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 특정 (거래일, 투자자, 종목)의 순매수 거래대금.
///
/// (date, investor, ticker) 복합 키로 유일하게 식별됩니다.
/// 최초 수집 시 생성되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct NetPurchaseRecord {
    /// 거래일
    pub date: TradeDate,
    /// 투자자 구분
    pub investor: InvestorClass,
    /// 6자리 종목코드
    pub ticker: String,
    /// 종목명
    pub name: String,
    /// 순매수 거래대금 (원, 음수 = 순매도)
    pub net_buy_amount: i64,
}

impl NetPurchaseRecord {
    /// 새 레코드를 생성합니다. 종목코드는 6자리로 0-패딩됩니다.
    pub fn new(
        date: TradeDate,
        investor: InvestorClass,
        ticker: impl Into<String>,
        name: impl Into<String>,
        net_buy_amount: i64,
    ) -> Self {
        Self {
            date,
            investor,
            ticker: pad_ticker(&ticker.into()),
            name: name.into(),
            net_buy_amount,
        }
    }

    /// 순매수(양수) 여부.
    pub fn is_net_buy(&self) -> bool {
        self.net_buy_amount > 0
    }
}

/// 종목코드를 6자리로 0-패딩합니다 (예: "5930" → "005930").
pub fn pad_ticker(ticker: &str) -> String {
    format!("{:0>6}", ticker.trim())
}

/// 특정일 종가와 등락률.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct PriceQuote {
    /// 종가 (원)
    pub close_price: i64,
    /// 등락률 (%, 소수점 둘째 자리)
    pub percent_change: f64,
}

impl PriceQuote {
    /// 새 시세를 생성합니다. 등락률은 둘째 자리로 반올림됩니다.
    pub fn new(close_price: i64, percent_change: f64) -> Self {
        Self {
            close_price,
            percent_change: round2(percent_change),
        }
    }

    /// 시세를 찾지 못했을 때의 기본값.
    pub fn missing() -> Self {
        Self {
            close_price: 0,
            percent_change: 0.0,
        }
    }
}

/// 랭킹/트렌드 응답의 단일 엔트리.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct RankedEntry {
    /// 6자리 종목코드
    pub ticker: String,
    /// 종목명
    pub name: String,
    /// 순매수 거래대금 (원)
    pub net_buy_amount: i64,
    /// 종가 (원, 시세 미확인 시 0)
    pub close_price: i64,
    /// 등락률 (%)
    pub percent_change: f64,
    /// 1부터 시작하는 순위
    pub rank: u32,
}

/// 페치 결과를 공급한 계층.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DataTier {
    /// 캐시 스토어 적중
    Cache,
    /// 원격 데이터 소스
    Remote,
    /// 로컬 CSV 폴백
    LocalFile,
    /// 모든 계층 미스 (빈 테이블)
    Miss,
}

impl fmt::Display for DataTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataTier::Cache => write!(f, "cache"),
            DataTier::Remote => write!(f, "remote"),
            DataTier::LocalFile => write!(f, "local_file"),
            DataTier::Miss => write!(f, "miss"),
        }
    }
}

/// 캐시 기반 페처의 결과.
///
/// 테이블이 비어 있어도 에러가 아니며, `tier`가 어느 계층에서
/// 데이터를 얻었는지(또는 전부 미스였는지)를 나타냅니다.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// 순매수 레코드 테이블 (빈 테이블 가능)
    pub records: Vec<NetPurchaseRecord>,
    /// 데이터를 공급한 계층
    pub tier: DataTier,
}

impl FetchOutcome {
    /// 모든 계층이 미스였을 때의 결과.
    pub fn miss() -> Self {
        Self {
            records: Vec::new(),
            tier: DataTier::Miss,
        }
    }

    /// 테이블이 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 단일 거래일의 순매수/순매도 Top-N 랭킹.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct DailyRanking {
    /// 실제 데이터가 나온 거래일 (요청일에서 과거로 이동했을 수 있음)
    pub date: TradeDate,
    /// 투자자 구분
    pub investor: InvestorClass,
    /// 데이터를 공급한 계층
    pub source: DataTier,
    /// 순매수 상위 (거래대금 내림차순)
    pub buy: Vec<RankedEntry>,
    /// 순매도 상위 (거래대금 오름차순, 가장 큰 순매도부터)
    pub sell: Vec<RankedEntry>,
}

/// 기간 합산 순매수/순매도 Top-N 랭킹.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct RangeRanking {
    /// 합산 시작일
    pub start_date: TradeDate,
    /// 합산 종료일
    pub end_date: TradeDate,
    /// 투자자 구분
    pub investor: InvestorClass,
    /// 순매수 상위
    pub buy: Vec<RankedEntry>,
    /// 순매도 상위
    pub sell: Vec<RankedEntry>,
}

/// 트렌드 분석 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct TrendReport {
    /// 분석 기간 내내 순매수였던 종목 (연속 순매수)
    pub consecutive: Vec<RankedEntry>,
    /// 최근일에만 순매수로 전환된 종목 (신규 유입)
    pub new_inflow: Vec<RankedEntry>,
    /// 실제 분석된 거래일 수 (요청보다 적을 수 있음)
    pub days_analyzed: u32,
    /// 분석 구간의 가장 오래된 거래일
    pub start_date: TradeDate,
    /// 분석 구간의 가장 최근 거래일
    pub end_date: TradeDate,
}
