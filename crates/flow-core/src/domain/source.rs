//! 원격 시장 데이터 소스 추상화.
//!
//! 순매수/시세/지수 데이터를 외부 제공자로부터 조회하기 위한
//! 제공자 중립 인터페이스입니다. 파이프라인은 이 trait를 통해서만
//! 원격 소스를 사용하므로, 실제 구현(KRX 스크레이핑)과 테스트용
//! 가짜 구현을 자유롭게 바꿔 끼울 수 있습니다.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{InvestorClass, TradeDate};

// =============================================================================
// 에러 타입
// =============================================================================

/// MarketDataSource 에러.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 제공자 API 에러
    #[error("API 에러: {0}")]
    Api(String),

    /// 응답 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),
}

// =============================================================================
// 원시 응답 행
// =============================================================================

/// 종목별 순매수 거래대금 행.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetPurchaseRow {
    /// 종목코드
    pub ticker: String,
    /// 종목명
    pub name: String,
    /// 순매수 거래대금 (원, 기간 조회 시 합산값)
    pub net_buy_amount: i64,
}

/// 전종목 시세 행.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketPriceRow {
    /// 종목코드
    pub ticker: String,
    /// 종가 (원)
    pub close_price: i64,
    /// 당일 등락률 (%)
    pub percent_change: f64,
}

/// 지수 일별 시세 행. 거래일 달력 열거에 사용됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOhlcvRow {
    /// 거래일
    pub date: TradeDate,
    /// 지수 종가
    pub close: f64,
}

/// 종목별 기간 등락률 행.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChangeRow {
    /// 종목코드
    pub ticker: String,
    /// 기간 등락률 (%)
    pub percent_change: f64,
}

// =============================================================================
// MarketDataSource Trait
// =============================================================================

/// 원격 시장 데이터 소스 trait.
///
/// 네 가지 조회 능력을 제공합니다. 모든 날짜는 [`TradeDate`]로 주고받으며,
/// 시장 범위는 전체 상장 시장으로 고정되어 있습니다.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 기간 내 종목별 순매수 거래대금 조회.
    ///
    /// `from == to`면 단일 거래일 조회, 기간이면 제공자가 합산한 값입니다.
    /// 휴장일 단일 조회는 빈 벡터를 반환합니다.
    async fn net_purchases_by_ticker(
        &self,
        from: TradeDate,
        to: TradeDate,
        investor: InvestorClass,
    ) -> Result<Vec<NetPurchaseRow>, SourceError>;

    /// 특정일 전종목 종가/등락률 조회. 휴장일은 빈 벡터.
    async fn market_ohlcv(&self, date: TradeDate) -> Result<Vec<MarketPriceRow>, SourceError>;

    /// 지수 일별 시세 조회.
    ///
    /// 반환된 행의 날짜들이 해당 구간의 거래일 달력입니다.
    async fn index_ohlcv(
        &self,
        from: TradeDate,
        to: TradeDate,
        index_code: &str,
    ) -> Result<Vec<IndexOhlcvRow>, SourceError>;

    /// 종목별 기간 등락률 조회 (시작일 대비 종료일).
    async fn price_change_by_ticker(
        &self,
        from: TradeDate,
        to: TradeDate,
    ) -> Result<Vec<PriceChangeRow>, SourceError>;

    /// 소스 이름 (로깅용).
    fn source_name(&self) -> &'static str;
}
