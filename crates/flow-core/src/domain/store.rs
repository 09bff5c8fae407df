//! 순매수 캐시 스토어 추상화.
//!
//! 캐시 기반 페처가 사용하는 영속 스토어의 인터페이스입니다.
//! 운영 구현은 Postgres이고, 테스트는 인메모리 구현을 사용합니다.

use async_trait::async_trait;
use thiserror::Error;

use super::record::{NetPurchaseRecord, PriceQuote};
use crate::types::{InvestorClass, TradeDate};

/// NetPurchaseStore 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 조회 에러
    #[error("조회 에러: {0}")]
    Query(String),

    /// 저장 에러
    #[error("저장 에러: {0}")]
    Insert(String),
}

/// 순매수 레코드 캐시 스토어 trait.
#[async_trait]
pub trait NetPurchaseStore: Send + Sync {
    /// (거래일, 투자자)에 캐시된 레코드 전체 조회.
    ///
    /// 캐시에 없으면 빈 벡터를 반환합니다 (에러 아님).
    async fn find(
        &self,
        date: TradeDate,
        investor: InvestorClass,
    ) -> Result<Vec<NetPurchaseRecord>, StoreError>;

    /// 레코드 일괄 저장.
    ///
    /// (date, investor, ticker) 복합 키가 이미 존재하는 행은 무시되므로
    /// 동시 중복 저장에 대해 멱등합니다. 새로 저장된 행 수를 반환합니다.
    async fn insert_batch(&self, records: &[NetPurchaseRecord]) -> Result<usize, StoreError>;

    /// 보조 시세 스토어에 특정일 시세 일괄 저장.
    ///
    /// (date, ticker) 키 충돌 시 최신 값으로 갱신합니다.
    /// 핵심 알고리즘은 이 스토어를 읽지 않습니다.
    async fn save_quotes(
        &self,
        date: TradeDate,
        quotes: &[(String, PriceQuote)],
    ) -> Result<usize, StoreError>;
}
