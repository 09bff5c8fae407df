//! 캐시 우선 순매수 조회 파이프라인.
//!
//! 세 티어를 순서대로 시도하고 처음 성공한 결과를 반환합니다.
//!
//! 1. DB 캐시 (과거 거래일 데이터는 불변이므로 만료 없음)
//! 2. 원격 소스 (성공 시 캐시에 저장)
//! 3. 로컬 CSV 폴백
//!
//! 어떤 티어도 데이터를 내놓지 못하면 빈 결과를 반환합니다.
//! 이 파이프라인은 에러를 밖으로 던지지 않습니다. 티어 실패는
//! 경고 로그만 남기고 다음 티어로 넘어갑니다.

use std::collections::HashMap;
use std::sync::Arc;

use flow_core::{
    DataTier, FetchOutcome, InvestorClass, MarketDataSource, NetPurchaseRecord, NetPurchaseStore,
    TradeDate,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::store::CsvFallback;

/// (거래일, 투자자) 단위 조회 잠금 맵.
type FetchLockMap = Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>;

/// 캐시 우선 순매수 제공자.
///
/// 같은 (거래일, 투자자) 조합의 동시 요청은 잠금으로 직렬화되어
/// 원격 소스를 한 번만 호출합니다.
pub struct CachedNetPurchaseProvider {
    remote: Arc<dyn MarketDataSource>,
    store: Option<Arc<dyn NetPurchaseStore>>,
    fallback: CsvFallback,
    /// 동시성 제어를 위한 Lock 맵
    fetch_locks: FetchLockMap,
}

impl CachedNetPurchaseProvider {
    /// 새로운 제공자 생성. DB 캐시 없이 동작합니다.
    pub fn new(remote: Arc<dyn MarketDataSource>, fallback: CsvFallback) -> Self {
        Self {
            remote,
            store: None,
            fallback,
            fetch_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// DB 캐시 저장소 연결.
    pub fn with_store(mut self, store: Arc<dyn NetPurchaseStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 순매수 데이터 조회 (캐시 → 원격 → 로컬 CSV).
    pub async fn fetch(&self, date: TradeDate, investor: InvestorClass) -> FetchOutcome {
        self.fetch_inner(date, investor, true).await
    }

    /// 로컬 CSV 티어를 제외한 조회 (캐시 → 원격).
    ///
    /// 실거래 데이터만 허용해야 하는 경로(내보내기 등)에서 사용합니다.
    pub async fn fetch_without_local(
        &self,
        date: TradeDate,
        investor: InvestorClass,
    ) -> FetchOutcome {
        self.fetch_inner(date, investor, false).await
    }

    async fn fetch_inner(
        &self,
        date: TradeDate,
        investor: InvestorClass,
        allow_local: bool,
    ) -> FetchOutcome {
        // 같은 조합의 동시 조회는 원격 소스를 중복 호출하지 않도록 직렬화
        let lock_key = format!("{}:{}", date, investor.code());
        let lock = self.get_or_create_lock(&lock_key).await;
        let _guard = lock.write().await;

        // 1. DB 캐시
        if let Some(store) = &self.store {
            match store.find(date, investor).await {
                Ok(records) if !records.is_empty() => {
                    debug!(date = %date, investor = %investor, count = records.len(), "캐시 적중");
                    return FetchOutcome {
                        records,
                        tier: DataTier::Cache,
                    };
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(date = %date, investor = %investor, error = %e, "캐시 조회 실패");
                }
            }
        }

        // 2. 원격 소스
        match self
            .remote
            .net_purchases_by_ticker(date, date, investor)
            .await
        {
            Ok(rows) if !rows.is_empty() => {
                let records: Vec<NetPurchaseRecord> = rows
                    .into_iter()
                    .map(|r| NetPurchaseRecord::new(date, investor, r.ticker, r.name, r.net_buy_amount))
                    .collect();

                if let Some(store) = &self.store {
                    if let Err(e) = store.insert_batch(&records).await {
                        warn!(date = %date, investor = %investor, error = %e, "캐시 저장 실패");
                    }
                }

                info!(
                    date = %date,
                    investor = %investor,
                    count = records.len(),
                    source = self.remote.source_name(),
                    "원격 소스에서 순매수 조회"
                );
                return FetchOutcome {
                    records,
                    tier: DataTier::Remote,
                };
            }
            Ok(_) => {
                debug!(date = %date, investor = %investor, "원격 소스 데이터 없음 (휴장일 가능성)");
            }
            Err(e) => {
                warn!(date = %date, investor = %investor, error = %e, "원격 소스 조회 실패");
            }
        }

        // 3. 로컬 CSV 폴백
        if allow_local {
            match self.fallback.load(date, investor) {
                Ok(records) if !records.is_empty() => {
                    info!(date = %date, investor = %investor, count = records.len(), "CSV 폴백 사용");
                    return FetchOutcome {
                        records,
                        tier: DataTier::LocalFile,
                    };
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(date = %date, investor = %investor, error = %e, "CSV 폴백 읽기 실패");
                }
            }
        }

        debug!(date = %date, investor = %investor, "모든 티어 실패");
        FetchOutcome::miss()
    }

    /// 동시성 제어를 위한 Lock 획득 또는 생성.
    async fn get_or_create_lock(&self, key: &str) -> Arc<RwLock<()>> {
        let locks = self.fetch_locks.read().await;
        if let Some(lock) = locks.get(key) {
            return lock.clone();
        }
        drop(locks);

        let mut locks = self.fetch_locks.write().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::SourceError;

    struct NeverSource;

    #[async_trait::async_trait]
    impl MarketDataSource for NeverSource {
        async fn net_purchases_by_ticker(
            &self,
            _from: TradeDate,
            _to: TradeDate,
            _investor: InvestorClass,
        ) -> Result<Vec<flow_core::NetPurchaseRow>, SourceError> {
            Err(SourceError::Network("unreachable".to_string()))
        }

        async fn market_ohlcv(
            &self,
            _date: TradeDate,
        ) -> Result<Vec<flow_core::MarketPriceRow>, SourceError> {
            Err(SourceError::Network("unreachable".to_string()))
        }

        async fn index_ohlcv(
            &self,
            _from: TradeDate,
            _to: TradeDate,
            _index_code: &str,
        ) -> Result<Vec<flow_core::IndexOhlcvRow>, SourceError> {
            Err(SourceError::Network("unreachable".to_string()))
        }

        async fn price_change_by_ticker(
            &self,
            _from: TradeDate,
            _to: TradeDate,
        ) -> Result<Vec<flow_core::PriceChangeRow>, SourceError> {
            Err(SourceError::Network("unreachable".to_string()))
        }

        fn source_name(&self) -> &'static str {
            "never"
        }
    }

    fn provider_without_files() -> CachedNetPurchaseProvider {
        let dir = std::env::temp_dir().join(format!("flow_fetcher_{}", std::process::id()));
        CachedNetPurchaseProvider::new(Arc::new(NeverSource), CsvFallback::new(dir))
    }

    #[tokio::test]
    async fn test_lock_map_reuses_locks() {
        let provider = provider_without_files();

        let a = provider.get_or_create_lock("20250110:foreigner").await;
        let b = provider.get_or_create_lock("20250110:foreigner").await;
        let c = provider.get_or_create_lock("20250110:individual").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_total_miss_returns_empty_outcome() {
        let provider = provider_without_files();
        let date = TradeDate::parse("20250110").unwrap();

        let outcome = provider.fetch(date, InvestorClass::Foreigner).await;

        assert!(outcome.is_empty());
        assert_eq!(outcome.tier, DataTier::Miss);
    }
}
