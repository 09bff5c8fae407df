//! 시세 보강 서비스.
//!
//! 순위 목록의 각 종목에 종가와 등락률을 붙입니다. 휴장일 요청은
//! 하루씩 거슬러 올라가 가장 가까운 거래일 시세를 사용할 수 있습니다.

use std::collections::HashMap;
use std::sync::Arc;

use flow_core::{MarketDataSource, PipelineTuning, PriceQuote, TradeDate};
use tracing::{debug, warn};

/// 전종목 시세 테이블 (종목코드 → 시세).
pub type PriceTable = HashMap<String, PriceQuote>;

/// 종가/등락률 조회 서비스.
pub struct PriceService {
    remote: Arc<dyn MarketDataSource>,
    lookback_attempts: u32,
}

impl PriceService {
    /// 새로운 시세 서비스 생성.
    pub fn new(remote: Arc<dyn MarketDataSource>) -> Self {
        Self {
            remote,
            lookback_attempts: PipelineTuning::default().price_lookback_attempts,
        }
    }

    /// 조회 재시도 횟수 튜닝 적용.
    pub fn with_tuning(mut self, tuning: &PipelineTuning) -> Self {
        self.lookback_attempts = tuning.price_lookback_attempts;
        self
    }

    /// 특정 거래일의 전종목 시세 테이블. 휴장일이거나 조회에 실패하면 빈 테이블.
    pub async fn table_for(&self, date: TradeDate) -> PriceTable {
        match self.remote.market_ohlcv(date).await {
            Ok(rows) => rows
                .into_iter()
                .map(|r| (r.ticker, PriceQuote::new(r.close_price, r.percent_change)))
                .collect(),
            Err(e) => {
                warn!(date = %date, error = %e, "시세 조회 실패");
                PriceTable::new()
            }
        }
    }

    /// `date`부터 하루씩 거슬러 올라가며 처음 만나는 비어 있지 않은 시세 테이블.
    ///
    /// 총 `lookback_attempts`회(기본 7회, `date` 포함) 시도하고,
    /// 그 안에 거래일이 없으면 빈 테이블을 반환합니다.
    pub async fn nearest_table(&self, date: TradeDate) -> PriceTable {
        let mut current = date;

        for attempt in 0..self.lookback_attempts {
            let table = self.table_for(current).await;
            if !table.is_empty() {
                if attempt > 0 {
                    debug!(requested = %date, found = %current, "근접 거래일 시세 사용");
                }
                return table;
            }
            current = current.minus_days(1);
        }

        warn!(date = %date, attempts = self.lookback_attempts, "시세 테이블을 찾지 못함");
        PriceTable::new()
    }
}

/// 테이블에서 종목 시세 조회. 없으면 `(0, 0.0)`.
pub fn quote_for(table: &PriceTable, ticker: &str) -> PriceQuote {
    table.get(ticker).cloned().unwrap_or_else(PriceQuote::missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{
        IndexOhlcvRow, InvestorClass, MarketPriceRow, NetPurchaseRow, PriceChangeRow, SourceError,
    };

    /// 날짜별 시세를 스크립트대로 돌려주는 가짜 소스.
    struct ScriptedPriceSource {
        tables: HashMap<String, Vec<MarketPriceRow>>,
    }

    impl ScriptedPriceSource {
        fn with_day(date: &str, rows: Vec<(&str, i64, f64)>) -> Self {
            let mut tables = HashMap::new();
            tables.insert(
                date.to_string(),
                rows.into_iter()
                    .map(|(t, close, pct)| MarketPriceRow {
                        ticker: t.to_string(),
                        close_price: close,
                        percent_change: pct,
                    })
                    .collect(),
            );
            Self { tables }
        }
    }

    #[async_trait::async_trait]
    impl MarketDataSource for ScriptedPriceSource {
        async fn net_purchases_by_ticker(
            &self,
            _from: TradeDate,
            _to: TradeDate,
            _investor: InvestorClass,
        ) -> Result<Vec<NetPurchaseRow>, SourceError> {
            Ok(vec![])
        }

        async fn market_ohlcv(
            &self,
            date: TradeDate,
        ) -> Result<Vec<MarketPriceRow>, SourceError> {
            Ok(self.tables.get(&date.to_string()).cloned().unwrap_or_default())
        }

        async fn index_ohlcv(
            &self,
            _from: TradeDate,
            _to: TradeDate,
            _index_code: &str,
        ) -> Result<Vec<IndexOhlcvRow>, SourceError> {
            Ok(vec![])
        }

        async fn price_change_by_ticker(
            &self,
            _from: TradeDate,
            _to: TradeDate,
        ) -> Result<Vec<PriceChangeRow>, SourceError> {
            Ok(vec![])
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_table_for_exact_date() {
        let source = ScriptedPriceSource::with_day("20250110", vec![("005930", 71_500, 1.25)]);
        let service = PriceService::new(Arc::new(source));
        let date = TradeDate::parse("20250110").unwrap();

        let table = service.table_for(date).await;

        assert_eq!(table.len(), 1);
        assert_eq!(quote_for(&table, "005930").close_price, 71_500);
    }

    #[tokio::test]
    async fn test_table_for_holiday_is_empty() {
        let source = ScriptedPriceSource::with_day("20250110", vec![("005930", 71_500, 1.25)]);
        let service = PriceService::new(Arc::new(source));
        let holiday = TradeDate::parse("20250112").unwrap();

        assert!(service.table_for(holiday).await.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_table_steps_back_over_holiday() {
        // 20250112 일요일 요청, 20250110 금요일 데이터 사용
        let source = ScriptedPriceSource::with_day("20250110", vec![("005930", 71_500, 1.25)]);
        let service = PriceService::new(Arc::new(source));
        let holiday = TradeDate::parse("20250112").unwrap();

        let table = service.nearest_table(holiday).await;

        assert_eq!(table.len(), 1);
        assert_eq!(quote_for(&table, "005930").close_price, 71_500);
    }

    #[tokio::test]
    async fn test_nearest_table_respects_attempt_limit() {
        // 기본 7회 시도 범위(당일 포함 6일 전까지) 밖의 데이터는 찾지 못함
        let source = ScriptedPriceSource::with_day("20250101", vec![("005930", 70_000, 0.0)]);
        let service = PriceService::new(Arc::new(source));
        let date = TradeDate::parse("20250110").unwrap();

        assert!(service.nearest_table(date).await.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_table_finds_oldest_in_window() {
        // 6일 전 데이터는 7번째(마지막) 시도에서 발견됨
        let source = ScriptedPriceSource::with_day("20250104", vec![("005930", 70_000, 0.0)]);
        let service = PriceService::new(Arc::new(source));
        let date = TradeDate::parse("20250110").unwrap();

        let table = service.nearest_table(date).await;
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_quote_for_defaults_when_missing() {
        let table = PriceTable::new();
        let quote = quote_for(&table, "005930");

        assert_eq!(quote.close_price, 0);
        assert_eq!(quote.percent_change, 0.0);
    }
}
