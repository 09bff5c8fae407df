//! Integration tests for the MarketDataSource and NetPurchaseStore seams.
//!
//! Both traits are exercised through trait objects, the same way the
//! pipeline crates consume them: scripted fakes stand in for the remote
//! source and the Postgres cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use flow_core::{
    IndexOhlcvRow, InvestorClass, MarketDataSource, MarketPriceRow, NetPurchaseRecord,
    NetPurchaseRow, NetPurchaseStore, PriceChangeRow, PriceQuote, SourceError, StoreError,
    TradeDate,
};

/// Scripted remote source returning fixed rows.
struct ScriptedSource {
    rows: Vec<NetPurchaseRow>,
}

#[async_trait]
impl MarketDataSource for ScriptedSource {
    async fn net_purchases_by_ticker(
        &self,
        _from: TradeDate,
        _to: TradeDate,
        _investor: InvestorClass,
    ) -> Result<Vec<NetPurchaseRow>, SourceError> {
        Ok(self.rows.clone())
    }

    async fn market_ohlcv(&self, _date: TradeDate) -> Result<Vec<MarketPriceRow>, SourceError> {
        Ok(Vec::new())
    }

    async fn index_ohlcv(
        &self,
        _from: TradeDate,
        _to: TradeDate,
        _index_code: &str,
    ) -> Result<Vec<IndexOhlcvRow>, SourceError> {
        Ok(Vec::new())
    }

    async fn price_change_by_ticker(
        &self,
        _from: TradeDate,
        _to: TradeDate,
    ) -> Result<Vec<PriceChangeRow>, SourceError> {
        Ok(Vec::new())
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// In-memory store enforcing composite-key idempotence.
#[derive(Default)]
struct MemoryStore {
    rows: Mutex<HashMap<(String, InvestorClass, String), NetPurchaseRecord>>,
}

#[async_trait]
impl NetPurchaseStore for MemoryStore {
    async fn find(
        &self,
        date: TradeDate,
        investor: InvestorClass,
    ) -> Result<Vec<NetPurchaseRecord>, StoreError> {
        let rows = self.rows.lock().await;
        let mut found: Vec<NetPurchaseRecord> = rows
            .values()
            .filter(|r| r.date == date && r.investor == investor)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(found)
    }

    async fn insert_batch(&self, records: &[NetPurchaseRecord]) -> Result<usize, StoreError> {
        let mut rows = self.rows.lock().await;
        let mut inserted = 0;
        for record in records {
            let key = (record.date.to_string(), record.investor, record.ticker.clone());
            // First writer wins, like ON CONFLICT DO NOTHING
            if !rows.contains_key(&key) {
                rows.insert(key, record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn save_quotes(
        &self,
        _date: TradeDate,
        quotes: &[(String, PriceQuote)],
    ) -> Result<usize, StoreError> {
        Ok(quotes.len())
    }
}

fn record(date: TradeDate, ticker: &str, amount: i64) -> NetPurchaseRecord {
    NetPurchaseRecord::new(date, InvestorClass::Foreigner, ticker, "테스트종목", amount)
}

#[tokio::test]
async fn test_source_rows_become_padded_records() {
    let source: Arc<dyn MarketDataSource> = Arc::new(ScriptedSource {
        rows: vec![NetPurchaseRow {
            ticker: "5930".to_string(),
            name: "삼성전자".to_string(),
            net_buy_amount: 1_000,
        }],
    });
    let date = TradeDate::parse("20250110").unwrap();

    let rows = source
        .net_purchases_by_ticker(date, date, InvestorClass::Foreigner)
        .await
        .unwrap();
    let records: Vec<NetPurchaseRecord> = rows
        .iter()
        .map(|r| {
            NetPurchaseRecord::new(
                date,
                InvestorClass::Foreigner,
                &r.ticker,
                &r.name,
                r.net_buy_amount,
            )
        })
        .collect();

    // Raw four-digit codes come back zero-padded to six
    assert_eq!(records[0].ticker, "005930");
    assert!(records[0].is_net_buy());
}

#[tokio::test]
async fn test_store_insert_is_idempotent_on_composite_key() {
    let store: Arc<dyn NetPurchaseStore> = Arc::new(MemoryStore::default());
    let date = TradeDate::parse("20250110").unwrap();

    let batch = vec![record(date, "000001", 100), record(date, "000002", -50)];

    let first = store.insert_batch(&batch).await.unwrap();
    let second = store.insert_batch(&batch).await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);

    let found = store.find(date, InvestorClass::Foreigner).await.unwrap();
    assert_eq!(found.len(), 2);

    // No cross-talk between investor classes on the same date
    let other = store.find(date, InvestorClass::Individual).await.unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_empty_source_day_is_not_an_error() {
    let source: Arc<dyn MarketDataSource> = Arc::new(ScriptedSource { rows: Vec::new() });
    let date = TradeDate::parse("20250101").unwrap();

    // Holidays produce empty vectors, never Err
    let rows = source
        .net_purchases_by_ticker(date, date, InvestorClass::Institution)
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(source.source_name(), "scripted");
}
