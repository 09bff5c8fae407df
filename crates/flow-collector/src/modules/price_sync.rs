//! 시세 스냅샷 동기화 모듈.
//!
//! 특정일 전종목 종가/등락률을 보조 시세 스토어에 채워 넣습니다.
//! 핵심 조회 경로는 원격 시세를 직접 쓰므로, 이 스토어는 백필과
//! 오프라인 분석용입니다.

use std::time::Instant;

use sqlx::PgPool;

use flow_core::{MarketDataSource, NetPurchaseStore, PriceQuote, TradeDate};
use flow_data::{KrxClient, PgNetPurchaseStore};

use crate::{CollectionStats, Result};

/// 시세 스냅샷 동기화
pub async fn sync_prices(pool: &PgPool, date: TradeDate) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let store = PgNetPurchaseStore::new(pool.clone());
    store.ensure_schema().await?;

    let remote = KrxClient::new();

    tracing::info!(date = %date, "시세 스냅샷 동기화 시작");

    let rows = remote.market_ohlcv(date).await?;
    stats.total = rows.len();

    if rows.is_empty() {
        stats.empty += 1;
        tracing::warn!(date = %date, "시세 데이터 없음 (휴장일 가능)");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let quotes: Vec<(String, PriceQuote)> = rows
        .into_iter()
        .map(|row| {
            (
                row.ticker,
                PriceQuote::new(row.close_price, row.percent_change),
            )
        })
        .collect();

    let saved = store.save_quotes(date, &quotes).await?;
    stats.success = saved;
    stats.total_rows = saved;

    stats.elapsed = start.elapsed();
    Ok(stats)
}
