//! 캐시 현황 조회 모듈.

use sqlx::PgPool;

use flow_data::PgNetPurchaseStore;

use crate::Result;

/// 캐시된 (거래일, 투자자) 조합을 최신순으로 로그에 출력합니다.
pub async fn show_cache_status(pool: &PgPool, limit: i64) -> Result<()> {
    let store = PgNetPurchaseStore::new(pool.clone());
    let summaries = store.cached_dates(limit).await?;

    if summaries.is_empty() {
        tracing::info!("캐시된 데이터가 없습니다");
        return Ok(());
    }

    tracing::info!(entries = summaries.len(), "캐시 현황 (최신순)");
    for summary in summaries {
        tracing::info!(
            date = %summary.trade_date,
            investor = %summary.investor,
            records = summary.record_count.unwrap_or(0),
            last_fetched = ?summary.last_fetched_at,
            "캐시 엔트리"
        );
    }

    Ok(())
}
