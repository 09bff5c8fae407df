//! 순매수 데이터 수집 모듈.
//!
//! 캐시 기반 페처를 (거래일, 투자자) 조합마다 돌려 캐시를 채웁니다.
//! 원격 조회에 성공한 결과는 페처가 곧바로 캐시에 저장합니다.

use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use flow_core::{DataTier, InvestorClass, MarketDataSource, TradeDate};
use flow_data::{CachedNetPurchaseProvider, CsvFallback, KrxClient, PgNetPurchaseStore};

use crate::{CollectionStats, CollectorConfig, Result};

/// 순매수 데이터 수집
///
/// `investor`가 `None`이면 세 투자자 구분을 모두 수집합니다.
pub async fn collect_net_purchases(
    pool: &PgPool,
    config: &CollectorConfig,
    date: TradeDate,
    investor: Option<InvestorClass>,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let store = PgNetPurchaseStore::new(pool.clone());
    store.ensure_schema().await?;

    let remote: Arc<dyn MarketDataSource> = Arc::new(KrxClient::new());
    let fetcher =
        CachedNetPurchaseProvider::new(remote, CsvFallback::new(&config.export.out_dir))
            .with_store(Arc::new(store));

    let classes: Vec<InvestorClass> = match investor {
        Some(class) => vec![class],
        None => InvestorClass::ALL.to_vec(),
    };

    tracing::info!(date = %date, classes = classes.len(), "순매수 수집 시작");

    for class in classes {
        stats.total += 1;

        let outcome = fetcher.fetch(date, class).await;
        match outcome.tier {
            DataTier::Cache => {
                stats.skipped += 1;
                tracing::debug!(
                    investor = class.label(),
                    rows = outcome.records.len(),
                    "이미 캐시됨"
                );
            }
            DataTier::Remote => {
                stats.success += 1;
                stats.total_rows += outcome.records.len();
                tracing::info!(
                    investor = class.label(),
                    rows = outcome.records.len(),
                    "원격 수집 및 저장 완료"
                );
            }
            DataTier::LocalFile => {
                // 원격이 실패하고 로컬 파일만 읽힌 경우. 캐시는 채워지지 않습니다.
                stats.errors += 1;
                tracing::warn!(
                    investor = class.label(),
                    "원격 조회 실패, 로컬 파일만 사용 가능"
                );
            }
            DataTier::Miss => {
                stats.empty += 1;
                tracing::debug!(investor = class.label(), "데이터 없음 (휴장일 또는 조회 실패)");
            }
        }

        // Rate limiting
        tokio::time::sleep(config.collect.request_delay()).await;
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
