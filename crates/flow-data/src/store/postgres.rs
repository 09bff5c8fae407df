//! PostgreSQL 순매수 캐시 저장소.
//!
//! 조회된 투자자별 순매수 데이터를 캐시하여 같은 (거래일, 투자자) 조합의
//! 반복 요청이 원격 소스를 다시 호출하지 않게 합니다. 과거 거래일 데이터는
//! 불변이므로 만료 정책은 없습니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use flow_data::store::PgNetPurchaseStore;
//!
//! let store = PgNetPurchaseStore::new(pool);
//! store.ensure_schema().await?;
//! let records = store.find(date, InvestorClass::Foreigner).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flow_core::{InvestorClass, NetPurchaseRecord, NetPurchaseStore, PriceQuote, StoreError, TradeDate};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, info};

use crate::error::Result;

/// 순매수 데이터베이스 행.
///
/// 거래일/투자자는 조회 조건으로 이미 알고 있으므로 포함하지 않습니다.
#[derive(Debug, Clone, FromRow)]
struct NetPurchaseDbRow {
    ticker: String,
    name: String,
    net_buy_amount: i64,
}

impl NetPurchaseDbRow {
    /// 도메인 레코드로 변환.
    fn into_record(self, date: TradeDate, investor: InvestorClass) -> NetPurchaseRecord {
        NetPurchaseRecord::new(date, investor, self.ticker, self.name, self.net_buy_amount)
    }
}

/// 캐시 메타데이터 행. 수집기 상태 보고에 사용됩니다.
#[derive(Debug, Clone, FromRow)]
pub struct CacheDateSummary {
    pub trade_date: String,
    pub investor: String,
    pub record_count: Option<i64>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// PostgreSQL 순매수 저장소.
#[derive(Clone)]
pub struct PgNetPurchaseStore {
    pool: PgPool,
}

impl PgNetPurchaseStore {
    /// 새로운 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 테이블이 없으면 생성합니다.
    ///
    /// 마이그레이션 도구 없이 기동 시 1회 호출하는 방식입니다.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS net_purchases (
                trade_date      TEXT        NOT NULL,
                investor        TEXT        NOT NULL,
                ticker          TEXT        NOT NULL,
                name            TEXT        NOT NULL,
                net_buy_amount  BIGINT      NOT NULL,
                fetched_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (trade_date, investor, ticker)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_quotes (
                trade_date      TEXT             NOT NULL,
                ticker          TEXT             NOT NULL,
                close_price     BIGINT           NOT NULL,
                percent_change  DOUBLE PRECISION NOT NULL,
                fetched_at      TIMESTAMPTZ      NOT NULL DEFAULT NOW(),
                PRIMARY KEY (trade_date, ticker)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("데이터베이스 스키마 확인 완료");
        Ok(())
    }

    /// 캐시된 (거래일, 투자자) 조합 요약 조회.
    pub async fn cached_dates(&self, limit: i64) -> Result<Vec<CacheDateSummary>> {
        let rows: Vec<CacheDateSummary> = sqlx::query_as(
            r#"
            SELECT trade_date, investor, COUNT(*) AS record_count, MAX(fetched_at) AS last_fetched_at
            FROM net_purchases
            GROUP BY trade_date, investor
            ORDER BY trade_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl NetPurchaseStore for PgNetPurchaseStore {
    async fn find(
        &self,
        date: TradeDate,
        investor: InvestorClass,
    ) -> std::result::Result<Vec<NetPurchaseRecord>, StoreError> {
        let rows: Vec<NetPurchaseDbRow> = sqlx::query_as(
            r#"
            SELECT ticker, name, net_buy_amount
            FROM net_purchases
            WHERE trade_date = $1 AND investor = $2
            ORDER BY net_buy_amount DESC
            "#,
        )
        .bind(date.to_string())
        .bind(investor.label())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(
            date = %date,
            investor = %investor,
            count = rows.len(),
            "캐시에서 순매수 조회"
        );

        Ok(rows
            .into_iter()
            .map(|r| r.into_record(date, investor))
            .collect())
    }

    async fn insert_batch(
        &self,
        records: &[NetPurchaseRecord],
    ) -> std::result::Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;

        // UNNEST 패턴으로 일괄 삽입 (N+1 쿼리 문제 해결)
        for chunk in records.chunks(500) {
            let trade_dates: Vec<String> = chunk.iter().map(|r| r.date.to_string()).collect();
            let investors: Vec<&str> = chunk.iter().map(|r| r.investor.label()).collect();
            let tickers: Vec<&str> = chunk.iter().map(|r| r.ticker.as_str()).collect();
            let names: Vec<&str> = chunk.iter().map(|r| r.name.as_str()).collect();
            let amounts: Vec<i64> = chunk.iter().map(|r| r.net_buy_amount).collect();

            // 동시에 같은 날짜를 적재해도 먼저 들어간 행이 이깁니다
            let result = sqlx::query(
                r#"
                INSERT INTO net_purchases
                    (trade_date, investor, ticker, name, net_buy_amount, fetched_at)
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::text[], $4::text[], $5::bigint[]
                ), NOW()
                ON CONFLICT (trade_date, investor, ticker) DO NOTHING
                "#,
            )
            .bind(&trade_dates)
            .bind(&investors)
            .bind(&tickers)
            .bind(&names)
            .bind(&amounts)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

            inserted += result.rows_affected() as usize;
        }

        info!(inserted = inserted, total = records.len(), "순매수 데이터 캐시에 저장");

        Ok(inserted)
    }

    async fn save_quotes(
        &self,
        date: TradeDate,
        quotes: &[(String, PriceQuote)],
    ) -> std::result::Result<usize, StoreError> {
        if quotes.is_empty() {
            return Ok(0);
        }

        let date_str = date.to_string();
        let mut saved = 0;

        for chunk in quotes.chunks(500) {
            let trade_dates: Vec<&str> = chunk.iter().map(|_| date_str.as_str()).collect();
            let tickers: Vec<&str> = chunk.iter().map(|(t, _)| t.as_str()).collect();
            let closes: Vec<i64> = chunk.iter().map(|(_, q)| q.close_price).collect();
            let changes: Vec<f64> = chunk.iter().map(|(_, q)| q.percent_change).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO price_quotes
                    (trade_date, ticker, close_price, percent_change, fetched_at)
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::bigint[], $4::double precision[]
                ), NOW()
                ON CONFLICT (trade_date, ticker) DO UPDATE SET
                    close_price = EXCLUDED.close_price,
                    percent_change = EXCLUDED.percent_change,
                    fetched_at = NOW()
                "#,
            )
            .bind(&trade_dates)
            .bind(&tickers)
            .bind(&closes)
            .bind(&changes)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

            saved += result.rows_affected() as usize;
        }

        info!(date = %date, saved = saved, "시세 데이터 저장");

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_row_into_record_pads_ticker() {
        let row = NetPurchaseDbRow {
            ticker: "5930".to_string(),
            name: "삼성전자".to_string(),
            net_buy_amount: 1_000,
        };
        let date = TradeDate::parse("20250110").unwrap();
        let record = row.into_record(date, InvestorClass::Foreigner);

        assert_eq!(record.ticker, "005930");
        assert_eq!(record.investor, InvestorClass::Foreigner);
        assert_eq!(record.date, date);
        assert_eq!(record.net_buy_amount, 1_000);
    }
}
