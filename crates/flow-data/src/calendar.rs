//! 거래일 해석기.
//!
//! 한국 시장의 휴장일 달력을 따로 관리하는 대신, 기준 지수(KOSPI)의
//! 일별 시세 이력에 나타난 날짜를 거래일로 간주합니다.

use std::sync::Arc;

use flow_core::{MarketDataSource, PipelineTuning, TradeDate};
use tracing::{debug, warn};

/// KOSPI 지수 코드. 거래일 달력의 기준 지수입니다.
pub const KOSPI_INDEX_CODE: &str = "1001";

/// 지수 시세 이력 기반 거래일 달력.
pub struct TradingCalendar {
    remote: Arc<dyn MarketDataSource>,
    tuning: PipelineTuning,
}

impl TradingCalendar {
    /// 새로운 달력 생성.
    pub fn new(remote: Arc<dyn MarketDataSource>) -> Self {
        Self {
            remote,
            tuning: PipelineTuning::default(),
        }
    }

    /// 조회 윈도우 튜닝 적용.
    pub fn with_tuning(mut self, tuning: PipelineTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// 오늘(서울 기준)로부터 `n`번째 최근 거래일 (n=1 → 가장 최근 거래일).
    pub async fn nth_trading_day_back(&self, n: usize) -> TradeDate {
        self.nth_trading_day_back_from(TradeDate::today_seoul(), n)
            .await
    }

    /// `anchor`로부터 `n`번째 최근 거래일.
    ///
    /// 주말/휴일 비율을 고려한 휴리스틱 윈도우(`3n + 20`일, 설정 가능)로
    /// 지수 이력을 조회합니다. 지수 조회가 실패하거나 비어 있으면
    /// `anchor - n` 달력일로 근사합니다 (성능 저하 모드). 거래일 수가
    /// `n`보다 적으면 가장 오래된 거래일을 반환합니다.
    pub async fn nth_trading_day_back_from(&self, anchor: TradeDate, n: usize) -> TradeDate {
        let window = self.tuning.trading_day_window(n as u32);
        let from = anchor.minus_days(i64::from(window));

        let rows = match self.remote.index_ohlcv(from, anchor, KOSPI_INDEX_CODE).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "지수 조회 실패, 달력일로 근사");
                return anchor.minus_days(n as i64);
            }
        };

        let mut dates: Vec<TradeDate> = rows.into_iter().map(|r| r.date).collect();
        dates.sort_by(|a, b| b.cmp(a));

        if dates.is_empty() {
            warn!(anchor = %anchor, window = window, "지수 데이터 없음, 달력일로 근사");
            return anchor.minus_days(n as i64);
        }

        if let Some(date) = dates.get(n.saturating_sub(1)) {
            debug!(anchor = %anchor, n = n, resolved = %date, "거래일 해석");
            return *date;
        }

        // 윈도우 안에 거래일이 n개보다 적으면 가장 오래된 거래일로 대체
        let oldest = dates[dates.len() - 1];
        warn!(
            anchor = %anchor,
            n = n,
            available = dates.len(),
            oldest = %oldest,
            "거래일 수 부족, 가장 오래된 거래일 사용"
        );
        oldest
    }
}
