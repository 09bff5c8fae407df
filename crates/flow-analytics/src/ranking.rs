//! 순매수 순위 엔진.
//!
//! 단일 거래일 또는 기간 합산 데이터에서 순매수 상위/순매도 상위
//! 목록을 만듭니다. 매수 목록은 순매수 금액 내림차순, 매도 목록은
//! 오름차순(가장 큰 순매도부터)이며 순위는 각 목록에서 1부터
//! 연속으로 매겨집니다.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use flow_core::{
    DailyRanking, InvestorClass, MarketDataSource, NetPurchaseRecord, PipelineTuning,
    RangeRanking, RankedEntry, TradeDate,
};
use flow_data::{quote_for, CachedNetPurchaseProvider, PriceService, PriceTable};

/// 기본 순위 목록 크기.
pub const DEFAULT_TOP_N: usize = 100;

/// 순매수 순위 엔진.
pub struct RankingEngine {
    fetcher: Arc<CachedNetPurchaseProvider>,
    prices: Arc<PriceService>,
    remote: Arc<dyn MarketDataSource>,
    tuning: PipelineTuning,
}

impl RankingEngine {
    /// 새로운 순위 엔진 생성.
    pub fn new(
        fetcher: Arc<CachedNetPurchaseProvider>,
        prices: Arc<PriceService>,
        remote: Arc<dyn MarketDataSource>,
    ) -> Self {
        Self {
            fetcher,
            prices,
            remote,
            tuning: PipelineTuning::default(),
        }
    }

    /// 날짜 되짚기 한도 튜닝 적용.
    pub fn with_tuning(mut self, tuning: PipelineTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// 단일 거래일 상위 순매수/순매도 목록.
    ///
    /// `allow_fallback`이 참이면 요청일에 데이터가 없을 때 최대
    /// `ranking_max_days_back`일(기본 10일)까지 하루씩 되짚으며 재시도하고,
    /// 거짓이면 로컬 CSV 티어와 날짜 되짚기를 모두 끄고 요청일만 조회합니다.
    /// 시세는 데이터가 나온 바로 그 날짜의 테이블만 사용합니다 (휴장일이면
    /// 모든 항목이 0/0.0).
    ///
    /// 어떤 날짜에서도 데이터를 얻지 못하면 `None`.
    pub async fn top_for_day(
        &self,
        date: TradeDate,
        investor: InvestorClass,
        top_n: usize,
        allow_fallback: bool,
    ) -> Option<DailyRanking> {
        let max_back = if allow_fallback {
            self.tuning.ranking_max_days_back
        } else {
            0
        };

        let mut current = date;
        for _ in 0..=max_back {
            let outcome = if allow_fallback {
                self.fetcher.fetch(current, investor).await
            } else {
                self.fetcher.fetch_without_local(current, investor).await
            };

            if !outcome.is_empty() {
                if current != date {
                    debug!(requested = %date, used = %current, "요청일 데이터 없음, 이전 거래일 사용");
                }

                let prices = self.prices.table_for(current).await;
                let (buy, sell) = rank_lists(&outcome.records, &prices, top_n);

                info!(
                    date = %current,
                    investor = %investor,
                    source = %outcome.tier,
                    buy = buy.len(),
                    sell = sell.len(),
                    "일별 순위 생성"
                );

                return Some(DailyRanking {
                    date: current,
                    investor,
                    source: outcome.tier,
                    buy,
                    sell,
                });
            }

            current = current.minus_days(1);
        }

        debug!(date = %date, investor = %investor, max_back = max_back, "순위 데이터 없음");
        None
    }

    /// 기간 합산 상위 순매수/순매도 목록.
    ///
    /// 기간 합산 조회는 캐시하지 않고 원격 소스를 직접 호출합니다.
    /// 시세는 `end`에 가장 가까운 거래일 테이블을 사용하며,
    /// `period_change`가 참이면 등락률을 기간 전체 등락률로 바꿔 답니다.
    pub async fn top_for_range(
        &self,
        start: TradeDate,
        end: TradeDate,
        investor: InvestorClass,
        top_n: usize,
        period_change: bool,
    ) -> Option<RangeRanking> {
        let rows = match self
            .remote
            .net_purchases_by_ticker(start, end, investor)
            .await
        {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                debug!(start = %start, end = %end, investor = %investor, "기간 합산 데이터 없음");
                return None;
            }
            Err(e) => {
                warn!(start = %start, end = %end, investor = %investor, error = %e, "기간 합산 조회 실패");
                return None;
            }
        };

        let records: Vec<NetPurchaseRecord> = rows
            .into_iter()
            .map(|r| NetPurchaseRecord::new(end, investor, r.ticker, r.name, r.net_buy_amount))
            .collect();

        let prices = self.prices.nearest_table(end).await;
        let (mut buy, mut sell) = rank_lists(&records, &prices, top_n);

        if period_change {
            self.apply_period_change(start, end, &mut buy, &mut sell)
                .await;
        }

        info!(
            start = %start,
            end = %end,
            investor = %investor,
            buy = buy.len(),
            sell = sell.len(),
            "기간 합산 순위 생성"
        );

        Some(RangeRanking {
            start_date: start,
            end_date: end,
            investor,
            buy,
            sell,
        })
    }

    /// 등락률을 단일일 값 대신 기간 전체 값으로 덮어씁니다.
    ///
    /// 조회가 실패하면 단일일 등락률을 그대로 둡니다.
    async fn apply_period_change(
        &self,
        start: TradeDate,
        end: TradeDate,
        buy: &mut [RankedEntry],
        sell: &mut [RankedEntry],
    ) {
        match self.remote.price_change_by_ticker(start, end).await {
            Ok(changes) if !changes.is_empty() => {
                let by_ticker: HashMap<&str, f64> = changes
                    .iter()
                    .map(|c| (c.ticker.as_str(), c.percent_change))
                    .collect();

                for entry in buy.iter_mut().chain(sell.iter_mut()) {
                    if let Some(pct) = by_ticker.get(entry.ticker.as_str()) {
                        entry.percent_change = flow_core::round2(*pct);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(start = %start, end = %end, error = %e, "기간 등락률 조회 실패, 단일일 등락률 유지");
            }
        }
    }
}

/// 레코드를 매수/매도 양방향으로 정렬, 절단, 보강하여 순위 목록을 만듭니다.
pub fn rank_lists(
    records: &[NetPurchaseRecord],
    prices: &PriceTable,
    top_n: usize,
) -> (Vec<RankedEntry>, Vec<RankedEntry>) {
    let mut by_buy: Vec<&NetPurchaseRecord> = records.iter().collect();
    by_buy.sort_by(|a, b| b.net_buy_amount.cmp(&a.net_buy_amount));
    let buy = build_entries(by_buy.into_iter().take(top_n), prices);

    let mut by_sell: Vec<&NetPurchaseRecord> = records.iter().collect();
    by_sell.sort_by(|a, b| a.net_buy_amount.cmp(&b.net_buy_amount));
    let sell = build_entries(by_sell.into_iter().take(top_n), prices);

    (buy, sell)
}

/// 정렬된 레코드 목록을 1부터 시작하는 순위가 달린 항목으로 변환.
fn build_entries<'a>(
    records: impl Iterator<Item = &'a NetPurchaseRecord>,
    prices: &PriceTable,
) -> Vec<RankedEntry> {
    records
        .enumerate()
        .map(|(i, record)| {
            let quote = quote_for(prices, &record.ticker);
            RankedEntry {
                ticker: record.ticker.clone(),
                name: record.name.clone(),
                net_buy_amount: record.net_buy_amount,
                close_price: quote.close_price,
                percent_change: quote.percent_change,
                rank: (i + 1) as u32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::PriceQuote;
    use proptest::prelude::*;

    fn record(ticker: &str, amount: i64) -> NetPurchaseRecord {
        NetPurchaseRecord::new(
            TradeDate::parse("20250110").unwrap(),
            InvestorClass::Foreigner,
            ticker,
            format!("종목{}", ticker),
            amount,
        )
    }

    #[test]
    fn test_buy_descending_sell_ascending() {
        let records = vec![record("000001", 300), record("000002", 500), record("000003", -100)];
        let prices = PriceTable::new();

        let (buy, sell) = rank_lists(&records, &prices, 100);

        let buy_amounts: Vec<i64> = buy.iter().map(|e| e.net_buy_amount).collect();
        assert_eq!(buy_amounts, vec![500, 300, -100]);

        let sell_amounts: Vec<i64> = sell.iter().map(|e| e.net_buy_amount).collect();
        assert_eq!(sell_amounts, vec![-100, 300, 500]);
    }

    #[test]
    fn test_top_1_scenario() {
        // A(+500), B(+300), C(-100)에서 top_n=1이면 buy=[A], sell=[C]
        let records = vec![record("000100", 500), record("000200", 300), record("000300", -100)];
        let prices = PriceTable::new();

        let (buy, sell) = rank_lists(&records, &prices, 1);

        assert_eq!(buy.len(), 1);
        assert_eq!(buy[0].ticker, "000100");
        assert_eq!(buy[0].rank, 1);

        assert_eq!(sell.len(), 1);
        assert_eq!(sell[0].ticker, "000300");
        assert_eq!(sell[0].rank, 1);
    }

    #[test]
    fn test_entries_enriched_from_price_table() {
        let records = vec![record("005930", 1_000)];
        let mut prices = PriceTable::new();
        prices.insert("005930".to_string(), PriceQuote::new(71_500, 1.254));

        let (buy, _) = rank_lists(&records, &prices, 10);

        assert_eq!(buy[0].close_price, 71_500);
        assert_eq!(buy[0].percent_change, 1.25);
    }

    #[test]
    fn test_missing_price_defaults_to_zero() {
        let records = vec![record("005930", 1_000)];
        let prices = PriceTable::new();

        let (buy, _) = rank_lists(&records, &prices, 10);

        assert_eq!(buy[0].close_price, 0);
        assert_eq!(buy[0].percent_change, 0.0);
    }

    #[test]
    fn test_truncation_keeps_rank_contiguous() {
        let records: Vec<NetPurchaseRecord> = (0..10)
            .map(|i| record(&format!("{:06}", i), i as i64 * 10))
            .collect();
        let prices = PriceTable::new();

        let (buy, _) = rank_lists(&records, &prices, 3);

        assert_eq!(buy.len(), 3);
        let ranks: Vec<u32> = buy.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    proptest! {
        /// 임의의 금액 집합에서 순위는 1..len으로 연속이고
        /// 매수 목록은 내림차순, 매도 목록은 오름차순이어야 한다.
        #[test]
        fn prop_rank_invariants(amounts in prop::collection::vec(-1_000_000i64..1_000_000, 0..40)) {
            let records: Vec<NetPurchaseRecord> = amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| record(&format!("{:06}", i), *amount))
                .collect();
            let prices = PriceTable::new();

            let (buy, sell) = rank_lists(&records, &prices, 25);

            for (i, entry) in buy.iter().enumerate() {
                prop_assert_eq!(entry.rank, (i + 1) as u32);
            }
            for pair in buy.windows(2) {
                prop_assert!(pair[0].net_buy_amount >= pair[1].net_buy_amount);
            }
            for (i, entry) in sell.iter().enumerate() {
                prop_assert_eq!(entry.rank, (i + 1) as u32);
            }
            for pair in sell.windows(2) {
                prop_assert!(pair[0].net_buy_amount <= pair[1].net_buy_amount);
            }
        }
    }
}
