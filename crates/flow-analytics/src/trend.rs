//! 연속 순매수 / 신규 유입 추세 분석.
//!
//! 최근 N일의 일별 순매수 데이터를 병렬로 수집해 두 종류의 종목 집합을
//! 계산합니다.
//!
//! - 연속 순매수: 분석 대상 기간의 모든 거래일에 순매수(양수)를 기록한 종목
//! - 신규 유입: 가장 최근 거래일에만 순매수를 기록하고 이전 거래일에는
//!   기록이 없던 종목
//!
//! 휴장일에는 데이터가 비어 있으므로 후보 날짜를 여유 있게 잡은 뒤
//! 실제 데이터가 있는 날만 추려서 분석합니다.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use flow_core::{
    period_change_pct, InvestorClass, MarketDataSource, NetPurchaseRecord, PipelineTuning,
    RankedEntry, TradeDate, TrendReport,
};
use flow_data::{quote_for, PriceService, PriceTable};

/// 추세 결과 목록의 기본 상한.
pub const DEFAULT_TREND_TOP_N: usize = 20;

/// 연속 순매수 / 신규 유입 분석기.
///
/// 일별 순매수 조회는 캐시를 거치지 않고 원격 소스로 직접 나갑니다.
/// 후보일 대부분이 과거 거래일이라 재조회 빈도가 낮고, 비어 있는 휴장일
/// 응답을 캐시에 남기지 않기 위함입니다.
pub struct TrendAnalyzer {
    remote: Arc<dyn MarketDataSource>,
    prices: Arc<PriceService>,
    tuning: PipelineTuning,
}

impl TrendAnalyzer {
    pub fn new(remote: Arc<dyn MarketDataSource>, prices: Arc<PriceService>) -> Self {
        Self {
            remote,
            prices,
            tuning: PipelineTuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: PipelineTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// 오늘(서울 기준)을 끝점으로 최근 `days` 거래일의 추세를 분석합니다.
    ///
    /// 분석 가능한 거래일이 하나도 없으면 `None`을 반환합니다.
    pub async fn analyze(
        &self,
        days: u32,
        investor: InvestorClass,
        top_n: usize,
    ) -> Option<TrendReport> {
        self.analyze_from(TradeDate::today_seoul(), days, investor, top_n)
            .await
    }

    /// 끝점 날짜를 지정해 분석합니다.
    pub async fn analyze_from(
        &self,
        anchor: TradeDate,
        days: u32,
        investor: InvestorClass,
        top_n: usize,
    ) -> Option<TrendReport> {
        // 휴장일 손실을 감안해 요청 일수보다 넓은 달력일 범위를 후보로 잡는다.
        let candidates = anchor.walk_back(self.tuning.trend_candidates(days));
        debug!(
            anchor = %anchor,
            days = days,
            candidates = candidates.len(),
            investor = %investor,
            "추세 분석 시작"
        );

        let fetches = candidates.into_iter().map(|date| {
            let remote = Arc::clone(&self.remote);
            async move {
                match remote.net_purchases_by_ticker(date, date, investor).await {
                    Ok(rows) => {
                        let records: Vec<NetPurchaseRecord> = rows
                            .into_iter()
                            .map(|row| {
                                NetPurchaseRecord::new(
                                    date,
                                    investor,
                                    row.ticker,
                                    row.name,
                                    row.net_buy_amount,
                                )
                            })
                            .collect();
                        (date, records)
                    }
                    Err(e) => {
                        // 조회 실패한 날은 휴장일과 동일하게 분석에서 제외
                        debug!(date = %date, error = %e, "일별 순매수 조회 실패");
                        (date, Vec::new())
                    }
                }
            }
        });

        // 병렬 수집 (동시성 한도: trend_concurrency)
        let mut daily: Vec<(TradeDate, Vec<NetPurchaseRecord>)> = stream::iter(fetches)
            .buffer_unordered(self.tuning.trend_concurrency)
            .collect()
            .await;

        // 빈 날(휴장일/조회 실패)을 버리고 최신순으로 정렬해 요청 일수만 남긴다.
        daily.retain(|(_, records)| !records.is_empty());
        daily.sort_by(|a, b| b.0.cmp(&a.0));
        daily.truncate(days as usize);

        if daily.is_empty() {
            info!(anchor = %anchor, days = days, "분석 가능한 거래일 없음");
            return None;
        }

        let newest_date = daily[0].0;
        let oldest_date = daily[daily.len() - 1].0;

        let positive_sets: Vec<HashSet<String>> = daily
            .iter()
            .map(|(_, records)| positive_tickers(records))
            .collect();

        // 연속 순매수: 최신일 순매수 집합을 나머지 날들과 교집합
        let mut consecutive = positive_sets[0].clone();
        for set in &positive_sets[1..] {
            consecutive.retain(|ticker| set.contains(ticker));
        }

        // 신규 유입: 최신일 순매수 집합에서 이전 날들의 순매수 종목을 제거
        let mut new_inflow = positive_sets[0].clone();
        for set in &positive_sets[1..] {
            new_inflow.retain(|ticker| !set.contains(ticker));
        }

        let end_prices = self.prices.nearest_table(newest_date).await;
        let start_prices = self.prices.nearest_table(oldest_date).await;

        let today_records = &daily[0].1;
        let report = TrendReport {
            consecutive: build_trend_entries(
                &consecutive,
                today_records,
                &end_prices,
                &start_prices,
                top_n,
            ),
            new_inflow: build_trend_entries(
                &new_inflow,
                today_records,
                &end_prices,
                &start_prices,
                top_n,
            ),
            days_analyzed: daily.len() as u32,
            start_date: oldest_date,
            end_date: newest_date,
        };

        info!(
            start_date = %report.start_date,
            end_date = %report.end_date,
            days_analyzed = report.days_analyzed,
            consecutive = report.consecutive.len(),
            new_inflow = report.new_inflow.len(),
            "추세 분석 완료"
        );
        Some(report)
    }
}

/// 하루치 기록에서 순매수(양수) 종목 집합을 뽑습니다.
fn positive_tickers(records: &[NetPurchaseRecord]) -> HashSet<String> {
    records
        .iter()
        .filter(|r| r.net_buy_amount > 0)
        .map(|r| r.ticker.clone())
        .collect()
}

/// 집합에 속한 종목을 최신일 기록 기준으로 목록화합니다.
///
/// 종가는 분석 끝점의 시세를 쓰고, 등락률은 시작/끝 시세가 모두 있으면
/// 기간 등락률, 아니면 끝점의 일간 등락률을 씁니다. 순매수 금액 내림차순으로
/// 순위를 매긴 뒤 상위 `top_n`개만 남깁니다.
fn build_trend_entries(
    tickers: &HashSet<String>,
    newest_records: &[NetPurchaseRecord],
    end_prices: &PriceTable,
    start_prices: &PriceTable,
    top_n: usize,
) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = newest_records
        .iter()
        .filter(|record| tickers.contains(&record.ticker))
        .map(|record| {
            let end_quote = quote_for(end_prices, &record.ticker);
            let start_quote = quote_for(start_prices, &record.ticker);
            let percent_change =
                period_change_pct(start_quote.close_price, end_quote.close_price)
                    .unwrap_or(end_quote.percent_change);

            RankedEntry {
                ticker: record.ticker.clone(),
                name: record.name.clone(),
                net_buy_amount: record.net_buy_amount,
                close_price: end_quote.close_price,
                percent_change,
                rank: 0,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.net_buy_amount.cmp(&a.net_buy_amount));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = (i + 1) as u32;
    }
    entries.truncate(top_n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::PriceQuote;

    fn record(ticker: &str, amount: i64) -> NetPurchaseRecord {
        NetPurchaseRecord::new(
            TradeDate::parse("20250110").unwrap(),
            InvestorClass::Foreigner,
            ticker,
            format!("종목{ticker}"),
            amount,
        )
    }

    #[test]
    fn test_positive_tickers_filters_sellers() {
        let records = vec![
            record("005930", 1_000),
            record("000660", 0),
            record("035420", -500),
        ];
        let set = positive_tickers(&records);
        assert_eq!(set.len(), 1);
        assert!(set.contains("005930"));
    }

    #[test]
    fn test_trend_entries_use_period_change_when_both_prices_exist() {
        let mut end_prices = PriceTable::new();
        end_prices.insert("005930".to_string(), PriceQuote::new(11_000, 1.5));
        let mut start_prices = PriceTable::new();
        start_prices.insert("005930".to_string(), PriceQuote::new(10_000, -0.3));

        let records = vec![record("005930", 5_000)];
        let tickers: HashSet<String> = ["005930".to_string()].into();

        let entries = build_trend_entries(&tickers, &records, &end_prices, &start_prices, 10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].close_price, 11_000);
        // (11000 - 10000) / 10000 * 100 = 10.0
        assert_eq!(entries[0].percent_change, 10.0);
    }

    #[test]
    fn test_trend_entries_fall_back_to_daily_change() {
        let mut end_prices = PriceTable::new();
        end_prices.insert("005930".to_string(), PriceQuote::new(11_000, 1.5));
        // 시작 시세 없음 -> 기간 등락률 계산 불가
        let start_prices = PriceTable::new();

        let records = vec![record("005930", 5_000)];
        let tickers: HashSet<String> = ["005930".to_string()].into();

        let entries = build_trend_entries(&tickers, &records, &end_prices, &start_prices, 10);
        assert_eq!(entries[0].percent_change, 1.5);
    }

    #[test]
    fn test_trend_entries_ranked_and_truncated() {
        let records = vec![
            record("000001", 100),
            record("000002", 300),
            record("000003", 200),
        ];
        let tickers: HashSet<String> = records.iter().map(|r| r.ticker.clone()).collect();
        let prices = PriceTable::new();

        let entries = build_trend_entries(&tickers, &records, &prices, &prices, 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ticker, "000002");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].ticker, "000003");
        assert_eq!(entries[1].rank, 2);
    }

    #[test]
    fn test_trend_entries_skip_tickers_missing_from_newest_day() {
        let records = vec![record("000001", 100)];
        let tickers: HashSet<String> =
            ["000001".to_string(), "999999".to_string()].into();
        let prices = PriceTable::new();

        let entries = build_trend_entries(&tickers, &records, &prices, &prices, 10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ticker, "000001");
    }
}
