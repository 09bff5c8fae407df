//! 순매수 Top-N CSV 내보내기 모듈.
//!
//! 원격 조회가 막혔을 때를 대비한 폴백 입력 파일을 생성합니다.
//! 기본 목록 크기(100)로 내보낸 파일명은 폴백 로더가 찾는 이름과 같습니다.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use flow_core::{InvestorClass, MarketDataSource, NetPurchaseRecord, TradeDate};
use flow_data::{escape_csv, FallbackSide, KrxClient};

use crate::{CollectionStats, CollectorConfig, Result};

/// 내보내기 파일 경로 (`{code}_net_{side}_top{n}_{date}.csv`).
fn export_path(
    dir: &Path,
    date: TradeDate,
    investor: InvestorClass,
    side: FallbackSide,
    top_n: usize,
) -> PathBuf {
    dir.join(format!(
        "{}_net_{}_top{}_{}.csv",
        investor.code(),
        side.as_str(),
        top_n,
        date
    ))
}

/// 순매수 목록을 CSV로 직렬화.
fn render_csv(records: &[NetPurchaseRecord]) -> String {
    let mut output = String::new();

    // 헤더
    output.push_str("ticker,name,net_buy_amount\n");

    // 데이터
    for record in records {
        output.push_str(&format!(
            "{},{},{}\n",
            record.ticker,
            escape_csv(&record.name),
            record.net_buy_amount
        ));
    }

    output
}

/// 순매수 Top-N CSV 내보내기
///
/// 요청일부터 최대 `max_days_back`일까지 하루씩 되짚으며 원격 데이터가
/// 있는 첫 거래일을 찾고, 그 날짜의 매수/매도 목록을 세 투자자 구분
/// 모두에 대해 CSV 파일로 저장합니다.
pub async fn export_fallback_csv(
    config: &CollectorConfig,
    date: TradeDate,
    top_n: usize,
    out_dir: &Path,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    fs::create_dir_all(out_dir)?;

    let remote = KrxClient::new();

    // 원격 데이터가 있는 첫 거래일 탐색 (외국인 목록으로 판정)
    let mut found = None;
    for offset in 0..=i64::from(config.export.max_days_back) {
        let candidate = date.minus_days(offset);
        match remote
            .net_purchases_by_ticker(candidate, candidate, InvestorClass::Foreigner)
            .await
        {
            Ok(rows) if !rows.is_empty() => {
                found = Some((candidate, rows));
                break;
            }
            Ok(_) => {
                tracing::debug!(date = %candidate, "데이터 없음, 하루 되짚기");
            }
            Err(e) => {
                tracing::warn!(date = %candidate, error = %e, "원격 조회 실패, 하루 되짚기");
            }
        }
    }

    let Some((found_date, foreigner_rows)) = found else {
        tracing::warn!(
            date = %date,
            max_days_back = config.export.max_days_back,
            "내보낼 데이터를 찾지 못했습니다"
        );
        stats.elapsed = start.elapsed();
        return Ok(stats);
    };

    tracing::info!(date = %found_date, "내보내기 거래일 확정");

    for class in InvestorClass::ALL {
        // 외국인은 탐색 단계에서 이미 받아둔 목록을 재사용합니다.
        let rows = if class == InvestorClass::Foreigner {
            foreigner_rows.clone()
        } else {
            match remote
                .net_purchases_by_ticker(found_date, found_date, class)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    stats.total += 2;
                    stats.errors += 2;
                    tracing::error!(investor = class.label(), error = %e, "조회 실패");
                    continue;
                }
            }
        };

        let records: Vec<NetPurchaseRecord> = rows
            .iter()
            .map(|r| NetPurchaseRecord::new(found_date, class, &r.ticker, &r.name, r.net_buy_amount))
            .collect();

        for side in [FallbackSide::Buy, FallbackSide::Sell] {
            stats.total += 1;

            let mut sorted = records.clone();
            match side {
                FallbackSide::Buy => {
                    sorted.sort_by(|a, b| b.net_buy_amount.cmp(&a.net_buy_amount));
                }
                FallbackSide::Sell => {
                    sorted.sort_by(|a, b| a.net_buy_amount.cmp(&b.net_buy_amount));
                }
            }
            sorted.truncate(top_n);

            if sorted.is_empty() {
                stats.empty += 1;
                continue;
            }

            let path = export_path(out_dir, found_date, class, side, top_n);
            match fs::write(&path, render_csv(&sorted)) {
                Ok(()) => {
                    stats.success += 1;
                    stats.total_rows += sorted.len();
                    tracing::info!(path = %path.display(), rows = sorted.len(), "CSV 저장 완료");
                }
                Err(e) => {
                    stats.errors += 1;
                    tracing::error!(path = %path.display(), error = %e, "파일 쓰기 실패");
                }
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_data::CsvFallback;

    fn date(s: &str) -> TradeDate {
        TradeDate::parse(s).unwrap()
    }

    #[test]
    fn test_export_path_matches_fallback_loader_at_default_top_n() {
        // top_n=100으로 내보낸 파일은 폴백 로더가 그대로 읽을 수 있어야 한다.
        let dir = Path::new("/tmp/flow-export");
        let fallback = CsvFallback::new(dir);
        let d = date("20250110");

        for investor in InvestorClass::ALL {
            for side in [FallbackSide::Buy, FallbackSide::Sell] {
                assert_eq!(
                    export_path(dir, d, investor, side, 100),
                    fallback.file_path(d, investor, side),
                );
            }
        }
    }

    #[test]
    fn test_render_csv_pads_and_escapes() {
        let d = date("20250110");
        let records = vec![
            NetPurchaseRecord::new(d, InvestorClass::Foreigner, "5930", "삼성전자", 1_000),
            NetPurchaseRecord::new(d, InvestorClass::Foreigner, "000660", "SK,하이닉스", -500),
        ];

        let csv = render_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "ticker,name,net_buy_amount");
        assert_eq!(lines[1], "005930,삼성전자,1000");
        assert_eq!(lines[2], "000660,\"SK,하이닉스\",-500");
    }
}
