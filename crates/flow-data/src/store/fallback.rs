//! 로컬 CSV 폴백 저장소.
//!
//! 원격 소스와 DB 캐시가 모두 실패했을 때 마지막으로 시도하는 티어입니다.
//! 수집기의 CSV 내보내기가 떨군 파일을 그대로 읽습니다.
//!
//! # 파일 형식
//!
//! 파일명: `{투자자코드}_net_{buy|sell}_top100_{YYYYMMDD}.csv`
//!
//! ```text
//! ticker,name,net_buy_amount
//! 005930,삼성전자,123456789
//! ```
//!
//! 종목명에 콤마가 포함되면 따옴표로 감싸고 내부 따옴표는 두 번 씁니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use flow_core::{InvestorClass, NetPurchaseRecord, TradeDate};
use tracing::{debug, warn};

use crate::error::Result;

/// 매수/매도 파일 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSide {
    Buy,
    Sell,
}

impl FallbackSide {
    /// 파일명에 쓰이는 구분자.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackSide::Buy => "buy",
            FallbackSide::Sell => "sell",
        }
    }
}

/// CSV 폴백 로더.
#[derive(Debug, Clone)]
pub struct CsvFallback {
    dir: PathBuf,
}

impl CsvFallback {
    /// 폴백 디렉터리를 지정하여 생성.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 폴백 파일 경로.
    pub fn file_path(
        &self,
        date: TradeDate,
        investor: InvestorClass,
        side: FallbackSide,
    ) -> PathBuf {
        self.dir.join(format!(
            "{}_net_{}_top100_{}.csv",
            investor.code(),
            side.as_str(),
            date
        ))
    }

    /// 거래일/투자자에 해당하는 폴백 데이터를 읽습니다.
    ///
    /// 매수/매도 파일을 합치고 종목코드 기준으로 중복을 제거합니다
    /// (먼저 읽힌 행 유지). 파일이 하나도 없으면 빈 벡터를 반환합니다.
    pub fn load(&self, date: TradeDate, investor: InvestorClass) -> Result<Vec<NetPurchaseRecord>> {
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for side in [FallbackSide::Buy, FallbackSide::Sell] {
            let path = self.file_path(date, investor, side);
            if !path.exists() {
                continue;
            }

            for (ticker, name, amount) in read_rows(&path)? {
                let record = NetPurchaseRecord::new(date, investor, ticker, name, amount);
                if seen.insert(record.ticker.clone()) {
                    records.push(record);
                }
            }
        }

        debug!(
            date = %date,
            investor = %investor,
            count = records.len(),
            "CSV 폴백에서 순매수 조회"
        );

        Ok(records)
    }
}

/// CSV 파일에서 (종목코드, 종목명, 순매수금액) 행을 읽습니다.
///
/// 첫 줄은 헤더로 간주하고 건너뜁니다. 형식이 깨진 행은 경고 후 무시합니다.
fn read_rows(path: &Path) -> Result<Vec<(String, String, i64)>> {
    let content = std::fs::read_to_string(path)?;
    // 레거시 파일의 UTF-8 BOM 처리
    let content = content.trim_start_matches('\u{feff}');

    let mut rows = Vec::new();
    for line in content.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Some(row) => rows.push(row),
            None => {
                warn!(path = %path.display(), line = line, "폴백 CSV 행 형식 오류 (무시)");
            }
        }
    }

    Ok(rows)
}

/// 한 행을 파싱합니다.
///
/// 종목코드와 금액에는 콤마가 없으므로 첫 콤마와 마지막 콤마로 자르면
/// 종목명에 포함된 콤마도 안전하게 처리됩니다.
fn parse_line(line: &str) -> Option<(String, String, i64)> {
    let first = line.find(',')?;
    let last = line.rfind(',')?;
    if first == last {
        return None;
    }

    let ticker = line[..first].trim();
    let name = unescape_csv(line[first + 1..last].trim());
    let amount: i64 = line[last + 1..].trim().parse().ok()?;

    if ticker.is_empty() {
        return None;
    }

    Some((ticker.to_string(), name, amount))
}

/// CSV 따옴표 해제 (감싼 따옴표 제거, 이중 따옴표 복원).
fn unescape_csv(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].replace("\"\"", "\"")
    } else {
        s.to_string()
    }
}

/// CSV 이스케이프 (콤마나 따옴표 포함 시 따옴표로 감싸기).
///
/// 폴백 파일을 쓰는 쪽(수집기 내보내기, API CSV 응답)이 사용합니다.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flow_fallback_{}_{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(path: &Path, content: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_parse_line_plain() {
        let (ticker, name, amount) = parse_line("005930,삼성전자,123456").unwrap();
        assert_eq!(ticker, "005930");
        assert_eq!(name, "삼성전자");
        assert_eq!(amount, 123456);
    }

    #[test]
    fn test_parse_line_negative_amount() {
        let (_, _, amount) = parse_line("000660,SK하이닉스,-987").unwrap();
        assert_eq!(amount, -987);
    }

    #[test]
    fn test_parse_line_quoted_name_with_comma() {
        let (ticker, name, amount) = parse_line("069500,\"KODEX 200, TR\",500").unwrap();
        assert_eq!(ticker, "069500");
        assert_eq!(name, "KODEX 200, TR");
        assert_eq!(amount, 500);
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(parse_line("no commas here").is_none());
        assert!(parse_line("only,one").is_none());
        assert!(parse_line("005930,이름,not_a_number").is_none());
    }

    #[test]
    fn test_load_unions_and_dedupes() {
        let dir = fixture_dir("union");
        let fallback = CsvFallback::new(&dir);
        let date = TradeDate::parse("20250110").unwrap();

        write_file(
            &fallback.file_path(date, InvestorClass::Foreigner, FallbackSide::Buy),
            "ticker,name,net_buy_amount\n005930,삼성전자,1000\n000660,SK하이닉스,500\n",
        );
        write_file(
            &fallback.file_path(date, InvestorClass::Foreigner, FallbackSide::Sell),
            "ticker,name,net_buy_amount\n035720,카카오,-800\n005930,삼성전자,1000\n",
        );

        let records = fallback.load(date, InvestorClass::Foreigner).unwrap();

        // 005930은 매수 파일에서 먼저 읽혔으므로 한 번만 나와야 함
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].ticker, "005930");
        assert_eq!(records[1].ticker, "000660");
        assert_eq!(records[2].ticker, "035720");
        assert_eq!(records[2].net_buy_amount, -800);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_pads_short_ticker() {
        let dir = fixture_dir("pad");
        let fallback = CsvFallback::new(&dir);
        let date = TradeDate::parse("20250110").unwrap();

        write_file(
            &fallback.file_path(date, InvestorClass::Individual, FallbackSide::Buy),
            "ticker,name,net_buy_amount\n5930,삼성전자,77\n",
        );

        let records = fallback.load(date, InvestorClass::Individual).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, "005930");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_files_is_empty() {
        let dir = fixture_dir("missing");
        let fallback = CsvFallback::new(&dir);
        let date = TradeDate::parse("20250110").unwrap();

        let records = fallback.load(date, InvestorClass::Institution).unwrap();
        assert!(records.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_strips_bom_and_skips_bad_lines() {
        let dir = fixture_dir("bom");
        let fallback = CsvFallback::new(&dir);
        let date = TradeDate::parse("20250110").unwrap();

        write_file(
            &fallback.file_path(date, InvestorClass::Foreigner, FallbackSide::Buy),
            "\u{feff}ticker,name,net_buy_amount\n005930,삼성전자,10\ngarbage line\n",
        );

        let records = fallback.load(date, InvestorClass::Foreigner).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].net_buy_amount, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("삼성전자"), "삼성전자");
        assert_eq!(escape_csv("에코프로에이치엔,우"), "\"에코프로에이치엔,우\"");
        assert_eq!(escape_csv("a\"b"), "\"a\"\"b\"");
        // 쓰기-읽기 대칭
        assert_eq!(unescape_csv(&escape_csv("상호,상사")), "상호,상사");
    }
}
