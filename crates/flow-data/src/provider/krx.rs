//! KRX(한국거래소) 데이터 소스.
//!
//! KRX 정보데이터시스템에서 투자자별 순매수 거래대금과 전종목 시세,
//! 지수 시세를 조회합니다. 모든 조회는 `getJsonData.cmd` 엔드포인트에
//! 대한 POST 폼 요청입니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use flow_data::provider::KrxClient;
//!
//! let krx = KrxClient::new();
//! let rows = krx
//!     .net_purchases_by_ticker(date, date, InvestorClass::Foreigner)
//!     .await?;
//! ```

use async_trait::async_trait;
use flow_core::{
    IndexOhlcvRow, InvestorClass, MarketDataSource, MarketPriceRow, NetPurchaseRow,
    PriceChangeRow, SourceError, TradeDate,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

/// KRX API 기본 URL.
const KRX_API_URL: &str = "https://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";

/// KRX 투자자별 순매수 상위종목 조회 bld.
const BLD_NET_PURCHASES: &str = "dbms/MDC/STAT/standard/MDCSTAT02401";

/// KRX 전종목 시세 조회 bld (일별).
const BLD_MARKET_OHLCV: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";

/// KRX 지수 일별 시세 조회 bld.
const BLD_INDEX_OHLCV: &str = "dbms/MDC/STAT/standard/MDCSTAT00301";

/// KRX 기간내 등락률 조회 bld.
const BLD_PRICE_CHANGE: &str = "dbms/MDC/STAT/standard/MDCSTAT01602";

/// KRX 요청 Referer 헤더. 없으면 KRX가 요청을 거부합니다.
const KRX_REFERER: &str = "https://data.krx.co.kr/contents/MDC/MDI/mdiLoader/index.cmd";

/// 전체 시장 구분 (KOSPI + KOSDAQ + KONEX).
const MKT_ID_ALL: &str = "ALL";

/// KRX 정보데이터시스템 API 응답 구조.
///
/// 참고: KRX 정보데이터시스템은 "output" 키를 사용하고,
/// KRX Open API는 "OutBlock_1" 키를 사용합니다.
#[derive(Debug, Deserialize)]
struct KrxApiResponse<T> {
    /// 출력 데이터 배열
    #[serde(default, alias = "OutBlock_1")]
    output: Vec<T>,
}

/// KRX 투자자별 순매수 레코드.
#[derive(Debug, Default, Deserialize)]
struct KrxNetPurchaseRecord {
    /// 종목코드
    #[serde(rename = "ISU_SRT_CD", default)]
    isu_srt_cd: String,

    /// 종목명
    #[serde(rename = "ISU_ABBRV", default)]
    isu_abbrv: String,

    /// 순매수 거래대금 (원)
    #[serde(rename = "NETBID_TRDVAL", default)]
    netbid_trdval: String,
}

/// KRX 전종목 시세 레코드.
#[derive(Debug, Default, Deserialize)]
struct KrxMarketOhlcvRecord {
    /// 종목코드
    #[serde(rename = "ISU_SRT_CD", default)]
    isu_srt_cd: String,

    /// 종가
    #[serde(rename = "TDD_CLSPRC", default)]
    close: String,

    /// 당일 등락률 (%)
    #[serde(rename = "FLUC_RT", default)]
    fluc_rt: String,
}

/// KRX 지수 일별 시세 레코드.
#[derive(Debug, Default, Deserialize)]
struct KrxIndexOhlcvRecord {
    /// 거래일자 (YYYY/MM/DD 또는 YYYYMMDD)
    #[serde(rename = "TRD_DD")]
    trd_dd: Option<String>,

    /// 지수 종가
    #[serde(rename = "CLSPRC_IDX", default)]
    clsprc_idx: String,
}

/// KRX 기간내 등락률 레코드.
#[derive(Debug, Default, Deserialize)]
struct KrxPriceChangeRecord {
    /// 종목코드
    #[serde(rename = "ISU_SRT_CD", default)]
    isu_srt_cd: String,

    /// 기간 등락률 (%)
    #[serde(rename = "FLUC_RT", default)]
    fluc_rt: String,
}

/// KRX 데이터 소스.
pub struct KrxClient {
    client: reqwest::Client,
    base_url: String,
}

impl KrxClient {
    /// 새로운 KRX 클라이언트 생성.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        Self {
            client,
            base_url: KRX_API_URL.to_string(),
        }
    }

    /// 엔드포인트 URL을 재정의한 클라이언트 생성. 주로 테스트에서 사용합니다.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut krx = Self::new();
        krx.base_url = base_url.into();
        krx
    }

    /// KRX API에 폼 요청을 보내고 output 배열을 역직렬화합니다.
    async fn fetch_rows<T: DeserializeOwned + Default>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, SourceError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Referer", KRX_REFERER)
            .form(params)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("KRX API 호출 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "KRX API 오류: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("응답 읽기 실패: {}", e)))?;

        debug!(response_len = text.len(), "KRX API 응답 수신");

        let api_response: KrxApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            SourceError::Parse(format!(
                "JSON 파싱 실패: {} - {}",
                e,
                &text[..text.len().min(200)]
            ))
        })?;

        Ok(api_response.output)
    }
}

impl Default for KrxClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for KrxClient {
    async fn net_purchases_by_ticker(
        &self,
        from: TradeDate,
        to: TradeDate,
        investor: InvestorClass,
    ) -> Result<Vec<NetPurchaseRow>, SourceError> {
        debug!(investor = %investor, from = %from, to = %to, "KRX 투자자별 순매수 조회");

        let from_s = from.to_string();
        let to_s = to.to_string();
        let params = [
            ("bld", BLD_NET_PURCHASES),
            ("mktId", MKT_ID_ALL),
            ("invstTpCd", investor.invst_tp_cd()),
            ("strtDd", from_s.as_str()),
            ("endDd", to_s.as_str()),
            ("share", "1"),
            ("money", "1"),
            ("csvxls_isNo", "false"),
        ];

        let records: Vec<KrxNetPurchaseRecord> = self.fetch_rows(&params).await?;

        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            if record.isu_srt_cd.trim().is_empty() {
                continue;
            }
            rows.push(NetPurchaseRow {
                ticker: record.isu_srt_cd.trim().to_string(),
                name: record.isu_abbrv.trim().to_string(),
                net_buy_amount: parse_krx_i64(&record.netbid_trdval)?,
            });
        }

        info!(
            investor = %investor,
            from = %from,
            to = %to,
            count = rows.len(),
            "KRX 투자자별 순매수 조회 완료"
        );

        Ok(rows)
    }

    async fn market_ohlcv(&self, date: TradeDate) -> Result<Vec<MarketPriceRow>, SourceError> {
        debug!(date = %date, "KRX 전종목 시세 조회");

        let date_s = date.to_string();
        let params = [
            ("bld", BLD_MARKET_OHLCV),
            ("mktId", MKT_ID_ALL),
            ("trdDd", date_s.as_str()),
            ("share", "1"),
            ("money", "1"),
            ("csvxls_isNo", "false"),
        ];

        let records: Vec<KrxMarketOhlcvRecord> = self.fetch_rows(&params).await?;

        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            let close_price = parse_krx_i64(&record.close)?;
            // 휴장일 응답은 전 종목 종가가 0이므로 여기서 걸러지면 빈 벡터가 됨
            if close_price == 0 {
                continue;
            }
            rows.push(MarketPriceRow {
                ticker: record.isu_srt_cd.trim().to_string(),
                close_price,
                percent_change: parse_krx_f64(&record.fluc_rt)?,
            });
        }

        info!(date = %date, count = rows.len(), "KRX 전종목 시세 조회 완료");

        Ok(rows)
    }

    async fn index_ohlcv(
        &self,
        from: TradeDate,
        to: TradeDate,
        index_code: &str,
    ) -> Result<Vec<IndexOhlcvRow>, SourceError> {
        debug!(index_code = index_code, from = %from, to = %to, "KRX 지수 시세 조회");

        // 지수 코드 형식: 그룹(1자리) + 지수(3자리), 예: KOSPI = "1001"
        if index_code.len() != 4 {
            return Err(SourceError::Parse(format!(
                "잘못된 지수 코드: {}",
                index_code
            )));
        }
        let (ind_idx, ind_idx2) = index_code.split_at(1);

        let from_s = from.to_string();
        let to_s = to.to_string();
        let params = [
            ("bld", BLD_INDEX_OHLCV),
            ("indIdx", ind_idx),
            ("indIdx2", ind_idx2),
            ("strtDd", from_s.as_str()),
            ("endDd", to_s.as_str()),
        ];

        let records: Vec<KrxIndexOhlcvRecord> = self.fetch_rows(&params).await?;

        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            let date_str = record.trd_dd.as_deref().unwrap_or("");
            if date_str.is_empty() {
                continue;
            }
            rows.push(IndexOhlcvRow {
                date: parse_krx_date(date_str)?,
                close: parse_krx_f64(&record.clsprc_idx)?,
            });
        }

        // 날짜순 정렬 (오래된 것부터)
        rows.sort_by(|a, b| a.date.cmp(&b.date));

        info!(index_code = index_code, count = rows.len(), "KRX 지수 시세 조회 완료");

        Ok(rows)
    }

    async fn price_change_by_ticker(
        &self,
        from: TradeDate,
        to: TradeDate,
    ) -> Result<Vec<PriceChangeRow>, SourceError> {
        debug!(from = %from, to = %to, "KRX 기간내 등락률 조회");

        let from_s = from.to_string();
        let to_s = to.to_string();
        let params = [
            ("bld", BLD_PRICE_CHANGE),
            ("mktId", MKT_ID_ALL),
            ("adjStkPrc", "2"), // 수정주가 사용
            ("strtDd", from_s.as_str()),
            ("endDd", to_s.as_str()),
        ];

        let records: Vec<KrxPriceChangeRecord> = self.fetch_rows(&params).await?;

        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            if record.isu_srt_cd.trim().is_empty() {
                continue;
            }
            rows.push(PriceChangeRow {
                ticker: record.isu_srt_cd.trim().to_string(),
                percent_change: parse_krx_f64(&record.fluc_rt)?,
            });
        }

        info!(from = %from, to = %to, count = rows.len(), "KRX 기간내 등락률 조회 완료");

        Ok(rows)
    }

    fn source_name(&self) -> &'static str {
        "krx"
    }
}

/// KRX 날짜 문자열 파싱 (YYYY/MM/DD 또는 YYYYMMDD).
fn parse_krx_date(s: &str) -> Result<TradeDate, SourceError> {
    let cleaned = s.replace('/', "");
    TradeDate::parse(&cleaned)
        .map_err(|e| SourceError::Parse(format!("날짜 파싱 실패: {} - {}", s, e)))
}

/// KRX 정수 문자열 파싱 (쉼표 제거).
fn parse_krx_i64(s: &str) -> Result<i64, SourceError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(0);
    }

    let cleaned = trimmed.replace(',', "");

    cleaned
        .parse::<i64>()
        .map_err(|e| SourceError::Parse(format!("숫자 파싱 실패: {} - {}", s, e)))
}

/// KRX 실수 문자열 파싱 (쉼표 제거).
fn parse_krx_f64(s: &str) -> Result<f64, SourceError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(0.0);
    }

    let cleaned = trimmed.replace(',', "");

    cleaned
        .parse::<f64>()
        .map_err(|e| SourceError::Parse(format!("숫자 파싱 실패: {} - {}", s, e)))
}
