//! 데이터 접근 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - KRX 정보데이터시스템 원격 소스
//! - PostgreSQL 순매수 캐시 저장소
//! - 로컬 CSV 폴백 로더
//! - 캐시 → 원격 → 폴백 3단계 조회 파이프라인
//! - 거래일 해석기와 시세 보강 서비스

pub mod calendar;
pub mod error;
pub mod fetcher;
pub mod price;
pub mod provider;
pub mod store;

pub use error::{DataError, Result};

// 조회 파이프라인 재내보내기
pub use fetcher::CachedNetPurchaseProvider;

// KRX 데이터 소스 재내보내기
pub use provider::KrxClient;

// 저장소 타입 재내보내기
pub use store::fallback::{escape_csv, CsvFallback, FallbackSide};
pub use store::postgres::{CacheDateSummary, PgNetPurchaseStore};

// 거래일/시세 서비스 재내보내기
pub use calendar::{TradingCalendar, KOSPI_INDEX_CODE};
pub use price::{quote_for, PriceService, PriceTable};
