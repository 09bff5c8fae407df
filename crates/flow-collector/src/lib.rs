//! Standalone net purchase data collector.
//!
//! API 서버와 독립적으로 순매수 데이터를 수집하는 바이너리를 제공합니다:
//! - 일별 순매수 수집 (캐시 채우기)
//! - 폴백 CSV 내보내기 (원격 장애 대비 입력 파일)
//! - 전종목 시세 스냅샷 동기화
//! - 캐시 현황 조회

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
