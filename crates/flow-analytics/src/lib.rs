//! 순매수 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 일별 / 기간 합산 순매수 순위 (매수 상위, 매도 상위)
//! - 연속 순매수 / 신규 유입 추세 분석
//!
//! # Re-exports
//!
//! - [`ranking`]: 순위 엔진 (RankingEngine, rank_lists 등)
//! - [`trend`]: 추세 분석기 (TrendAnalyzer)

pub mod ranking;
pub mod trend;

// Ranking 모듈 re-exports
pub use ranking::{rank_lists, RankingEngine, DEFAULT_TOP_N};

// Trend 모듈 re-exports
pub use trend::{TrendAnalyzer, DEFAULT_TREND_TOP_N};
