//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! TOML 파일에서 로드하고 `FLOW__` 접두사 환경 변수로 오버라이드합니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 파이프라인 휴리스틱 설정
    #[serde(default)]
    pub pipeline: PipelineTuning,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
    /// 유휴 타임아웃 (초)
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connection_timeout_secs: 30,
            idle_timeout_secs: 300,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 파이프라인 휴리스틱 설정.
///
/// 달력 윈도우 크기와 재시도 한도는 보장된 상한이 아니라 조정 가능한
/// 근사치입니다. 기본값은 운영 경험에서 나온 값입니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineTuning {
    /// 거래일 해석 윈도우 배수 (달력 일수 = multiplier * n + padding)
    pub trading_day_window_multiplier: u32,
    /// 거래일 해석 윈도우 패딩 (주말/공휴일 버퍼)
    pub trading_day_window_padding: u32,
    /// 트렌드 후보 날짜 배수 (후보 수 = multiplier * days + padding)
    pub trend_candidate_multiplier: u32,
    /// 트렌드 후보 날짜 패딩
    pub trend_candidate_padding: u32,
    /// 시세 조회 역방향 탐색 시도 횟수 (요청일 포함)
    pub price_lookback_attempts: u32,
    /// 일별 랭킹의 최대 과거 이동 일수 (allow_fallback일 때)
    pub ranking_max_days_back: u32,
    /// 트렌드 분석의 동시 원격 조회 수
    pub trend_concurrency: usize,
    /// 로컬 CSV 폴백 디렉토리
    pub fallback_dir: String,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        Self {
            trading_day_window_multiplier: 3,
            trading_day_window_padding: 20,
            trend_candidate_multiplier: 2,
            trend_candidate_padding: 5,
            price_lookback_attempts: 7,
            ranking_max_days_back: 10,
            trend_concurrency: 5,
            fallback_dir: "./data".to_string(),
        }
    }
}

impl PipelineTuning {
    /// `n`개 거래일을 찾기 위한 달력 윈도우 일수.
    pub fn trading_day_window(&self, n: u32) -> u32 {
        self.trading_day_window_multiplier * n + self.trading_day_window_padding
    }

    /// `days`개 거래일 분석을 위한 후보 달력 날짜 수.
    pub fn trend_candidates(&self, days: u32) -> usize {
        (self.trend_candidate_multiplier * days + self.trend_candidate_padding) as usize
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("FLOW")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
