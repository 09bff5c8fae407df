//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (collect/prices/status/daemon 명령에 필요)
    pub database_url: Option<String>,
    /// 순매수 수집 설정
    pub collect: CollectConfig,
    /// CSV 내보내기 설정
    pub export: ExportConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 순매수 수집 설정
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

/// CSV 내보내기 설정
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// 목록 크기 (100이면 폴백 로더가 찾는 파일명과 일치)
    pub top_n: usize,
    /// 출력 디렉터리
    pub out_dir: String,
    /// 데이터를 찾을 때까지 되짚을 최대 일수
    pub max_days_back: u32,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 실행 주기 (초)
    pub interval_secs: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            collect: CollectConfig {
                request_delay_ms: env_var_parse("COLLECTOR_REQUEST_DELAY_MS", 500),
            },
            export: ExportConfig {
                top_n: env_var_parse("COLLECTOR_EXPORT_TOP_N", 100),
                out_dir: std::env::var("COLLECTOR_EXPORT_DIR")
                    .unwrap_or_else(|_| "./data".to_string()),
                max_days_back: env_var_parse("COLLECTOR_MAX_DAYS_BACK", 10),
            },
            daemon: DaemonConfig {
                interval_secs: env_var_parse("COLLECTOR_INTERVAL_SECS", 86_400),
            },
        }
    }

    /// DB가 필요한 명령에서 DATABASE_URL을 요구합니다.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }
}

impl CollectConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl DaemonConfig {
    /// 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
