//! Standalone net purchase data collector CLI.

use std::path::Path;

use clap::{Parser, Subcommand};

use flow_collector::{modules, CollectorConfig};
use flow_core::{init_logging, InvestorClass, LogConfig, LogFormat, TradeDate};

#[derive(Parser)]
#[command(name = "flow-collector")]
#[command(about = "Investor net purchase data collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 순매수 데이터 수집 (캐시 채우기)
    Collect {
        /// 수집 거래일 (YYYYMMDD, 생략 시 어제)
        #[arg(long)]
        date: Option<String>,

        /// 투자자 구분 (foreigner | individual | institution, 생략 시 전체)
        #[arg(long)]
        investor: Option<String>,
    },

    /// 순매수 Top-N CSV 내보내기 (폴백 입력 파일 생성)
    Export {
        /// 기준 거래일 (YYYYMMDD, 생략 시 오늘부터 되짚기)
        #[arg(long)]
        date: Option<String>,

        /// 목록 크기
        #[arg(long)]
        top_n: Option<usize>,

        /// 출력 디렉터리
        #[arg(long)]
        out: Option<String>,
    },

    /// 전종목 시세 스냅샷 동기화
    Prices {
        /// 거래일 (YYYYMMDD, 생략 시 어제)
        #[arg(long)]
        date: Option<String>,
    },

    /// 캐시 현황 조회
    Status {
        /// 최대 표시 행 수
        #[arg(long, default_value_t = 30)]
        limit: i64,
    },

    /// 데몬 모드: 주기적으로 수집 + 시세 동기화 실행
    Daemon {
        /// 실행 주기 (초, 생략 시 설정값 또는 24시간)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

/// CLI 날짜 인자 파싱. 생략 시 기본 날짜.
fn parse_cli_date(raw: Option<String>, default: TradeDate) -> anyhow::Result<TradeDate> {
    match raw {
        Some(s) => TradeDate::parse(&s).map_err(|e| anyhow::anyhow!("잘못된 날짜: {}", e)),
        None => Ok(default),
    }
}

/// CLI 투자자 인자 파싱. 생략 시 None (전체 수집).
fn parse_cli_investor(raw: Option<String>) -> anyhow::Result<Option<InvestorClass>> {
    match raw {
        Some(s) => s
            .parse::<InvestorClass>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("잘못된 투자자 구분: {}", e)),
        None => Ok(None),
    }
}

/// 데이터베이스 연결.
async fn connect_db(config: &CollectorConfig) -> anyhow::Result<sqlx::PgPool> {
    let url = config.require_database_url()?;
    let pool = sqlx::PgPool::connect(url).await?;
    tracing::info!("데이터베이스 연결 성공");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _ = dotenvy::dotenv();

    // 로깅 초기화
    let log_config = LogConfig::new(format!("flow_collector={},flow_data=info", cli.log_level))
        .with_format(LogFormat::Compact);
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("Investor Flow Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env();

    match cli.command {
        Commands::Collect { date, investor } => {
            let pool = connect_db(&config).await?;
            let date = parse_cli_date(date, TradeDate::today_seoul().minus_days(1))?;
            let investor = parse_cli_investor(investor)?;

            let stats = modules::collect_net_purchases(&pool, &config, date, investor).await?;
            stats.log_summary("순매수 수집");

            pool.close().await;
        }
        Commands::Export { date, top_n, out } => {
            let date = parse_cli_date(date, TradeDate::today_seoul())?;
            let top_n = top_n.unwrap_or(config.export.top_n);
            let out_dir = out.unwrap_or_else(|| config.export.out_dir.clone());

            let stats =
                modules::export_fallback_csv(&config, date, top_n, Path::new(&out_dir)).await?;
            stats.log_summary("CSV 내보내기");
        }
        Commands::Prices { date } => {
            let pool = connect_db(&config).await?;
            let date = parse_cli_date(date, TradeDate::today_seoul().minus_days(1))?;

            let stats = modules::sync_prices(&pool, date).await?;
            stats.log_summary("시세 동기화");

            pool.close().await;
        }
        Commands::Status { limit } => {
            let pool = connect_db(&config).await?;
            modules::show_cache_status(&pool, limit).await?;
            pool.close().await;
        }
        Commands::Daemon { interval_secs } => {
            let pool = connect_db(&config).await?;
            let period = interval_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.daemon.interval());

            tracing::info!("=== 데몬 모드 시작 (주기: {}초) ===", period.as_secs());

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        let date = TradeDate::today_seoul().minus_days(1);
                        tracing::info!(date = %date, "=== 수집 주기 시작 ===");

                        // 1. 순매수 수집 (전체 투자자)
                        match modules::collect_net_purchases(&pool, &config, date, None).await {
                            Ok(stats) => stats.log_summary("순매수 수집"),
                            Err(e) => tracing::error!("순매수 수집 실패: {}", e),
                        }

                        // 2. 시세 동기화
                        match modules::sync_prices(&pool, date).await {
                            Ok(stats) => stats.log_summary("시세 동기화"),
                            Err(e) => tracing::error!("시세 동기화 실패: {}", e),
                        }

                        tracing::info!(
                            "=== 수집 주기 완료, 다음 실행: {}초 후 ===",
                            period.as_secs()
                        );
                    }
                }
            }

            pool.close().await;
        }
    }

    tracing::info!("Investor Flow Collector 종료");

    Ok(())
}
