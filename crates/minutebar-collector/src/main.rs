//! Standalone minute candle collector CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use minutebar_collector::config::parse_date;
use minutebar_collector::modules::{self, CandleSyncOptions};
use minutebar_collector::{CollectorConfig, Result};
use minutebar_core::{init_logging, init_logging_from_env, CandleFetcher, LogConfig, LogFormat};
use minutebar_data::{PartitionedStore, SyncReconciler};
use minutebar_exchange::UpbitClient;

#[derive(Parser)]
#[command(name = "minutebar-collector")]
#[command(about = "Upbit minute candle collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). 없으면 RUST_LOG 사용
    #[arg(long)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact). 없으면 LOG_FORMAT 사용
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 마켓 카탈로그 동기화
    SyncMarkets,

    /// 분봉 동기화
    SyncCandles {
        /// 특정 종목만 동기화 (쉼표로 구분, 예: "KRW-BTC,KRW-ETH")
        #[arg(long)]
        symbols: Option<String>,

        /// 시작 날짜 (YYYYMMDD 또는 YYMMDD)
        #[arg(long)]
        from: Option<String>,

        /// 종료 날짜 (YYYYMMDD 또는 YYMMDD)
        #[arg(long)]
        to: Option<String>,

        /// 갭 채우기 및 과거 방향 확장
        #[arg(long)]
        backfill: bool,
    },

    /// 종목별 저장 현황 조회
    Status {
        /// 특정 종목만 조회 (쉼표로 구분)
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 전체 워크플로우 실행 (카탈로그 → 분봉)
    RunAll,

    /// 데몬 모드: 주기적으로 전체 워크플로우 실행
    Daemon,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();

    // 로깅 초기화
    match (cli.log_level.take(), cli.log_format) {
        (None, None) => init_logging_from_env()?,
        (level, format) => {
            let mut log_config = LogConfig::from_env();
            if let Some(level) = level {
                log_config.level = level;
            }
            if let Some(format) = format {
                log_config.format = format;
            }
            init_logging(log_config)?;
        }
    }

    tracing::info!("Minutebar Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(database_root = %config.database_root.display(), "설정 로드 완료");

    let store = PartitionedStore::new(&config.database_root);
    let client = Arc::new(UpbitClient::new(config.upbit.to_client_config())?);
    let fetcher: Arc<dyn CandleFetcher> = client.clone();
    let reconciler = SyncReconciler::new(store.clone(), fetcher);

    // 명령 실행
    match cli.command {
        Commands::SyncMarkets => {
            let stats = modules::sync_markets(&store, &client).await?;
            stats.log_summary("마켓 동기화");
        }
        Commands::SyncCandles {
            symbols,
            from,
            to,
            backfill,
        } => {
            let mut options = CandleSyncOptions::from_config(&config)?;
            options.symbols = symbols.as_deref().map(modules::parse_symbols);
            if from.is_some() {
                options.start = parse_date(from.as_deref())?;
            }
            if to.is_some() {
                options.end = parse_date(to.as_deref())?;
            }
            options.backfill |= backfill;

            let targets =
                modules::resolve_targets(&store, &options, &config.sync.quote_currency).await?;
            let stats = modules::sync_candles(&reconciler, &targets, &options).await?;
            stats.log_summary("분봉 동기화");
        }
        Commands::Status { symbols } => {
            let targets = match symbols.as_deref() {
                Some(s) => modules::parse_symbols(s),
                None => modules::catalog_tickers(&store, &config.sync.quote_currency).await?,
            };
            let statuses = modules::collect_status(&store, &targets).await?;
            modules::log_status(&statuses);
        }
        Commands::RunAll => {
            run_all(&store, &client, &reconciler, &config).await?;
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = run_all(&store, &client, &reconciler, &config).await {
                            tracing::error!("워크플로우 실패: {}", e);
                        }
                        tracing::info!(
                            "=== 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    tracing::info!("Minutebar Collector 종료");

    Ok(())
}

/// 카탈로그 동기화 후 카탈로그 종목 전체의 분봉 동기화
async fn run_all(
    store: &PartitionedStore,
    client: &UpbitClient,
    reconciler: &SyncReconciler,
    config: &CollectorConfig,
) -> Result<()> {
    tracing::info!("=== 전체 워크플로우 시작 ===");

    // 1. 카탈로그 동기화 (실패해도 기존 카탈로그로 진행)
    tracing::info!("Step 1/2: 마켓 동기화");
    match modules::sync_markets(store, client).await {
        Ok(stats) => stats.log_summary("마켓 동기화"),
        Err(e) => tracing::error!("마켓 동기화 실패: {}", e),
    }

    // 2. 분봉 동기화
    tracing::info!("Step 2/2: 분봉 동기화");
    let options = CandleSyncOptions::from_config(config)?;
    let targets = modules::resolve_targets(store, &options, &config.sync.quote_currency).await?;
    let stats = modules::sync_candles(reconciler, &targets, &options).await?;
    stats.log_summary("분봉 동기화");

    tracing::info!("=== 전체 워크플로우 완료 ===");
    Ok(())
}
