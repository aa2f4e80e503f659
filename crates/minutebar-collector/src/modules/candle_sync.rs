//! 분봉 동기화 모듈.
//!
//! 종목마다 `SyncReconciler::synchronize`를 실행합니다. 종목끼리는 저장 경로가
//! 분리되어 있어 설정된 동시성만큼 병렬로 처리하며, 한 종목의 실패는
//! 기록만 하고 다른 종목 처리를 멈추지 않습니다.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::Instrument;

use minutebar_core::{sync_span, TimeValue};
use minutebar_data::{PartitionedStore, SyncReconciler};

use super::market_sync::catalog_tickers;
use crate::{CollectionStats, CollectorConfig, Result};

/// 분봉 동기화 옵션
#[derive(Debug, Clone)]
pub struct CandleSyncOptions {
    /// 특정 종목만 동기화 (없으면 카탈로그 기준)
    pub symbols: Option<Vec<String>>,
    /// 요청 시작 시각 (none이면 과거 데이터 끝까지)
    pub start: TimeValue,
    /// 요청 종료 시각 (none이면 현재)
    pub end: TimeValue,
    /// 갭 채우기 / 과거 방향 확장
    pub backfill: bool,
    /// 동시 처리 종목 수
    pub concurrency: usize,
}

impl CandleSyncOptions {
    /// 환경변수 설정으로 기본 옵션 생성
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        let (start, end) = config.sync.time_range()?;
        Ok(Self {
            symbols: None,
            start,
            end,
            backfill: config.sync.backfill,
            concurrency: config.sync.concurrency,
        })
    }
}

/// 쉼표로 구분된 종목 목록 파싱 (예: "KRW-BTC, KRW-ETH")
pub fn parse_symbols(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 동기화 대상 종목 결정
pub async fn resolve_targets(
    store: &PartitionedStore,
    options: &CandleSyncOptions,
    quote_currency: &str,
) -> Result<Vec<String>> {
    match &options.symbols {
        Some(symbols) => {
            tracing::info!(count = symbols.len(), "특정 종목 동기화");
            Ok(symbols.clone())
        }
        None => {
            let tickers = catalog_tickers(store, quote_currency).await?;
            tracing::info!(
                count = tickers.len(),
                quote = quote_currency,
                "카탈로그 종목 조회 완료"
            );
            Ok(tickers)
        }
    }
}

/// 대상 종목의 분봉 동기화
pub async fn sync_candles(
    reconciler: &SyncReconciler,
    targets: &[String],
    options: &CandleSyncOptions,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    if targets.is_empty() {
        tracing::warn!("동기화할 종목이 없습니다 (sync-markets를 먼저 실행하세요)");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    tracing::info!(
        instruments = targets.len(),
        start = %options.start,
        end = %options.end,
        backfill = options.backfill,
        concurrency = options.concurrency,
        "분봉 동기화 시작"
    );

    let mut results = stream::iter(targets.iter().cloned())
        .map(|ticker| async move {
            let span = sync_span!("sync_candles", ticker);
            let result = reconciler
                .synchronize(&ticker, options.start, options.end, options.backfill)
                .instrument(span)
                .await;
            (ticker, result)
        })
        .buffer_unordered(options.concurrency.max(1));

    let mut done = 0usize;
    while let Some((ticker, result)) = results.next().await {
        done += 1;
        match result {
            Ok(report) => {
                tracing::info!(
                    instrument = %ticker,
                    progress = format!("{}/{}", done, targets.len()),
                    rows_added = report.rows_added,
                    partitions = report.partitions_written,
                    exhausted = report.history_exhausted,
                    "종목 동기화 완료"
                );
                stats.record(&report);
            }
            Err(e) => {
                tracing::error!(
                    instrument = %ticker,
                    progress = format!("{}/{}", done, targets.len()),
                    error = %e,
                    "종목 동기화 실패"
                );
                stats.record_error();
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        assert_eq!(
            parse_symbols("krw-btc, KRW-ETH,,  "),
            vec!["KRW-BTC".to_string(), "KRW-ETH".to_string()]
        );
        assert!(parse_symbols("").is_empty());
    }
}
