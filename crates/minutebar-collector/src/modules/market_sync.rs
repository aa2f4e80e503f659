//! 마켓 카탈로그 동기화 모듈.

use std::time::Instant;

use minutebar_core::MarketInfo;
use minutebar_data::PartitionedStore;
use minutebar_exchange::UpbitClient;

use crate::{CollectionStats, Result};

/// 카탈로그 전체 테이블 이름 (`{root}/coins.json`)
pub const CATALOG_STORE: &str = "coins";

/// 거래소 마켓 목록을 받아 카탈로그 테이블을 교체
pub async fn sync_markets(store: &PartitionedStore, client: &UpbitClient) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!("마켓 카탈로그 동기화 시작");

    let mut markets = client.fetch_markets().await?;
    markets.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    let flagged = markets
        .iter()
        .filter(|m| m.warning || m.caution.any())
        .count();

    store.save_table(CATALOG_STORE, &markets).await?;

    stats.total = markets.len();
    stats.success = markets.len();
    stats.total_rows = markets.len();
    stats.elapsed = start.elapsed();

    tracing::info!(markets = markets.len(), flagged, "마켓 카탈로그 저장 완료");
    Ok(stats)
}

/// 카탈로그에서 호가 통화가 일치하는 종목 코드 목록 (정렬됨)
pub async fn catalog_tickers(store: &PartitionedStore, quote_currency: &str) -> Result<Vec<String>> {
    let markets: Vec<MarketInfo> = store.load_table(CATALOG_STORE).await?;
    let mut tickers: Vec<String> = markets
        .into_iter()
        .filter(|m| m.quote_currency().eq_ignore_ascii_case(quote_currency))
        .map(|m| m.ticker)
        .collect();
    tickers.sort();
    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minutebar_core::MarketCaution;

    fn market(ticker: &str) -> MarketInfo {
        MarketInfo {
            ticker: ticker.to_string(),
            korean_name: String::new(),
            english_name: String::new(),
            warning: false,
            caution: MarketCaution::default(),
        }
    }

    #[tokio::test]
    async fn test_catalog_tickers_filters_quote_currency() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartitionedStore::new(dir.path());
        store
            .save_table(
                CATALOG_STORE,
                &[
                    market("KRW-XRP"),
                    market("BTC-ETH"),
                    market("KRW-BTC"),
                    market("USDT-BTC"),
                ],
            )
            .await
            .unwrap();

        let tickers = catalog_tickers(&store, "krw").await.unwrap();
        assert_eq!(tickers, vec!["KRW-BTC", "KRW-XRP"]);
    }

    #[tokio::test]
    async fn test_catalog_tickers_without_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartitionedStore::new(dir.path());
        assert!(catalog_tickers(&store, "KRW").await.unwrap().is_empty());
    }
}
