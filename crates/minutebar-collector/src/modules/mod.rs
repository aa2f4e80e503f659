//! 데이터 수집 모듈.

pub mod candle_sync;
pub mod market_sync;
pub mod status;

pub use candle_sync::{parse_symbols, resolve_targets, sync_candles, CandleSyncOptions};
pub use market_sync::{catalog_tickers, sync_markets, CATALOG_STORE};
pub use status::{collect_status, log_status, InstrumentStatus};
