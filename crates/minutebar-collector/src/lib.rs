//! Standalone minute candle collector.
//!
//! 이 crate는 Upbit 분봉을 로컬 파티션 저장소로 동기화하는 바이너리를 제공합니다:
//! - 마켓 카탈로그 동기화
//! - 종목별 분봉 동기화 (최신 방향 이어받기 / backfill)
//! - 저장 현황 조회

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
