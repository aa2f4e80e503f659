//! 캔들 동기화 도메인 로직.
//!
//! - `merge`: 시각 키 기반 테이블 병합
//! - `gaps`: 샘플링 간격 기준 누락 구간 감지
//! - `fetcher`: 외부 수집기와 시계 추상화

mod fetcher;
mod gaps;
mod merge;

pub use fetcher::*;
pub use gaps::*;
pub use merge::*;
