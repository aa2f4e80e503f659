//! 거래소 시세 API 커넥터.
//!
//! 이 crate는 다음을 제공합니다:
//! - Upbit 1분봉 페이지 수집기 (`CandleFetcher` 구현)
//! - Upbit 마켓 카탈로그 조회
//! - 요청 한도 초과 / 일시적 네트워크 장애에 대한 고정 간격 재시도

pub mod connector;
pub mod error;

pub use connector::upbit::{UpbitClient, UpbitConfig};
pub use error::ExchangeError;
