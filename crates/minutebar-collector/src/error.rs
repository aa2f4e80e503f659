//! 에러 타입 정의.

use std::fmt;

use minutebar_core::MinutebarError;
use minutebar_data::DataError;
use minutebar_exchange::ExchangeError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 저장소 / 동기화 에러
    Data(DataError),
    /// 거래소 API 에러
    Exchange(ExchangeError),
    /// 도메인 에러 (시각 형식 등)
    Core(MinutebarError),
    /// 설정 에러
    Config(String),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "Data error: {}", e),
            Self::Exchange(e) => write!(f, "Exchange error: {}", e),
            Self::Core(e) => write!(f, "Domain error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<ExchangeError> for CollectorError {
    fn from(err: ExchangeError) -> Self {
        Self::Exchange(err)
    }
}

impl From<MinutebarError> for CollectorError {
    fn from(err: MinutebarError) -> Self {
        Self::Core(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
