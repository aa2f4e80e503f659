//! 동기화 시스템 전반에서 사용되는 공통 타입.

mod candle;
mod market;
mod time_value;

pub use candle::*;
pub use market::*;
pub use time_value::*;
