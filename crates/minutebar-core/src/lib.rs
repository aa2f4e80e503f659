//! # Minutebar Core
//!
//! 분봉 시계열 동기화 시스템의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 I/O 없이 다음을 제공합니다:
//! - 타임존을 가진 시각 래퍼 (`TimeValue`)
//! - 분봉 캔들 및 캔들 테이블
//! - 캔들 테이블 병합 / 갭 감지
//! - 외부 캔들 수집기 및 시계 추상화
//! - 마켓(종목) 카탈로그 항목
//! - 에러 타입과 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
