//! 분봉 데이터 저장 및 동기화.
//!
//! 이 crate는 다음을 제공합니다:
//! - 월 단위 파티션 파일 저장소 (`PartitionedStore`)
//! - 비시계열 데이터를 위한 전체 테이블 저장 (카탈로그)
//! - 갭 채우기 / 과거 방향 / 최신 방향 확장을 조율하는 동기화 엔진 (`SyncReconciler`)

pub mod error;
pub mod storage;
pub mod sync;

pub use error::{DataError, Result};
pub use storage::{PartitionKey, PartitionedStore};
pub use sync::{SyncReconciler, SyncReport};
