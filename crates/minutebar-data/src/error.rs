//! 데이터 모듈 오류 타입.

use std::path::PathBuf;

use minutebar_core::MinutebarError;
use thiserror::Error;

/// 저장소 / 동기화 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 파일 읽기/쓰기/이름 변경 실패
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 파티션 파일 직렬화/역직렬화 오류 (손상된 파일 포함)
    #[error("Serialization error at {path}: {message}")]
    Serialization { path: PathBuf, message: String },

    /// 도메인 오류 (시각 연산, 계약 위반, 수집 실패)
    #[error(transparent)]
    Core(#[from] MinutebarError),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, err: serde_json::Error) -> Self {
        DataError::Serialization {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// 저장 매체 문제로 인한 오류인지 확인합니다.
    pub fn is_storage(&self) -> bool {
        matches!(self, DataError::Io { .. } | DataError::Serialization { .. })
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
