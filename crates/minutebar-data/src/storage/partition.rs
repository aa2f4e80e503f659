//! 월 단위 파티션 파일 저장소.
//!
//! # 디렉토리 구조
//!
//! ```text
//! {root}/
//! ├── coins.json                  ← 전체 테이블 모드 (카탈로그)
//! └── KRW-BTC/
//!     ├── KRW-BTC_202401.json     ← (store, 2024, 1) 파티션
//!     └── KRW-BTC_202402.json
//! ```
//!
//! 파티션 파일은 `Time, Open, High, Low, Close, Volume, TradePrice` 컬럼을 가진
//! 행의 JSON 배열입니다. 쓰기는 항상 임시 파일에 먼저 기록한 뒤 이름을 바꿔
//! 교체하므로, 도중에 실패해도 기존 파티션은 손상되지 않습니다.
//!
//! 호출 간 메모리 캐시는 없습니다. 병합 상태는 호출자가 관리합니다.

use std::path::{Path, PathBuf};

use chrono::TimeZone;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use minutebar_core::{Candle, CandleTable, CandleTime, MinutebarError, TimeValue, SEOUL};

use crate::error::{DataError, Result};

const FILE_EXT: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// 파티션 식별자 `(year, month)`.
pub type PartitionKey = (i32, u32);

/// 월 파티션 / 전체 테이블 파일 저장소.
#[derive(Debug, Clone)]
pub struct PartitionedStore {
    root: PathBuf,
}

impl PartitionedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 데이터베이스 루트 디렉토리.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 파티션 파일 경로: `{root}/{store}/{store}_{YYYY}{MM}.json`.
    pub fn partition_path(&self, store: &str, year: i32, month: u32) -> PathBuf {
        self.root
            .join(store)
            .join(format!("{}_{:04}{:02}.{}", store, year, month, FILE_EXT))
    }

    /// 전체 테이블 파일 경로: `{root}/{store}.json`.
    pub fn table_path(&self, store: &str) -> PathBuf {
        self.root.join(format!("{}.{}", store, FILE_EXT))
    }

    /// 파티션이 하나 이상 있거나 전체 테이블 파일이 있으면 true.
    pub async fn exists(&self, store: &str) -> Result<bool> {
        if path_exists(&self.table_path(store)).await? {
            return Ok(true);
        }
        Ok(!self.partition_keys(store).await?.is_empty())
    }

    /// 디스크에 있는 파티션 식별자 목록 (오름차순).
    ///
    /// 파일 이름만 보고 판단하며 형식이 맞지 않는 파일은 무시합니다.
    pub async fn partition_keys(&self, store: &str) -> Result<Vec<PartitionKey>> {
        let dir = self.root.join(store);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataError::io(&dir, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DataError::io(&dir, e))?
        {
            if let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(|name| parse_partition_name(store, name))
            {
                keys.push(key);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    /// 파티션을 읽습니다. 파일이 없으면 빈 테이블을 반환합니다.
    pub async fn load_partition(&self, store: &str, year: i32, month: u32) -> Result<CandleTable> {
        let path = self.partition_path(store, year, month);
        let rows: Vec<Candle> = match read_json(&path).await? {
            Some(rows) => rows,
            None => {
                debug!(store = store, year = year, month = month, "파티션 없음");
                return Ok(CandleTable::new());
            }
        };

        // 손으로 편집된 파일도 정렬/중복 제거 후 사용
        let table = CandleTable::from_rows(rows);
        debug!(
            store = store,
            year = year,
            month = month,
            rows = table.len(),
            "파티션 로드"
        );
        Ok(table)
    }

    /// 파티션을 원자적으로 덮어씁니다. 디렉토리가 없으면 만듭니다.
    pub async fn save_partition(
        &self,
        store: &str,
        year: i32,
        month: u32,
        table: &CandleTable,
    ) -> Result<()> {
        let path = self.partition_path(store, year, month);
        write_json_atomic(&path, table.rows()).await?;
        info!(
            store = store,
            year = year,
            month = month,
            rows = table.len(),
            first = ?table.first_time(),
            last = ?table.last_time(),
            "파티션 저장"
        );
        Ok(())
    }

    /// 가장 오래된 파티션의 월 시작 시각. 파티션이 없으면 none.
    pub async fn earliest_partition_instant(&self, store: &str) -> Result<TimeValue> {
        match self.partition_keys(store).await?.first() {
            Some(&(year, month)) => month_start(year, month),
            None => Ok(TimeValue::none()),
        }
    }

    /// 가장 최근 파티션의 월 마지막 시각. 파티션이 없으면 none.
    pub async fn latest_partition_instant(&self, store: &str) -> Result<TimeValue> {
        match self.partition_keys(store).await?.last() {
            Some(&(year, month)) => Ok(month_start(year, month)?.end_of_month()?),
            None => Ok(TimeValue::none()),
        }
    }

    /// 저장된 가장 최근 행의 시각.
    ///
    /// 최근 파티션부터 거꾸로 읽어 처음 만나는 비어 있지 않은 파티션의 마지막 행을 사용합니다.
    pub async fn latest_row_time(&self, store: &str) -> Result<Option<CandleTime>> {
        for (year, month) in self.partition_keys(store).await?.into_iter().rev() {
            let table = self.load_partition(store, year, month).await?;
            if let Some(last) = table.last_time() {
                return Ok(Some(last));
            }
        }
        Ok(None)
    }

    /// 전체 테이블 모드로 읽습니다. 파일이 없으면 빈 목록입니다.
    pub async fn load_table<T: DeserializeOwned>(&self, store: &str) -> Result<Vec<T>> {
        let path = self.table_path(store);
        let rows: Vec<T> = read_json(&path).await?.unwrap_or_default();
        debug!(store = store, rows = rows.len(), "테이블 로드");
        Ok(rows)
    }

    /// 전체 테이블 모드로 원자적으로 저장합니다.
    pub async fn save_table<T: Serialize>(&self, store: &str, rows: &[T]) -> Result<()> {
        let path = self.table_path(store);
        write_json_atomic(&path, rows).await?;
        info!(store = store, rows = rows.len(), "테이블 저장");
        Ok(())
    }
}

fn month_start(year: i32, month: u32) -> Result<TimeValue> {
    let start = SEOUL
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| {
            MinutebarError::InvalidInput(format!("잘못된 파티션 식별자: {:04}{:02}", year, month))
        })?;
    Ok(TimeValue::from(start))
}

/// `{store}_{YYYYMM}.json` 형식이면 `(year, month)`를 반환합니다.
fn parse_partition_name(store: &str, file_name: &str) -> Option<PartitionKey> {
    let stamp = file_name
        .strip_prefix(store)?
        .strip_prefix('_')?
        .strip_suffix(FILE_EXT)?
        .strip_suffix('.')?;
    if stamp.len() != 6 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = stamp[..4].parse().ok()?;
    let month: u32 = stamp[4..].parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

async fn path_exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| DataError::io(path, e))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DataError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| DataError::serialization(path, e))
}

async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DataError::io(parent, e))?;
    }

    let bytes = serde_json::to_vec(value).map_err(|e| DataError::serialization(path, e))?;
    let tmp = path.with_extension(format!("{}.{}", FILE_EXT, TMP_SUFFIX));

    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| DataError::io(&tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(DataError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partition_name() {
        assert_eq!(
            parse_partition_name("KRW-BTC", "KRW-BTC_202401.json"),
            Some((2024, 1))
        );
        assert_eq!(
            parse_partition_name("KRW-BTC", "KRW-BTC_202412.json"),
            Some((2024, 12))
        );
        assert_eq!(parse_partition_name("KRW-BTC", "KRW-BTC_202413.json"), None);
        assert_eq!(parse_partition_name("KRW-BTC", "KRW-BTC_202401.json.tmp"), None);
        assert_eq!(parse_partition_name("KRW-BTC", "KRW-ETH_202401.json"), None);
        assert_eq!(parse_partition_name("KRW-BTC", "KRW-BTC_2024.json"), None);
        assert_eq!(parse_partition_name("KRW-BTC", "notes.txt"), None);
    }

    #[test]
    fn test_paths() {
        let store = PartitionedStore::new("/data");
        assert_eq!(
            store.partition_path("KRW-BTC", 2024, 3),
            PathBuf::from("/data/KRW-BTC/KRW-BTC_202403.json")
        );
        assert_eq!(store.table_path("coins"), PathBuf::from("/data/coins.json"));
    }
}
