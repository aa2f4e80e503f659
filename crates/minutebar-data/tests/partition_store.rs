//! PartitionedStore 파일 저장소 테스트.

use chrono::{Duration, TimeZone};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use minutebar_core::{Candle, CandleTable, CandleTime, MarketCaution, MarketInfo, TimeValue, SEOUL};
use minutebar_data::{DataError, PartitionedStore};

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

fn kst(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> CandleTime {
    SEOUL.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap().fixed_offset()
}

fn table_from(start: CandleTime, count: i64) -> CandleTable {
    let rows = (0..count)
        .map(|i| Candle {
            time: start + Duration::minutes(i),
            open: dec!(100.5),
            high: dec!(101.25),
            low: dec!(99.125),
            close: dec!(100.75),
            volume: dec!(0.00012345),
            trade_price: dec!(12345.6789),
        })
        .collect();
    CandleTable::from_rows(rows)
}

fn new_store() -> (TempDir, PartitionedStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = PartitionedStore::new(dir.path());
    (dir, store)
}

// ============================================================================
// 파티션 모드
// ============================================================================

#[tokio::test]
async fn test_round_trip_preserves_rows_and_offset() {
    let (_dir, store) = new_store();
    let table = table_from(kst(2024, 1, 31, 23, 50), 10);

    store.save_partition("KRW-BTC", 2024, 1, &table).await.unwrap();
    let loaded = store.load_partition("KRW-BTC", 2024, 1).await.unwrap();

    assert_eq!(loaded, table);
    for (a, b) in loaded.iter().zip(table.iter()) {
        assert_eq!(a.time.offset(), b.time.offset());
        assert_eq!(a.volume.to_string(), "0.00012345");
    }

    let raw = std::fs::read_to_string(store.partition_path("KRW-BTC", 2024, 1)).unwrap();
    assert!(raw.contains("\"Time\":\"2024-01-31T23:50:00+09:00\""));
    assert!(raw.contains("\"TradePrice\""));
}

#[tokio::test]
async fn test_missing_partition_is_empty() {
    let (_dir, store) = new_store();
    let loaded = store.load_partition("KRW-ETH", 2020, 5).await.unwrap();
    assert!(loaded.is_empty());
    assert!(!store.exists("KRW-ETH").await.unwrap());
}

#[tokio::test]
async fn test_partition_keys_and_instants() {
    let (dir, store) = new_store();
    store
        .save_partition("KRW-BTC", 2024, 2, &table_from(kst(2024, 2, 1, 0, 0), 3))
        .await
        .unwrap();
    store
        .save_partition("KRW-BTC", 2023, 12, &table_from(kst(2023, 12, 5, 0, 0), 3))
        .await
        .unwrap();
    // 형식이 다른 파일은 무시
    std::fs::write(dir.path().join("KRW-BTC").join("notes.txt"), "memo").unwrap();

    assert!(store.exists("KRW-BTC").await.unwrap());
    assert_eq!(
        store.partition_keys("KRW-BTC").await.unwrap(),
        vec![(2023, 12), (2024, 2)]
    );

    let earliest = store.earliest_partition_instant("KRW-BTC").await.unwrap();
    assert_eq!(earliest, TimeValue::from(kst(2023, 12, 1, 0, 0)));

    let latest = store.latest_partition_instant("KRW-BTC").await.unwrap();
    assert_eq!(latest.to_local_string().unwrap(), "2024-02-29 23:59:59");
}

#[tokio::test]
async fn test_instants_are_none_without_partitions() {
    let (_dir, store) = new_store();
    assert!(store.earliest_partition_instant("KRW-XRP").await.unwrap().is_none());
    assert!(store.latest_partition_instant("KRW-XRP").await.unwrap().is_none());
    assert!(store.latest_row_time("KRW-XRP").await.unwrap().is_none());
}

#[tokio::test]
async fn test_latest_row_time_skips_empty_partition() {
    let (_dir, store) = new_store();
    store
        .save_partition("KRW-BTC", 2024, 1, &table_from(kst(2024, 1, 10, 9, 0), 5))
        .await
        .unwrap();
    store
        .save_partition("KRW-BTC", 2024, 2, &CandleTable::new())
        .await
        .unwrap();

    let latest = store.latest_row_time("KRW-BTC").await.unwrap();
    assert_eq!(latest, Some(kst(2024, 1, 10, 9, 4)));
}

#[tokio::test]
async fn test_overwrite_is_atomic_and_leaves_no_temp_file() {
    let (dir, store) = new_store();
    store
        .save_partition("KRW-BTC", 2024, 3, &table_from(kst(2024, 3, 1, 0, 0), 5))
        .await
        .unwrap();
    store
        .save_partition("KRW-BTC", 2024, 3, &table_from(kst(2024, 3, 1, 0, 0), 2))
        .await
        .unwrap();

    let loaded = store.load_partition("KRW-BTC", 2024, 3).await.unwrap();
    assert_eq!(loaded.len(), 2);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("KRW-BTC"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_corrupt_partition_is_an_error() {
    let (_dir, store) = new_store();
    let path = store.partition_path("KRW-BTC", 2024, 4);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[{\"Time\": \"garbage\"").unwrap();

    let err = store.load_partition("KRW-BTC", 2024, 4).await.unwrap_err();
    assert!(matches!(err, DataError::Serialization { .. }));
    assert!(err.is_storage());
}

#[tokio::test]
async fn test_unsorted_file_is_normalized_on_load() {
    let (_dir, store) = new_store();
    let path = store.partition_path("KRW-BTC", 2024, 5);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let row = |t: &str, c: &str| {
        format!(
            r#"{{"Time":"{t}","Open":"1","High":"1","Low":"1","Close":"{c}","Volume":"1","TradePrice":"1"}}"#
        )
    };
    let body = format!(
        "[{},{},{}]",
        row("2024-05-01T00:02:00+09:00", "3"),
        row("2024-05-01T00:01:00+09:00", "1"),
        row("2024-05-01T00:01:00+09:00", "2"),
    );
    std::fs::write(&path, body).unwrap();

    let loaded = store.load_partition("KRW-BTC", 2024, 5).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.rows()[0].close, dec!(2));
    assert_eq!(loaded.rows()[1].close, dec!(3));
}

// ============================================================================
// 전체 테이블 모드
// ============================================================================

#[tokio::test]
async fn test_whole_table_round_trip() {
    let (dir, store) = new_store();
    assert!(store.load_table::<MarketInfo>("coins").await.unwrap().is_empty());

    let markets = vec![
        MarketInfo {
            ticker: "KRW-BTC".into(),
            korean_name: "비트코인".into(),
            english_name: "Bitcoin".into(),
            warning: false,
            caution: MarketCaution::default(),
        },
        MarketInfo {
            ticker: "KRW-XRP".into(),
            korean_name: "리플".into(),
            english_name: "XRP".into(),
            warning: true,
            caution: MarketCaution {
                trading_volume_soaring: true,
                ..Default::default()
            },
        },
    ];
    store.save_table("coins", &markets).await.unwrap();

    assert!(dir.path().join("coins.json").exists());
    assert!(store.exists("coins").await.unwrap());
    let loaded: Vec<MarketInfo> = store.load_table("coins").await.unwrap();
    assert_eq!(loaded, markets);
}
