//! Behavior every `RateStore` backend must share.

use crate::RateStore;
use bcv_core::{source_midnight, Rate};
use chrono::{DateTime, FixedOffset, NaiveDate};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn day(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
    source_midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

pub fn rate(y: i32, m: u32, d: u32, value: Decimal) -> Rate {
    Rate::new(day(y, m, d), value)
}

pub async fn upsert_is_idempotent(store: &dyn RateStore) {
    let batch = vec![rate(2024, 1, 2, dec!(36.10)), rate(2024, 1, 3, dec!(36.20))];

    assert_eq!(store.upsert_many(&batch).await.unwrap(), 2);
    assert_eq!(store.upsert_many(&batch).await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 2);
}

pub async fn upsert_never_overwrites(store: &dyn RateStore) {
    store
        .upsert_many(&[rate(2024, 1, 2, dec!(36.10))])
        .await
        .unwrap();

    let inserted = store
        .upsert_many(&[rate(2024, 1, 2, dec!(99.99)), rate(2024, 1, 4, dec!(36.30))])
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let kept = store.latest_at_or_before(day(2024, 1, 3)).await.unwrap().unwrap();
    assert_eq!(kept.value, dec!(36.10));
}

pub async fn point_query_boundaries(store: &dyn RateStore) {
    store
        .upsert_many(&[rate(2020, 3, 30, dec!(0.0737)), rate(2020, 4, 2, dec!(0.0740))])
        .await
        .unwrap();

    let found = store.latest_at_or_before(day(2020, 4, 1)).await.unwrap().unwrap();
    assert_eq!(found.effective_at, day(2020, 3, 30));
    assert_eq!(found.value, dec!(0.0737));

    let exact = store.latest_at_or_before(day(2020, 4, 2)).await.unwrap().unwrap();
    assert_eq!(exact.effective_at, day(2020, 4, 2));

    assert!(store.latest_at_or_before(day(2020, 3, 29)).await.unwrap().is_none());
}

pub async fn recent_n_reports_changes(store: &dyn RateStore) {
    store
        .upsert_many(&[
            rate(2024, 1, 1, dec!(10.0)),
            rate(2024, 1, 2, dec!(10.5)),
            rate(2024, 1, 3, dec!(10.2)),
        ])
        .await
        .unwrap();

    let all = store.recent_n(3).await.unwrap();
    let dates: Vec<_> = all.iter().map(|c| c.rate.effective_at).collect();
    assert_eq!(dates, vec![day(2024, 1, 3), day(2024, 1, 2), day(2024, 1, 1)]);
    let changes: Vec<_> = all.iter().map(|c| c.change).collect();
    assert_eq!(changes, vec![Some(dec!(-0.3)), Some(dec!(0.5)), None]);

    // The oldest returned row still gets a change when an earlier row exists.
    let latest = store.recent_n(1).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].change, Some(dec!(-0.3)));

    assert!(store.recent_n(0).await.unwrap().is_empty());
    assert_eq!(store.recent_n(15).await.unwrap().len(), 3);
}
