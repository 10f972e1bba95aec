//! Property-based checks for FIFO allocation
//! Arbitrary intake orders must always allocate the oldest stock and move the counts

mod fixtures;

use asset_dispatch::{AssetId, AssetStatus, ErrorKind};
use fixtures::{memory_engine, receive};
use proptest::prelude::*;
use proptest_derive::Arbitrary;

#[derive(Debug, Clone, Arbitrary)]
struct IntakeScenario {
    // seconds after the fixture base time; duplicates exercise the insertion tie-break
    #[proptest(strategy = "prop::collection::vec(0i64..500, 1..20)")]
    offsets: Vec<i64>,
    #[proptest(strategy = "1usize..=20")]
    requested: usize,
}

/// Ids in the order FIFO allocation must hand them out
fn fifo_order(offsets: &[i64], ids: &[AssetId]) -> Vec<AssetId> {
    let mut order: Vec<usize> = (0..offsets.len()).collect();
    order.sort_by_key(|&n| (offsets[n], n));
    order.into_iter().map(|n| ids[n]).collect()
}

#[test]
fn prop_allocate_claims_exactly_the_oldest() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<IntakeScenario>(), |scenario| {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let (engine, store) = memory_engine();
                let mut ids = Vec::new();
                for (n, offset) in scenario.offsets.iter().enumerate() {
                    ids.push(receive(&store, &format!("P{n}"), *offset).await.id);
                }
                let total = ids.len();
                let k = scenario.requested.min(total);
                let expected: Vec<AssetId> =
                    fifo_order(&scenario.offsets, &ids).into_iter().take(k).collect();

                let before = engine.list_assets_with_stats().await.unwrap().stats;
                let result = engine.allocate(k as i64).await.unwrap();
                prop_assert_eq!(&result.asset_ids, &expected);
                prop_assert_eq!(result.allocated, k as u64);

                let after = engine.list_assets_with_stats().await.unwrap();
                prop_assert_eq!(after.stats.total, before.total);
                prop_assert_eq!(after.stats.in_stock, before.in_stock - k as u64);
                prop_assert_eq!(after.stats.out_stock, before.out_stock + k as u64);

                for asset in &after.assets {
                    let claimed = expected.contains(&asset.id);
                    prop_assert_eq!(asset.status == AssetStatus::Allocated, claimed);
                    prop_assert_eq!(
                        asset.allocation_batch.as_deref() == Some(result.batch.as_str()),
                        claimed
                    );
                }

                Ok(())
            })
        })
        .unwrap();
}

#[test]
fn prop_oversized_request_changes_nothing() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<IntakeScenario>(), 1usize..5), |(scenario, extra)| {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let (engine, store) = memory_engine();
                for (n, offset) in scenario.offsets.iter().enumerate() {
                    receive(&store, &format!("P{n}"), *offset).await;
                }
                let before = engine.list_assets_with_stats().await.unwrap();

                let requested = (scenario.offsets.len() + extra) as i64;
                let err = engine.allocate(requested).await.unwrap_err();
                prop_assert_eq!(err.kind(), ErrorKind::InsufficientStock);

                let after = engine.list_assets_with_stats().await.unwrap();
                prop_assert_eq!(after, before);

                Ok(())
            })
        })
        .unwrap();
}
