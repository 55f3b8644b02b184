//! End-to-end tests of the aggregation pipeline against the SQLite store
//!
//! Covers:
//! - Idempotent application and additive holdings
//! - Empty results versus validation failures
//! - Trade ordering and limits
//! - Cache coherence after writes, including concurrent readers

use chrono::{Duration, TimeZone, Utc};
use holdings_aggregator::{
    AggregationError, AggregationService, HoldingsKey, QueryCache, SqliteHoldingsStore,
};
use holdings_clock::ManualClock;
use holdings_core::{Entity, EntityScope, Timestamp, TradeEvent, TradeLimit, ValidationError};
use holdings_ports::{ApplyOutcome, Deadline};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

// ============================================================================
// Test Fixtures
// ============================================================================

type Service = AggregationService<SqliteHoldingsStore, ManualClock>;

fn base_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 4, 15, 8, 0, 0).unwrap()
}

async fn create_service() -> Arc<Service> {
    let store = SqliteHoldingsStore::in_memory().await.unwrap();
    Arc::new(AggregationService::new(
        Arc::new(store),
        Arc::new(ManualClock::new(base_time())),
        Arc::new(QueryCache::new()),
    ))
}

fn stock(id: &str, entity: &str, symbol: &str, quantity: Decimal) -> TradeEvent {
    TradeEvent {
        trade_id: id.to_string(),
        entity: entity.to_string(),
        instrument_type: "stock".to_string(),
        symbol: symbol.to_string(),
        quantity,
        price: Some(dec!(190.00)),
        ts: None,
    }
}

fn at(event: TradeEvent, minutes: i64) -> TradeEvent {
    TradeEvent {
        ts: Some(base_time() + Duration::minutes(minutes)),
        ..event
    }
}

async fn quantity_of(service: &Service, entity: Entity, symbol: &str) -> Option<Decimal> {
    service
        .get_holdings(EntityScope::Entity(entity), &Deadline::none())
        .await
        .unwrap()
        .iter()
        .find(|h| h.symbol.as_str() == symbol)
        .map(|h| h.quantity)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_redelivered_trade_counts_once() {
    let service = create_service().await;
    let deadline = Deadline::none();

    let first = service
        .apply_trade(stock("t1", "zurich", "AAPL", dec!(10)), &deadline)
        .await
        .unwrap();
    let again = service
        .apply_trade(stock("t1", "zurich", "AAPL", dec!(10)), &deadline)
        .await
        .unwrap();

    assert_eq!(first, ApplyOutcome::Applied);
    assert_eq!(again, ApplyOutcome::Duplicate);
    assert_eq!(quantity_of(&service, Entity::Zurich, "AAPL").await, Some(dec!(10)));
}

#[tokio::test]
async fn test_buys_and_sells_accumulate() {
    let service = create_service().await;
    let deadline = Deadline::none();

    for (id, qty) in [("t1", dec!(10)), ("t2", dec!(5)), ("t3", dec!(-3))] {
        service
            .apply_trade(stock(id, "zurich", "AAPL", qty), &deadline)
            .await
            .unwrap();
    }

    assert_eq!(quantity_of(&service, Entity::Zurich, "AAPL").await, Some(dec!(12)));
}

#[tokio::test]
async fn test_entity_without_trades_is_empty() {
    let service = create_service().await;

    let rows = service
        .get_holdings(EntityScope::parse("new_york").unwrap(), &Deadline::none())
        .await
        .unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_unknown_entity_is_rejected() {
    assert_eq!(
        EntityScope::parse("london"),
        Err(ValidationError::UnknownEntity("london".to_string()))
    );

    let service = create_service().await;
    let err = service
        .apply_trade(stock("t1", "london", "AAPL", dec!(1)), &Deadline::none())
        .await
        .unwrap_err();
    assert!(matches!(err, AggregationError::Validation(_)));
}

#[tokio::test]
async fn test_trades_newest_first_with_limit() {
    let service = create_service().await;
    let deadline = Deadline::none();

    service.apply_trade(at(stock("t1", "zurich", "AAPL", dec!(1)), 1), &deadline).await.unwrap();
    service.apply_trade(at(stock("t2", "new_york", "MSFT", dec!(1)), 2), &deadline).await.unwrap();
    service.apply_trade(at(stock("t3", "zurich", "TSLA", dec!(1)), 3), &deadline).await.unwrap();

    let trades = service
        .get_trades(TradeLimit::new(2), EntityScope::All, &deadline)
        .await
        .unwrap();
    let ids: Vec<&str> = trades.iter().map(|t| t.trade_id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t2"]);

    let zurich = service
        .get_trades(TradeLimit::default(), EntityScope::Entity(Entity::Zurich), &deadline)
        .await
        .unwrap();
    let ids: Vec<&str> = zurich.iter().map(|t| t.trade_id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t1"]);
}

#[tokio::test]
async fn test_cached_holdings_reflect_new_trade() {
    let service = create_service().await;
    let deadline = Deadline::none();

    service
        .apply_trade(stock("t1", "zurich", "AAPL", dec!(10)), &deadline)
        .await
        .unwrap();
    let before = service.get_all_holdings(&deadline).await.unwrap();
    assert!(service.cache().peek_holdings(&HoldingsKey::all()).is_some());

    service
        .apply_trade(stock("t2", "new_york", "NVDA", dec!(4)), &deadline)
        .await
        .unwrap();
    let after = service.get_all_holdings(&deadline).await.unwrap();

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].entity, Entity::NewYork);
    assert_eq!(after[0].quantity, dec!(4));
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_holdings_equal_sum_of_distinct_trades() {
    let service = create_service().await;
    let deadline = Deadline::none();
    let quantities = [dec!(1.5), dec!(-0.25), dec!(3), dec!(0.00000001), dec!(-2)];

    for (i, qty) in quantities.iter().enumerate() {
        let event = TradeEvent {
            instrument_type: "crypto".to_string(),
            ..stock(&format!("c{i}"), "new_york", "BTC", *qty)
        };
        service.apply_trade(event.clone(), &deadline).await.unwrap();
        // Every redelivery is ignored
        service.apply_trade(event, &deadline).await.unwrap();
    }

    let expected: Decimal = quantities.iter().sum();
    assert_eq!(quantity_of(&service, Entity::NewYork, "BTC").await, Some(expected));
}

#[tokio::test]
async fn test_concurrent_applies_on_same_key() {
    let service = create_service().await;
    let mut handles = Vec::new();

    for i in 0..40 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .apply_trade(stock(&format!("t{i}"), "zurich", "MSFT", dec!(2)), &Deadline::none())
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(ApplyOutcome::Applied));
    }

    assert_eq!(quantity_of(&service, Entity::Zurich, "MSFT").await, Some(dec!(80)));
}

#[tokio::test]
async fn test_reads_after_each_write_are_never_stale() {
    let service = create_service().await;
    let deadline = Deadline::none();

    let mut reader_handles = Vec::new();
    for _ in 0..4 {
        let service = Arc::clone(&service);
        reader_handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                service.get_all_holdings(&Deadline::none()).await.unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }

    let mut expected = Decimal::ZERO;
    for i in 0..25 {
        service
            .apply_trade(stock(&format!("w{i}"), "zurich", "GOOGL", dec!(1)), &deadline)
            .await
            .unwrap();
        expected += dec!(1);

        let all = service.get_all_holdings(&deadline).await.unwrap();
        assert_eq!(all[0].quantity, expected);
        assert_eq!(quantity_of(&service, Entity::Zurich, "GOOGL").await, Some(expected));
    }

    for handle in reader_handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_write_to_other_entity_keeps_entity_cache() {
    let service = create_service().await;
    let deadline = Deadline::none();
    let new_york = HoldingsKey::entity(Entity::NewYork);

    service
        .apply_trade(stock("t1", "new_york", "AMZN", dec!(7)), &deadline)
        .await
        .unwrap();
    service
        .get_holdings(EntityScope::Entity(Entity::NewYork), &deadline)
        .await
        .unwrap();

    service
        .apply_trade(stock("t2", "zurich", "AMZN", dec!(1)), &deadline)
        .await
        .unwrap();

    assert!(service.cache().peek_holdings(&new_york).is_some());
    assert!(service.cache().peek_holdings(&HoldingsKey::all()).is_none());
}
