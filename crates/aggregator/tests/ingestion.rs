//! Integration tests for the ingestion loop
//!
//! - Newline-delimited transport with malformed, invalid and non-UTF-8 lines
//! - Simulated producer feeding the loop through a channel
//! - Shutdown while waiting on the transport

use chrono::Utc;
use holdings_aggregator::{
    AggregationService, ChannelTradeSource, InMemoryHoldingsStore, IngestionLoop,
    LinesTradeSource, QueryCache, SqliteHoldingsStore,
};
use holdings_clock::{ManualClock, SystemClock};
use holdings_core::{EntityScope, HoldingKey, Trade, TradeEvent, TradeLimit};
use holdings_generator::{TradeEmitter, generate};
use holdings_ports::Deadline;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn create_service() -> Arc<AggregationService<SqliteHoldingsStore, SystemClock>> {
    Arc::new(AggregationService::new(
        Arc::new(SqliteHoldingsStore::in_memory().await.unwrap()),
        Arc::new(SystemClock::new()),
        Arc::new(QueryCache::new()),
    ))
}

#[tokio::test]
async fn test_lines_transport_skips_bad_input() {
    let service = create_service().await;
    let input = concat!(
        r#"{"trade_id":"a1","entity":"zurich","instrument_type":"stock","symbol":"AAPL","quantity":10,"price":190.0}"#,
        "\n",
        "this is not json\n",
        "\n",
        r#"{"trade_id":"a2","entity":"london","instrument_type":"stock","symbol":"AAPL","quantity":1}"#,
        "\n",
        r#"{"trade_id":"a3","entity":"zurich","instrument_type":"bond","symbol":"AAPL","quantity":1}"#,
        "\n",
        r#"{"trade_id":"a1","entity":"zurich","instrument_type":"stock","symbol":"AAPL","quantity":10,"price":190.0}"#,
        "\n",
        r#"{"trade_id":"a4","entity":"ZURICH","instrument_type":"Stock","symbol":" aapl ","quantity":-4,"ts":"2024-05-01T10:00:00Z"}"#,
        "\n",
    );
    let source = LinesTradeSource::new(input.as_bytes(), "fixture");

    let summary = IngestionLoop::new(Arc::clone(&service), source)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.received, 6);
    assert_eq!(summary.applied, 2);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.decode_failures, 1);
    assert_eq!(summary.rejected, 2);
    assert_eq!(summary.failed, 0);

    let holdings = service.get_all_holdings(&Deadline::none()).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].quantity, dec!(6));
}

#[tokio::test]
async fn test_lines_transport_survives_invalid_utf8() {
    let service = create_service().await;
    let mut input = Vec::new();
    input.extend_from_slice(
        br#"{"trade_id":"u1","entity":"zurich","instrument_type":"stock","symbol":"MSFT","quantity":1}"#,
    );
    input.extend_from_slice(b"\n\xff\xfe\n");
    input.extend_from_slice(
        br#"{"trade_id":"u2","entity":"zurich","instrument_type":"stock","symbol":"MSFT","quantity":2}"#,
    );
    input.push(b'\n');
    let source = LinesTradeSource::new(input.as_slice(), "fixture");

    let summary = IngestionLoop::new(Arc::clone(&service), source)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.applied, 2);
    assert_eq!(summary.decode_failures, 1);

    let holdings = service.get_all_holdings(&Deadline::none()).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].quantity, dec!(3));
}

#[tokio::test]
async fn test_simulated_stream_totals_match_emitted_trades() {
    let service = create_service().await;
    let (tx, source) = ChannelTradeSource::pair(16);
    let shutdown = CancellationToken::new();

    let ingestion =
        tokio::spawn(IngestionLoop::new(Arc::clone(&service), source).run(shutdown.clone()));

    // Feed a deterministic batch by hand, recording the expected totals
    let mut rng = StdRng::seed_from_u64(2024);
    let mut expected: HashMap<HoldingKey, Decimal> = HashMap::new();
    for _ in 0..200 {
        let event = generate(&mut rng, Utc::now());
        let trade = Trade::from_event(event.clone(), Utc::now()).unwrap();
        *expected.entry(trade.holding_key()).or_default() += trade.quantity;
        tx.send(serde_json::to_vec(&event).unwrap()).await.unwrap();
    }
    drop(tx);

    let summary = ingestion.await.unwrap().unwrap();
    assert_eq!(summary.applied, 200);

    let holdings = service.get_all_holdings(&Deadline::none()).await.unwrap();
    assert_eq!(holdings.len(), expected.len());
    for holding in holdings.iter() {
        assert_eq!(Some(&holding.quantity), expected.get(&holding.key()));
    }

    let trades = service
        .get_trades(TradeLimit::new(1000), EntityScope::All, &Deadline::none())
        .await
        .unwrap();
    assert_eq!(trades.len(), 200);
}

#[tokio::test(start_paused = true)]
async fn test_emitter_feeds_ingestion_until_shutdown() {
    // Paused time needs a store that never waits on a foreign thread
    let service = Arc::new(AggregationService::new(
        Arc::new(InMemoryHoldingsStore::new()),
        Arc::new(SystemClock::new()),
        Arc::new(QueryCache::new()),
    ));
    let (tx, source) = ChannelTradeSource::pair(16);
    let shutdown = CancellationToken::new();
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let emitter = tokio::spawn(TradeEmitter::new(20).unwrap().run(
        StdRng::seed_from_u64(9),
        clock,
        tx,
        shutdown.clone(),
    ));
    let ingestion =
        tokio::spawn(IngestionLoop::new(Arc::clone(&service), source).run(shutdown.clone()));

    tokio::time::sleep(Duration::from_secs(2)).await;
    shutdown.cancel();

    let emitted = emitter.await.unwrap();
    let summary = ingestion.await.unwrap().unwrap();

    assert!(emitted.sent > 0);
    assert!(summary.applied <= emitted.sent);
    assert_eq!(summary.rejected + summary.decode_failures, 0);
}

#[tokio::test]
async fn test_event_timestamp_is_preserved() {
    let service = create_service().await;
    let event = TradeEvent {
        trade_id: "ts-1".to_string(),
        entity: "new_york".to_string(),
        instrument_type: "crypto".to_string(),
        symbol: "ETH".to_string(),
        quantity: dec!(0.5),
        price: Some(dec!(3200)),
        ts: Some("2024-02-29T23:59:59.123456789Z".parse().unwrap()),
    };
    let (tx, source) = ChannelTradeSource::pair(1);
    let ingestion = tokio::spawn(
        IngestionLoop::new(Arc::clone(&service), source).run(CancellationToken::new()),
    );

    tx.send(serde_json::to_vec(&event).unwrap()).await.unwrap();
    drop(tx);
    ingestion.await.unwrap().unwrap();

    let trades = service
        .get_trades(TradeLimit::default(), EntityScope::All, &Deadline::none())
        .await
        .unwrap();
    assert_eq!(Some(trades[0].ts), event.ts);
}
