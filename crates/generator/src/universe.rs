use holdings_core::{Entity, InstrumentType, Timestamp, TradeEvent};
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Builder;

/// Tradable symbols with their reference prices
pub const STOCKS: [(&str, i64); 7] = [
    ("AAPL", 190),
    ("MSFT", 420),
    ("GOOGL", 145),
    ("AMZN", 180),
    ("TSLA", 220),
    ("NVDA", 800),
    ("NFLX", 550),
];

/// Reference prices in hundredths
pub const CRYPTOS: [(&str, i64); 5] = [
    ("BTC", 6_000_000),
    ("ETH", 320_000),
    ("SOL", 15_000),
    ("ADA", 45),
    ("XRP", 60),
];

/// Stock prices move up to 1.5% either way, crypto up to 2.5%
const STOCK_SPREAD_BPS: i64 = 150;
const CRYPTO_SPREAD_BPS: i64 = 250;

/// Build one random trade event at `now`.
///
/// Stocks trade whole lots of 1..=50 and cryptos 0.001..=0.5 units (4 dp);
/// either side is equally likely. Prices are rounded to cents. All
/// randomness comes from `rng`, so a seeded source gives a reproducible
/// stream.
pub fn generate<R: Rng>(rng: &mut R, now: Timestamp) -> TradeEvent {
    let entity = Entity::ALL[rng.gen_range(0..Entity::ALL.len())];
    let instrument_type = InstrumentType::ALL[rng.gen_range(0..InstrumentType::ALL.len())];

    let (symbol, base_price, spread_bps, magnitude) = match instrument_type {
        InstrumentType::Stock => {
            let (symbol, price) = STOCKS[rng.gen_range(0..STOCKS.len())];
            let lots = Decimal::from(rng.gen_range(1..=50i64));
            (symbol, Decimal::from(price), STOCK_SPREAD_BPS, lots)
        }
        InstrumentType::Crypto => {
            let (symbol, cents) = CRYPTOS[rng.gen_range(0..CRYPTOS.len())];
            let units = Decimal::new(rng.gen_range(10..=5_000i64), 4);
            (symbol, Decimal::new(cents, 2), CRYPTO_SPREAD_BPS, units)
        }
    };

    let bps = rng.gen_range(-spread_bps..=spread_bps);
    let price = (base_price * (Decimal::ONE + Decimal::new(bps, 4))).round_dp(2);
    let quantity = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
    let trade_id = Builder::from_random_bytes(rng.r#gen()).into_uuid();

    TradeEvent {
        trade_id: trade_id.to_string(),
        entity: entity.to_string(),
        instrument_type: instrument_type.to_string(),
        symbol: symbol.to_string(),
        quantity,
        price: Some(price),
        ts: Some(now),
    }
}
