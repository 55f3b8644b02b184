//! SQLite-backed holdings store.
//!
//! Quantities are stored as fixed-point integers of 10^-8 units so the
//! holdings increment is an exact server-side add. Prices are kept as
//! decimal text and event times as integer nanoseconds since the epoch.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use holdings_core::{
    Entity, Holding, HoldingKey, InstrumentType, Price, QUANTITY_SCALE, Quantity, Symbol, Trade,
    TradeId, TradeLimit,
};
use holdings_ports::{ApplyOutcome, Deadline, HoldingsStore, StoreError, StoreResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::info;

const UNITS_PER_QUANTITY: i64 = 100_000_000;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const INSERT_TRADE: &str = "INSERT INTO trades \
     (trade_id, entity, instrument_type, symbol, quantity_units, price, ts_nanos) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
     ON CONFLICT (trade_id) DO NOTHING";

const UPSERT_HOLDING: &str = "INSERT INTO holdings \
     (entity, instrument_type, symbol, quantity_units) \
     VALUES (?1, ?2, ?3, ?4) \
     ON CONFLICT (entity, instrument_type, symbol) DO UPDATE SET \
     quantity_units = holdings.quantity_units + excluded.quantity_units, \
     updated_at = CURRENT_TIMESTAMP";

const SELECT_HOLDINGS: &str = "SELECT entity, instrument_type, symbol, quantity_units \
     FROM holdings \
     ORDER BY entity, instrument_type, symbol";

const SELECT_ENTITY_HOLDINGS: &str = "SELECT entity, instrument_type, symbol, quantity_units \
     FROM holdings \
     WHERE entity = ?1 \
     ORDER BY instrument_type, symbol";

const SELECT_TRADES: &str = "SELECT trade_id, entity, instrument_type, symbol, quantity_units, price, ts_nanos \
     FROM trades \
     WHERE (?1 IS NULL OR entity = ?1) \
     ORDER BY ts_nanos DESC, seq DESC \
     LIMIT ?2";

#[derive(Clone)]
pub struct SqliteHoldingsStore {
    pool: SqlitePool,
}

impl SqliteHoldingsStore {
    /// Open (creating if missing) the database at `url`
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(backend)?;

        info!(url, "connected to sqlite");
        Ok(Self { pool })
    }

    /// Private in-memory database on a single long-lived connection
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(backend)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(backend)?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn apply_in_transaction(
        &self,
        trade: &Trade,
        units: i64,
        ts_nanos: i64,
    ) -> StoreResult<ApplyOutcome> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        if !insert_trade(&mut tx, trade, units, ts_nanos).await? {
            tx.rollback().await.map_err(backend)?;
            return Ok(ApplyOutcome::Duplicate);
        }
        add_to_holding(&mut tx, trade, units).await?;

        tx.commit().await.map_err(backend)?;
        Ok(ApplyOutcome::Applied)
    }

    async fn fetch_holdings(&self, entity: Option<Entity>) -> StoreResult<Vec<Holding>> {
        let rows = match entity {
            Some(entity) => {
                sqlx::query(SELECT_ENTITY_HOLDINGS)
                    .bind(entity.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => sqlx::query(SELECT_HOLDINGS).fetch_all(&self.pool).await,
        }
        .map_err(backend)?;

        rows.iter().map(holding_from_row).collect()
    }

    async fn fetch_trades(&self, limit: TradeLimit, entity: Option<Entity>) -> StoreResult<Vec<Trade>> {
        let rows = sqlx::query(SELECT_TRADES)
            .bind(entity.map(|e| e.as_str()))
            .bind(limit.get() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.iter().map(trade_from_row).collect()
    }
}

#[async_trait]
impl HoldingsStore for SqliteHoldingsStore {
    async fn apply_trade(&self, trade: &Trade, deadline: &Deadline) -> StoreResult<ApplyOutcome> {
        let units = to_units(trade.quantity)?;
        let ts_nanos = trade.ts.timestamp_nanos_opt().ok_or_else(|| {
            StoreError::Backend(format!("timestamp out of range: {}", trade.ts))
        })?;

        // Dropping the transaction on interruption rolls it back
        deadline
            .run(self.apply_in_transaction(trade, units, ts_nanos))
            .await?
    }

    async fn get_all_holdings(&self, deadline: &Deadline) -> StoreResult<Vec<Holding>> {
        deadline.run(self.fetch_holdings(None)).await?
    }

    async fn get_holdings_by_entity(
        &self,
        entity: Entity,
        deadline: &Deadline,
    ) -> StoreResult<Vec<Holding>> {
        let rows = deadline.run(self.fetch_holdings(Some(entity))).await??;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows)
    }

    async fn get_trades(
        &self,
        limit: TradeLimit,
        entity: Option<Entity>,
        deadline: &Deadline,
    ) -> StoreResult<Vec<Trade>> {
        deadline.run(self.fetch_trades(limit, entity)).await?
    }

    fn name(&self) -> &str {
        "SqliteHoldingsStore"
    }
}

/// Record the trade row; false when the trade id is already present
async fn insert_trade(
    tx: &mut Transaction<'_, Sqlite>,
    trade: &Trade,
    units: i64,
    ts_nanos: i64,
) -> StoreResult<bool> {
    let inserted = sqlx::query(INSERT_TRADE)
        .bind(trade.trade_id.as_str())
        .bind(trade.entity.as_str())
        .bind(trade.instrument_type.as_str())
        .bind(trade.symbol.as_str())
        .bind(units)
        .bind(trade.price.map(|p| p.to_string()))
        .bind(ts_nanos)
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
    Ok(inserted.rows_affected() > 0)
}

async fn add_to_holding(tx: &mut Transaction<'_, Sqlite>, trade: &Trade, units: i64) -> StoreResult<()> {
    sqlx::query(UPSERT_HOLDING)
        .bind(trade.entity.as_str())
        .bind(trade.instrument_type.as_str())
        .bind(trade.symbol.as_str())
        .bind(units)
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
    Ok(())
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt {column} column: {detail}"))
}

fn to_units(quantity: Quantity) -> StoreResult<i64> {
    let scaled = quantity
        .checked_mul(Decimal::from(UNITS_PER_QUANTITY))
        .ok_or_else(|| StoreError::Backend(format!("quantity out of range: {quantity}")))?;
    if !scaled.fract().is_zero() {
        return Err(StoreError::Backend(format!(
            "quantity exceeds {QUANTITY_SCALE} decimal places: {quantity}"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| StoreError::Backend(format!("quantity out of range: {quantity}")))
}

fn from_units(units: i64) -> Quantity {
    Decimal::new(units, QUANTITY_SCALE).normalize()
}

fn column<T>(row: &SqliteRow, name: &str) -> StoreResult<T>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(backend)
}

fn holding_from_row(row: &SqliteRow) -> StoreResult<Holding> {
    let entity: String = column(row, "entity")?;
    let instrument_type: String = column(row, "instrument_type")?;
    let symbol: String = column(row, "symbol")?;
    let units: i64 = column(row, "quantity_units")?;

    let key = HoldingKey::new(
        Entity::from_str(&entity).map_err(|e| corrupt("entity", e))?,
        InstrumentType::from_str(&instrument_type).map_err(|e| corrupt("instrument_type", e))?,
        Symbol::new(symbol).map_err(|e| corrupt("symbol", e))?,
    );
    Ok(Holding::new(key, from_units(units)))
}

fn trade_from_row(row: &SqliteRow) -> StoreResult<Trade> {
    let trade_id: String = column(row, "trade_id")?;
    let entity: String = column(row, "entity")?;
    let instrument_type: String = column(row, "instrument_type")?;
    let symbol: String = column(row, "symbol")?;
    let units: i64 = column(row, "quantity_units")?;
    let price: Option<String> = column(row, "price")?;
    let ts_nanos: i64 = column(row, "ts_nanos")?;

    let price: Option<Price> = price
        .map(|raw| Decimal::from_str(&raw).map_err(|e| corrupt("price", e)))
        .transpose()?;

    Ok(Trade {
        trade_id: TradeId::new(trade_id).map_err(|e| corrupt("trade_id", e))?,
        entity: Entity::from_str(&entity).map_err(|e| corrupt("entity", e))?,
        instrument_type: InstrumentType::from_str(&instrument_type)
            .map_err(|e| corrupt("instrument_type", e))?,
        symbol: Symbol::new(symbol).map_err(|e| corrupt("symbol", e))?,
        quantity: from_units(units),
        price,
        ts: DateTime::<Utc>::from_timestamp_nanos(ts_nanos),
    })
}
