use async_trait::async_trait;
use common::{AccountId, OrderId, TrainNumber, TravelDate};
use ledger::{RouteInterval, SeatClass, SeatId};
use orders::{Order, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    partition::Partition,
    store::OrderStore,
};

/// PostgreSQL-backed order store implementation.
///
/// Each deployed instance serves exactly one partition; the partition
/// label only feeds error attribution, the schema is identical on both
/// sides.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
    partition: Partition,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store for one partition.
    pub fn new(pool: PgPool, partition: Partition) -> Self {
        Self { pool, partition }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The partition this store serves.
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Classifies connection-level failures as partition unavailability;
    /// everything else stays a database error.
    fn fail(&self, e: sqlx::Error) -> StoreError {
        if matches!(
            e,
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
        ) {
            StoreError::Unavailable {
                partition: self.partition,
                reason: e.to_string(),
            }
        } else {
            StoreError::Database(e)
        }
    }

    fn corrupt(message: String) -> StoreError {
        StoreError::Serialization(serde_json::Error::io(std::io::Error::other(message)))
    }

    fn row_to_order(&self, row: &PgRow) -> Result<Order> {
        let fail = |e: sqlx::Error| self.fail(e);

        let interval = RouteInterval::new(
            row.try_get::<i32, _>("interval_start").map_err(fail)? as u32,
            row.try_get::<i32, _>("interval_end").map_err(fail)? as u32,
        )
        .map_err(|e| Self::corrupt(format!("stored interval is invalid: {e}")))?;

        let class_raw: String = row.try_get("seat_class").map_err(fail)?;
        let class = SeatClass::parse(&class_raw)
            .ok_or_else(|| Self::corrupt(format!("unknown seat class: {class_raw}")))?;

        let status_raw: String = row.try_get("status").map_err(fail)?;
        let status = OrderStatus::parse(&status_raw)
            .ok_or_else(|| Self::corrupt(format!("unknown order status: {status_raw}")))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id").map_err(fail)?),
            account: AccountId::from_uuid(row.try_get::<Uuid, _>("account_id").map_err(fail)?),
            train_number: TrainNumber::new(
                row.try_get::<String, _>("train_number").map_err(fail)?,
            ),
            travel_date: TravelDate::new(row.try_get("travel_date").map_err(fail)?),
            interval,
            seat: SeatId::new(
                row.try_get::<i32, _>("seat_coach").map_err(fail)? as u16,
                row.try_get::<i32, _>("seat_number").map_err(fail)? as u16,
            ),
            class,
            status,
            created_at: row.try_get("created_at").map_err(fail)?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, account_id, train_number, travel_date,
                                interval_start, interval_end, seat_coach, seat_number,
                                seat_class, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.account.as_uuid())
        .bind(order.train_number.as_str())
        .bind(order.travel_date.as_date())
        .bind(order.interval.start() as i32)
        .bind(order.interval.end() as i32)
        .bind(order.seat.coach as i32)
        .bind(order.seat.number as i32)
        .bind(order.class.as_str())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Primary key collision means the order was already written.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::DuplicateOrder(order.id);
            }
            self.fail(e)
        })?;

        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, train_number, travel_date,
                   interval_start, interval_end, seat_coach, seat_number,
                   seat_class, status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.fail(e))?;

        row.map(|row| self.row_to_order(&row)).transpose()
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING id, account_id, train_number, travel_date,
                      interval_start, interval_end, seat_coach, seat_number,
                      seat_class, status, created_at
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.fail(e))?;

        if let Some(row) = row {
            return self.row_to_order(&row);
        }

        // Zero rows updated: the order is either gone or changed under
        // us. Re-read to tell the two apart. Orders are never deleted,
        // so the re-read cannot race a removal.
        let actual: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.fail(e))?;

        match actual {
            None => Err(StoreError::NotFound(order_id)),
            Some(raw) => {
                let actual = OrderStatus::parse(&raw)
                    .ok_or_else(|| Self::corrupt(format!("unknown order status: {raw}")))?;
                Err(StoreError::VersionConflict {
                    order_id,
                    expected,
                    actual,
                })
            }
        }
    }

    async fn list_by_account(&self, account: AccountId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, train_number, travel_date,
                   interval_start, interval_end, seat_coach, seat_number,
                   seat_class, status, created_at
            FROM orders
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| self.fail(e))?;

        rows.iter().map(|row| self.row_to_order(row)).collect()
    }
}
