use std::marker::PhantomData;

use async_trait::async_trait;
use common::{Id32, Id64, Identifier, OpaqueId};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::{
    GoodsRow, NewOrder, OrderId, Result, StoreError,
    store::{InventoryStore, LockDecision, LockOutcome, RowLockBody},
};

/// Identifier that can be bound to a Postgres column of a matching type.
pub trait PgIdentifier: Identifier {
    /// Column type used for the id columns of the kind-suffixed tables.
    const PG_TYPE: &'static str;

    /// Binds this identifier as the next query parameter.
    fn bind_id<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;
}

impl PgIdentifier for Id32 {
    const PG_TYPE: &'static str = "integer";

    fn bind_id<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query.bind(self.value())
    }
}

impl PgIdentifier for Id64 {
    const PG_TYPE: &'static str = "bigint";

    fn bind_id<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query.bind(self.value())
    }
}

impl PgIdentifier for OpaqueId {
    const PG_TYPE: &'static str = "text";

    fn bind_id<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query.bind(self.as_str().to_owned())
    }
}

/// PostgreSQL-backed inventory store.
///
/// Tables are suffixed by identifier kind (`goods_i32`, `orders_text`, …) so
/// every key representation is compared against a genuinely typed column.
/// Lock-wait bounds are the session's `lock_timeout`; when Postgres reports
/// SQLSTATE 55P03 the error surfaces as [`StoreError::LockTimeout`].
#[derive(Clone)]
pub struct PostgresInventoryStore<K: PgIdentifier> {
    pool: PgPool,
    _marker: PhantomData<fn() -> K>,
}

impl<K: PgIdentifier> PostgresInventoryStore<K> {
    /// Creates a store over an existing connection pool.
    ///
    /// Pool sizing is the caller's concern; for benchmark runs it must be at
    /// least the worker count so queueing does not distort latency.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn goods_table() -> String {
        format!("goods_{}", K::KIND.table_suffix())
    }

    fn orders_table() -> String {
        format!("orders_{}", K::KIND.table_suffix())
    }

    /// Creates the kind-suffixed tables if they do not exist.
    ///
    /// Schema management proper stays outside this crate; this covers tests
    /// and benchmark provisioning.
    pub async fn create_schema(&self) -> Result<()> {
        let goods = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                 id {} PRIMARY KEY, \
                 stock integer NOT NULL CHECK (stock >= 0), \
                 sales integer NOT NULL CHECK (sales >= 0)\
             )",
            Self::goods_table(),
            K::PG_TYPE
        );
        let orders = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                 id uuid PRIMARY KEY, \
                 user_id {} NOT NULL, \
                 goods_id {} NOT NULL, \
                 quantity integer NOT NULL, \
                 addr_mobile text NOT NULL, \
                 addr_name text NOT NULL, \
                 addr_detail text NOT NULL, \
                 created_at timestamptz NOT NULL DEFAULT now()\
             )",
            Self::orders_table(),
            K::PG_TYPE,
            K::PG_TYPE
        );
        sqlx::query(&goods).execute(&self.pool).await?;
        sqlx::query(&orders).execute(&self.pool).await?;
        Ok(())
    }

    /// Creates or resets a goods row.
    pub async fn seed_goods(&self, goods_id: &K, stock: u32, sales: u32) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (id, stock, sales) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET stock = EXCLUDED.stock, sales = EXCLUDED.sales",
            Self::goods_table()
        );
        goods_id
            .bind_id(sqlx::query(&sql))
            .bind(stock as i32)
            .bind(sales as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Empties both tables. Test isolation helper.
    pub async fn truncate(&self) -> Result<()> {
        let sql = format!(
            "TRUNCATE TABLE {}, {}",
            Self::goods_table(),
            Self::orders_table()
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_order_with<'e, E>(order: NewOrder<K>, executor: E) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO {} (id, user_id, goods_id, quantity, addr_mobile, addr_name, addr_detail) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            Self::orders_table()
        );
        let query = sqlx::query(&sql).bind(order.order_id.as_uuid());
        let query = order.user_id.bind_id(query);
        let query = order.goods_id.bind_id(query);
        query
            .bind(order.quantity as i32)
            .bind(order.address.mobile)
            .bind(order.address.name)
            .bind(order.address.detail)
            .execute(executor)
            .await?;
        Ok(())
    }

    fn map_lock_error(goods_id: &K, e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some("55P03")
        {
            tracing::warn!(goods_id = %goods_id, "row lock wait timed out");
            return StoreError::LockTimeout {
                goods_id: goods_id.to_string(),
            };
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl<K: PgIdentifier> InventoryStore<K> for PostgresInventoryStore<K> {
    async fn read_row(&self, goods_id: &K) -> Result<GoodsRow> {
        let sql = format!("SELECT stock, sales FROM {} WHERE id = $1", Self::goods_table());
        let row = goods_id
            .bind_id(sqlx::query(&sql))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(GoodsRow::new(
                row.try_get::<i32, _>("stock")? as u32,
                row.try_get::<i32, _>("sales")? as u32,
            )),
            None => Err(StoreError::RowNotFound(goods_id.to_string())),
        }
    }

    async fn write_row(&self, goods_id: &K, row: GoodsRow) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET stock = $2, sales = $3 WHERE id = $1",
            Self::goods_table()
        );
        let result = goods_id
            .bind_id(sqlx::query(&sql))
            .bind(row.stock as i32)
            .bind(row.sales as i32)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound(goods_id.to_string()));
        }
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder<K>) -> Result<OrderId> {
        let order_id = order.order_id;
        Self::insert_order_with(order, &self.pool).await?;
        Ok(order_id)
    }

    async fn conditional_update(
        &self,
        goods_id: &K,
        expected_stock: u32,
        order: NewOrder<K>,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE {} SET stock = stock - $2, sales = sales + $2 \
             WHERE id = $1 AND stock = $3 AND stock >= $2",
            Self::goods_table()
        );
        let result = goods_id
            .bind_id(sqlx::query(&sql))
            .bind(order.quantity as i32)
            .bind(expected_stock as i32)
            .execute(&mut *tx)
            .await?;

        let affected = result.rows_affected();
        if affected == 1 {
            Self::insert_order_with(order, &mut *tx).await?;
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(affected)
    }

    async fn with_row_lock(&self, goods_id: &K, body: RowLockBody<'_, K>) -> Result<LockOutcome> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT stock, sales FROM {} WHERE id = $1 FOR UPDATE",
            Self::goods_table()
        );
        let row = goods_id
            .bind_id(sqlx::query(&sql))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Self::map_lock_error(goods_id, e))?;

        // Dropping the transaction on the error path rolls it back and
        // releases the row lock.
        let Some(row) = row else {
            return Err(StoreError::RowNotFound(goods_id.to_string()));
        };
        let current = GoodsRow::new(
            row.try_get::<i32, _>("stock")? as u32,
            row.try_get::<i32, _>("sales")? as u32,
        );

        match body(&current) {
            LockDecision::Commit { row: new_row, order } => {
                let order_id = order.order_id;
                let sql = format!(
                    "UPDATE {} SET stock = $2, sales = $3 WHERE id = $1",
                    Self::goods_table()
                );
                goods_id
                    .bind_id(sqlx::query(&sql))
                    .bind(new_row.stock as i32)
                    .bind(new_row.sales as i32)
                    .execute(&mut *tx)
                    .await?;
                Self::insert_order_with(order, &mut *tx).await?;
                tx.commit().await?;
                Ok(LockOutcome::Committed(order_id))
            }
            LockDecision::Abort => {
                tx.rollback().await?;
                Ok(LockOutcome::Aborted {
                    stock: current.stock,
                })
            }
        }
    }

    async fn count_orders(&self, goods_id: &K) -> Result<u64> {
        let sql = format!(
            "SELECT count(*) AS n FROM {} WHERE goods_id = $1",
            Self::orders_table()
        );
        let row = goods_id
            .bind_id(sqlx::query(&sql))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? as u64)
    }
}
