use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartItemId, DeviceId, GestureId, Money, OrderId, ProductId, ReviewId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartItemRecord, DevicePlatform, DeviceRecord, GesturePoint, GestureRecord, GestureTypeStats,
    OrderRecord, OrderStatus, ProductRecord, Result, ReviewRecord, StoreError,
    store::StorefrontStore,
};

/// Schema bootstrap, executed idempotently on startup.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
    stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
    is_ai_generated BOOLEAN NOT NULL DEFAULT FALSE,
    ai_source TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS cart_items (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    quantity INTEGER NOT NULL CHECK (quantity >= 1),
    UNIQUE (user_id, product_id)
);

CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    product_id UUID NOT NULL,
    product_name TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity >= 1),
    unit_price_cents BIGINT NOT NULL,
    total_price_cents BIGINT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_orders_product_status ON orders (product_id, status);

CREATE TABLE IF NOT EXISTS reviews (
    id UUID PRIMARY KEY,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    user_id UUID NOT NULL,
    rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT unique_review_per_user UNIQUE (product_id, user_id)
);

CREATE TABLE IF NOT EXISTS devices (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    token TEXT NOT NULL,
    platform TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL,
    last_used TIMESTAMPTZ NOT NULL,
    CONSTRAINT unique_device_token UNIQUE (user_id, token)
);

CREATE TABLE IF NOT EXISTS gestures (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    gesture_type TEXT NOT NULL,
    points JSONB NOT NULL,
    confidence DOUBLE PRECISION NOT NULL,
    processed BOOLEAN NOT NULL DEFAULT FALSE,
    recorded_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_gestures_user_time ON gestures (user_id, recorded_at);
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the schema if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get::<i64, _>("price_cents")?),
            stock: row.try_get::<i32, _>("stock")? as u32,
            is_ai_generated: row.try_get("is_ai_generated")?,
            ai_source: row.try_get("ai_source")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItemRecord> {
        Ok(CartItemRecord {
            id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        let status_text: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_text).ok_or_else(|| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(format!(
                "unknown order status: {status_text}"
            ))))
        })?;

        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            unit_price: Money::from_cents(row.try_get::<i64, _>("unit_price_cents")?),
            total_price: Money::from_cents(row.try_get::<i64, _>("total_price_cents")?),
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_review(row: PgRow) -> Result<ReviewRecord> {
        Ok(ReviewRecord {
            id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            rating: row.try_get::<i16, _>("rating")? as u8,
            comment: row.try_get("comment")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_device(row: PgRow) -> Result<DeviceRecord> {
        let platform_text: String = row.try_get("platform")?;
        let platform = DevicePlatform::parse(&platform_text).ok_or_else(|| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(format!(
                "unknown device platform: {platform_text}"
            ))))
        })?;

        Ok(DeviceRecord {
            id: DeviceId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            token: row.try_get("token")?,
            platform,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            last_used: row.try_get("last_used")?,
        })
    }

    fn row_to_gesture(row: PgRow) -> Result<GestureRecord> {
        let points_json: serde_json::Value = row.try_get("points")?;
        let points: Vec<GesturePoint> = serde_json::from_value(points_json)?;

        Ok(GestureRecord {
            id: GestureId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            gesture_type: row.try_get("gesture_type")?,
            points,
            confidence: row.try_get("confidence")?,
            processed: row.try_get("processed")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

#[async_trait]
impl StorefrontStore for PostgresStore {
    async fn insert_product(&self, product: &ProductRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, is_ai_generated, ai_source, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock as i32)
        .bind(product.is_ai_generated)
        .bind(&product.ai_source)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn search_products(&self, fragment: &str) -> Result<Vec<ProductRecord>> {
        let pattern = format!(
            "%{}%",
            fragment.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );
        let rows =
            sqlx::query("SELECT * FROM products WHERE name ILIKE $1 ORDER BY created_at ASC")
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_ai_generated(&self) -> Result<Vec<ProductRecord>> {
        let rows =
            sqlx::query("SELECT * FROM products WHERE is_ai_generated ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, product: &ProductRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, stock = $5,
                is_ai_generated = $6, ai_source = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock as i32)
        .bind(product.is_ai_generated)
        .bind(&product.ai_source)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "product" });
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        // Cart rows go with the product via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "product" });
        }
        Ok(())
    }

    async fn delete_stale_ai_products(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM products p
            WHERE p.is_ai_generated
              AND p.created_at < $1
              AND NOT EXISTS (SELECT 1 FROM orders o WHERE o.product_id = p.id)
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn cart_items(&self, user: UserId) -> Result<Vec<CartItemRecord>> {
        let rows = sqlx::query(
            "SELECT id, product_id, quantity FROM cart_items WHERE user_id = $1 ORDER BY id",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_item).collect()
    }

    async fn find_cart_item(
        &self,
        user: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity FROM cart_items WHERE user_id = $1 AND id = $2",
        )
        .bind(user.as_uuid())
        .bind(item.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn find_cart_item_by_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user.as_uuid())
        .bind(product.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn put_cart_item(&self, user: UserId, item: &CartItemRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(user.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_cart_item(&self, user: UserId, item: CartItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = $2")
            .bind(user.as_uuid())
            .bind(item.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "cart item" });
        }
        Ok(())
    }

    async fn commit_checkout(&self, user: UserId, orders: &[OrderRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Lock each ordered product row, re-check the decrement, and
        // apply it. Any shortfall aborts the transaction before any
        // order row exists.
        for order in orders {
            let stock: Option<i32> =
                sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                    .bind(order.product_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            let available = stock.ok_or(StoreError::NotFound { entity: "product" })? as u32;
            if available < order.quantity {
                return Err(StoreError::StockConflict {
                    product_id: order.product_id,
                    requested: order.quantity,
                    available,
                });
            }

            sqlx::query("UPDATE products SET stock = stock - $2, updated_at = $3 WHERE id = $1")
                .bind(order.product_id.as_uuid())
                .bind(order.quantity as i32)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
        }

        for order in orders {
            sqlx::query(
                r#"
                INSERT INTO orders (id, user_id, product_id, product_name, quantity,
                                    unit_price_cents, total_price_cents, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(order.user_id.as_uuid())
            .bind(order.product_id.as_uuid())
            .bind(&order.product_name)
            .bind(order.quantity as i32)
            .bind(order.unit_price.cents())
            .bind(order.total_price.cents())
            .bind(order.status.as_str())
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "order" });
        }
        Ok(())
    }

    async fn count_active_orders(&self, product: ProductId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE product_id = $1 AND status IN ('pending', 'paid', 'shipped')",
        )
        .bind(product.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn insert_review(&self, review: &ReviewRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.user_id.as_uuid())
        .bind(review.rating as i16)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_review_per_user")
            {
                return StoreError::Duplicate { entity: "review" };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn reviews_for_product(&self, product: ProductId) -> Result<Vec<ReviewRecord>> {
        let rows =
            sqlx::query("SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC")
                .bind(product.as_uuid())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_review).collect()
    }

    async fn find_review(&self, product: ProductId, user: UserId) -> Result<Option<ReviewRecord>> {
        let row = sqlx::query("SELECT * FROM reviews WHERE product_id = $1 AND user_id = $2")
            .bind(product.as_uuid())
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_review).transpose()
    }

    async fn upsert_device(&self, device: &DeviceRecord) -> Result<DeviceRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO devices (id, user_id, token, platform, active, created_at, last_used)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT unique_device_token DO UPDATE SET
                active = TRUE,
                last_used = EXCLUDED.last_used
            RETURNING *
            "#,
        )
        .bind(device.id.as_uuid())
        .bind(device.user_id.as_uuid())
        .bind(&device.token)
        .bind(device.platform.as_str())
        .bind(device.active)
        .bind(device.created_at)
        .bind(device.last_used)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_device(row)
    }

    async fn devices_for_user(&self, user: UserId) -> Result<Vec<DeviceRecord>> {
        let rows = sqlx::query("SELECT * FROM devices WHERE user_id = $1 ORDER BY created_at ASC")
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_device).collect()
    }

    async fn find_device(&self, user: UserId, id: DeviceId) -> Result<Option<DeviceRecord>> {
        let row = sqlx::query("SELECT * FROM devices WHERE user_id = $1 AND id = $2")
            .bind(user.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_device).transpose()
    }

    async fn deactivate_device(&self, user: UserId, id: DeviceId) -> Result<()> {
        let result =
            sqlx::query("UPDATE devices SET active = FALSE WHERE user_id = $1 AND id = $2")
                .bind(user.as_uuid())
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "device" });
        }
        Ok(())
    }

    async fn insert_gesture(&self, gesture: &GestureRecord) -> Result<()> {
        let points = serde_json::to_value(&gesture.points)?;

        sqlx::query(
            r#"
            INSERT INTO gestures (id, user_id, gesture_type, points, confidence, processed, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(gesture.id.as_uuid())
        .bind(gesture.user_id.as_uuid())
        .bind(&gesture.gesture_type)
        .bind(points)
        .bind(gesture.confidence)
        .bind(gesture.processed)
        .bind(gesture.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn gesture(&self, id: GestureId) -> Result<Option<GestureRecord>> {
        let row = sqlx::query("SELECT * FROM gestures WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_gesture).transpose()
    }

    async fn gestures_for_user(&self, user: UserId) -> Result<Vec<GestureRecord>> {
        let rows =
            sqlx::query("SELECT * FROM gestures WHERE user_id = $1 ORDER BY recorded_at DESC")
                .bind(user.as_uuid())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_gesture).collect()
    }

    async fn update_gesture(&self, gesture: &GestureRecord) -> Result<()> {
        let points = serde_json::to_value(&gesture.points)?;

        let result = sqlx::query(
            r#"
            UPDATE gestures
            SET gesture_type = $2, points = $3, confidence = $4, processed = $5
            WHERE id = $1
            "#,
        )
        .bind(gesture.id.as_uuid())
        .bind(&gesture.gesture_type)
        .bind(points)
        .bind(gesture.confidence)
        .bind(gesture.processed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "gesture" });
        }
        Ok(())
    }

    async fn gesture_stats_since(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GestureTypeStats>> {
        let rows = sqlx::query(
            r#"
            SELECT gesture_type, COUNT(*) AS count, AVG(confidence) AS mean_confidence
            FROM gestures
            WHERE user_id = $1 AND recorded_at >= $2
            GROUP BY gesture_type
            ORDER BY gesture_type
            "#,
        )
        .bind(user.as_uuid())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(GestureTypeStats {
                    gesture_type: row.try_get("gesture_type")?,
                    count: row.try_get::<i64, _>("count")? as u64,
                    mean_confidence: row.try_get("mean_confidence")?,
                })
            })
            .collect()
    }
}
