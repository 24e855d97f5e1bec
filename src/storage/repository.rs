use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Aggregator, Batch, BatchStatus, Consumer, Farmer, IdentityRecord, Inspection, Manufacturer,
    Order, OrderStatus, Rating, VerificationStatus,
};

use super::MIGRATION_001_INITIAL;

/// Tables in child-first order, so deleting in this order never leaves a
/// dangling reference even when foreign keys are enforced.
const TABLES: [&str; 9] = [
    "ratings",
    "orders",
    "inspections",
    "batches",
    "manufacturers",
    "aggregators",
    "consumers",
    "farmers",
    "kyc",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Repository for persisting and querying supply chain records.
///
/// Every write is a single statement; nothing spans more than one table
/// except [`Repository::clear_all`].
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    ///
    /// Foreign keys stay off: references between records are advisory and a
    /// farmer may be recorded before the KYC entry it points at.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = database_url
            .parse::<SqliteConnectOptions>()
            .context("Invalid database URL")?
            .foreign_keys(false);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Safe to run against an already initialized database.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Delete every row from every table in one transaction.
    pub async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        for table in TABLES {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear table {}", table))?;
        }
        tx.commit().await.context("Failed to commit clear")?;
        Ok(())
    }

    // ========================
    // KYC operations
    // ========================

    pub async fn save_kyc(&self, record: &IdentityRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kyc (kyc_id, document_number, verification_status, verified_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.kyc_id)
        .bind(&record.document_number)
        .bind(record.verification_status.as_str())
        .bind(record.verified_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save KYC record")?;
        Ok(())
    }

    pub async fn get_kyc(&self, kyc_id: &str) -> Result<Option<IdentityRecord>> {
        let row = sqlx::query(
            "SELECT kyc_id, document_number, verification_status, verified_at FROM kyc WHERE kyc_id = ?",
        )
        .bind(kyc_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch KYC record")?;

        row.as_ref().map(Self::row_to_kyc).transpose()
    }

    pub async fn list_kyc(&self, limit: i64) -> Result<Vec<IdentityRecord>> {
        let rows = sqlx::query(
            "SELECT kyc_id, document_number, verification_status, verified_at FROM kyc ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list KYC records")?;

        rows.iter().map(Self::row_to_kyc).collect()
    }

    /// Set the verification status and stamp `verified_at`.
    /// Returns false if no record has that id.
    pub async fn update_kyc_status(
        &self,
        kyc_id: &str,
        status: VerificationStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE kyc SET verification_status = ?, verified_at = ? WHERE kyc_id = ?",
        )
        .bind(status.as_str())
        .bind(at.to_rfc3339())
        .bind(kyc_id)
        .execute(&self.pool)
        .await
        .context("Failed to update KYC status")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_kyc(row: &SqliteRow) -> Result<IdentityRecord> {
        let status_str: String = row.get("verification_status");
        let verified_at_str: Option<String> = row.get("verified_at");

        Ok(IdentityRecord {
            kyc_id: row.get("kyc_id"),
            document_number: row.get("document_number"),
            verification_status: VerificationStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid verification status: {}", status_str))?,
            verified_at: verified_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid verified_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    // ========================
    // Farmer operations
    // ========================

    pub async fn save_farmer(&self, farmer: &Farmer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO farmers (farmer_id, name, location, contact_number, kyc_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&farmer.farmer_id)
        .bind(&farmer.name)
        .bind(&farmer.location)
        .bind(&farmer.contact_number)
        .bind(&farmer.kyc_id)
        .execute(&self.pool)
        .await
        .context("Failed to save farmer")?;
        Ok(())
    }

    pub async fn get_farmer(&self, farmer_id: &str) -> Result<Option<Farmer>> {
        let row = sqlx::query(
            "SELECT farmer_id, name, location, contact_number, kyc_id FROM farmers WHERE farmer_id = ?",
        )
        .bind(farmer_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch farmer")?;

        Ok(row.as_ref().map(Self::row_to_farmer))
    }

    pub async fn list_farmers(&self, limit: i64) -> Result<Vec<Farmer>> {
        let rows = sqlx::query(
            "SELECT farmer_id, name, location, contact_number, kyc_id FROM farmers ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list farmers")?;

        Ok(rows.iter().map(Self::row_to_farmer).collect())
    }

    fn row_to_farmer(row: &SqliteRow) -> Farmer {
        Farmer {
            farmer_id: row.get("farmer_id"),
            name: row.get("name"),
            location: row.get("location"),
            contact_number: row.get("contact_number"),
            kyc_id: row.get("kyc_id"),
        }
    }

    // ========================
    // Consumer operations
    // ========================

    pub async fn save_consumer(&self, consumer: &Consumer) -> Result<()> {
        sqlx::query(
            "INSERT INTO consumers (consumer_id, consumer_name, verification) VALUES (?, ?, ?)",
        )
        .bind(&consumer.consumer_id)
        .bind(&consumer.consumer_name)
        .bind(&consumer.verification)
        .execute(&self.pool)
        .await
        .context("Failed to save consumer")?;
        Ok(())
    }

    pub async fn get_consumer(&self, consumer_id: &str) -> Result<Option<Consumer>> {
        let row = sqlx::query(
            "SELECT consumer_id, consumer_name, verification FROM consumers WHERE consumer_id = ?",
        )
        .bind(consumer_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch consumer")?;

        Ok(row.as_ref().map(Self::row_to_consumer))
    }

    pub async fn list_consumers(&self, limit: i64) -> Result<Vec<Consumer>> {
        let rows = sqlx::query(
            "SELECT consumer_id, consumer_name, verification FROM consumers ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list consumers")?;

        Ok(rows.iter().map(Self::row_to_consumer).collect())
    }

    fn row_to_consumer(row: &SqliteRow) -> Consumer {
        Consumer {
            consumer_id: row.get("consumer_id"),
            consumer_name: row.get("consumer_name"),
            verification: row.get("verification"),
        }
    }

    // ========================
    // Aggregator / manufacturer operations (read-only)
    // ========================

    pub async fn get_aggregator(&self, aggregator_id: &str) -> Result<Option<Aggregator>> {
        let row = sqlx::query(
            "SELECT aggregator_id, name, location, contact_number FROM aggregators WHERE aggregator_id = ?",
        )
        .bind(aggregator_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch aggregator")?;

        Ok(row.map(|row| Aggregator {
            aggregator_id: row.get("aggregator_id"),
            name: row.get("name"),
            location: row.get("location"),
            contact_number: row.get("contact_number"),
        }))
    }

    pub async fn list_aggregators(&self, limit: i64) -> Result<Vec<Aggregator>> {
        let rows = sqlx::query(
            "SELECT aggregator_id, name, location, contact_number FROM aggregators ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list aggregators")?;

        Ok(rows
            .iter()
            .map(|row| Aggregator {
                aggregator_id: row.get("aggregator_id"),
                name: row.get("name"),
                location: row.get("location"),
                contact_number: row.get("contact_number"),
            })
            .collect())
    }

    pub async fn get_manufacturer(&self, manufacturer_id: &str) -> Result<Option<Manufacturer>> {
        let row = sqlx::query(
            "SELECT manufacturer_id, name, location, contact_number FROM manufacturers WHERE manufacturer_id = ?",
        )
        .bind(manufacturer_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch manufacturer")?;

        Ok(row.map(|row| Manufacturer {
            manufacturer_id: row.get("manufacturer_id"),
            name: row.get("name"),
            location: row.get("location"),
            contact_number: row.get("contact_number"),
        }))
    }

    pub async fn list_manufacturers(&self, limit: i64) -> Result<Vec<Manufacturer>> {
        let rows = sqlx::query(
            "SELECT manufacturer_id, name, location, contact_number FROM manufacturers ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list manufacturers")?;

        Ok(rows
            .iter()
            .map(|row| Manufacturer {
                manufacturer_id: row.get("manufacturer_id"),
                name: row.get("name"),
                location: row.get("location"),
                contact_number: row.get("contact_number"),
            })
            .collect())
    }

    // ========================
    // Batch operations
    // ========================

    pub async fn save_batch(&self, batch: &Batch) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO batches (batch_id, type, geotag, farmer_id, date, time, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&batch.batch_id)
        .bind(&batch.batch_type)
        .bind(&batch.geotag)
        .bind(&batch.farmer_id)
        .bind(batch.date.format(DATE_FORMAT).to_string())
        .bind(batch.time.format(TIME_FORMAT).to_string())
        .bind(batch.status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to save batch")?;
        Ok(())
    }

    pub async fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>> {
        let row = sqlx::query(
            "SELECT batch_id, type, geotag, farmer_id, date, time, status FROM batches WHERE batch_id = ?",
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch batch")?;

        row.as_ref().map(Self::row_to_batch).transpose()
    }

    pub async fn list_batches(&self, limit: i64) -> Result<Vec<Batch>> {
        let rows = sqlx::query(
            "SELECT batch_id, type, geotag, farmer_id, date, time, status FROM batches ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list batches")?;

        rows.iter().map(Self::row_to_batch).collect()
    }

    pub async fn list_batches_for_farmer(&self, farmer_id: &str) -> Result<Vec<Batch>> {
        let rows = sqlx::query(
            "SELECT batch_id, type, geotag, farmer_id, date, time, status FROM batches WHERE farmer_id = ? ORDER BY rowid",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list batches for farmer")?;

        rows.iter().map(Self::row_to_batch).collect()
    }

    pub async fn update_batch_status(&self, batch_id: &str, status: BatchStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE batches SET status = ? WHERE batch_id = ?")
            .bind(status.as_str())
            .bind(batch_id)
            .execute(&self.pool)
            .await
            .context("Failed to update batch status")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_batch(row: &SqliteRow) -> Result<Batch> {
        let date_str: String = row.get("date");
        let time_str: String = row.get("time");
        let status_str: String = row.get("status");

        Ok(Batch {
            batch_id: row.get("batch_id"),
            batch_type: row.get("type"),
            geotag: row.get("geotag"),
            farmer_id: row.get("farmer_id"),
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .context("Invalid batch date")?,
            time: NaiveTime::parse_from_str(&time_str, TIME_FORMAT)
                .context("Invalid batch time")?,
            status: BatchStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid batch status: {}", status_str))?,
        })
    }

    // ========================
    // Inspection operations (read-only)
    // ========================

    pub async fn get_inspection(&self, inspection_id: &str) -> Result<Option<Inspection>> {
        let row = sqlx::query(
            "SELECT inspection_id, batch_id, inspector, grade, remarks, inspected_at FROM inspections WHERE inspection_id = ?",
        )
        .bind(inspection_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch inspection")?;

        Ok(row.as_ref().map(Self::row_to_inspection))
    }

    pub async fn list_inspections(&self, limit: i64) -> Result<Vec<Inspection>> {
        let rows = sqlx::query(
            "SELECT inspection_id, batch_id, inspector, grade, remarks, inspected_at FROM inspections ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list inspections")?;

        Ok(rows.iter().map(Self::row_to_inspection).collect())
    }

    fn row_to_inspection(row: &SqliteRow) -> Inspection {
        Inspection {
            inspection_id: row.get("inspection_id"),
            batch_id: row.get("batch_id"),
            inspector: row.get("inspector"),
            grade: row.get("grade"),
            remarks: row.get("remarks"),
            inspected_at: row.get("inspected_at"),
        }
    }

    // ========================
    // Order operations
    // ========================

    pub async fn save_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_id, order_from, from_id, receiver, receiver_id, batch_id, quantity, price, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.order_id)
        .bind(&order.order_from)
        .bind(&order.from_id)
        .bind(&order.receiver)
        .bind(&order.receiver_id)
        .bind(&order.batch_id)
        .bind(order.quantity)
        .bind(order.price)
        .bind(order.status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to save order")?;
        Ok(())
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, order_from, from_id, receiver, receiver_id, batch_id, quantity, price, status
            FROM orders
            WHERE order_id = ?
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order")?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    pub async fn list_orders(&self, limit: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, order_from, from_id, receiver, receiver_id, batch_id, quantity, price, status
            FROM orders
            ORDER BY rowid
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list orders")?;

        rows.iter().map(Self::row_to_order).collect()
    }

    pub async fn list_orders_for_batch(&self, batch_id: &str) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, order_from, from_id, receiver, receiver_id, batch_id, quantity, price, status
            FROM orders
            WHERE batch_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list orders for batch")?;

        rows.iter().map(Self::row_to_order).collect()
    }

    pub async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE order_id = ?")
            .bind(status.as_str())
            .bind(order_id)
            .execute(&self.pool)
            .await
            .context("Failed to update order status")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_order(row: &SqliteRow) -> Result<Order> {
        let status_str: String = row.get("status");

        Ok(Order {
            order_id: row.get("order_id"),
            order_from: row.get("order_from"),
            from_id: row.get("from_id"),
            receiver: row.get("receiver"),
            receiver_id: row.get("receiver_id"),
            batch_id: row.get("batch_id"),
            quantity: row.get("quantity"),
            price: row.get("price"),
            status: OrderStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid order status: {}", status_str))?,
        })
    }

    // ========================
    // Rating operations
    // ========================

    pub async fn save_rating(&self, rating: &Rating) -> Result<()> {
        sqlx::query(
            "INSERT INTO ratings (rating_id, consumer_id, farmer_id, rating) VALUES (?, ?, ?, ?)",
        )
        .bind(&rating.rating_id)
        .bind(&rating.consumer_id)
        .bind(&rating.farmer_id)
        .bind(rating.rating)
        .execute(&self.pool)
        .await
        .context("Failed to save rating")?;
        Ok(())
    }

    pub async fn get_rating(&self, rating_id: &str) -> Result<Option<Rating>> {
        let row = sqlx::query(
            "SELECT rating_id, consumer_id, farmer_id, rating FROM ratings WHERE rating_id = ?",
        )
        .bind(rating_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch rating")?;

        Ok(row.as_ref().map(Self::row_to_rating))
    }

    pub async fn list_ratings(&self, limit: i64) -> Result<Vec<Rating>> {
        let rows = sqlx::query(
            "SELECT rating_id, consumer_id, farmer_id, rating FROM ratings ORDER BY rowid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ratings")?;

        Ok(rows.iter().map(Self::row_to_rating).collect())
    }

    pub async fn list_ratings_for_farmer(&self, farmer_id: &str) -> Result<Vec<Rating>> {
        let rows = sqlx::query(
            "SELECT rating_id, consumer_id, farmer_id, rating FROM ratings WHERE farmer_id = ? ORDER BY rowid",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ratings for farmer")?;

        Ok(rows.iter().map(Self::row_to_rating).collect())
    }

    fn row_to_rating(row: &SqliteRow) -> Rating {
        Rating {
            rating_id: row.get("rating_id"),
            consumer_id: row.get("consumer_id"),
            farmer_id: row.get("farmer_id"),
            rating: row.get("rating"),
        }
    }
}
