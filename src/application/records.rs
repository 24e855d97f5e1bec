use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{
    Aggregator, Batch, BatchStatus, Consumer, Farmer, IdentityRecord, Inspection, Manufacturer,
    Order, OrderStatus, Rating, VerificationStatus,
};
use crate::storage::{DEFAULT_LIST_LIMIT, Repository};

use super::requests::{
    NewBatch, NewConsumer, NewFarmer, NewKyc, NewOrder, NewRating, StatusUpdate, required,
};
use super::RecordError;

/// Record store for supply chain participants, batches, orders and ratings.
///
/// Writes validate their required fields before touching storage and
/// insert exactly one row. Reads by id return `Ok(None)` when nothing
/// matches.
#[derive(Clone)]
pub struct RecordService {
    repo: Repository,
}

impl RecordService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (creating if needed) the database at the given path and apply the schema.
    pub async fn init(database_path: &str) -> Result<Self, RecordError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, RecordError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Remove every record from every table.
    pub async fn clear_all(&self) -> Result<(), RecordError> {
        self.repo.clear_all().await?;
        warn!("All records cleared");
        Ok(())
    }

    // ========================
    // KYC
    // ========================

    pub async fn create_kyc(&self, req: NewKyc) -> Result<IdentityRecord, RecordError> {
        let kyc_id = required(req.kyc_id, "kyc_id")?;
        let document_number = required(req.document_number, "document_number")?;

        let record = IdentityRecord::new(kyc_id, document_number, Utc::now());
        self.repo.save_kyc(&record).await?;
        info!(kyc_id = %record.kyc_id, "KYC record created");
        Ok(record)
    }

    pub async fn get_kyc(&self, kyc_id: &str) -> Result<Option<IdentityRecord>, RecordError> {
        Ok(self.repo.get_kyc(kyc_id).await?)
    }

    pub async fn list_kyc(&self) -> Result<Vec<IdentityRecord>, RecordError> {
        Ok(self.repo.list_kyc(DEFAULT_LIST_LIMIT).await?)
    }

    /// Change a KYC record's verification status. Returns false if the id is unknown.
    pub async fn update_kyc_status(
        &self,
        kyc_id: &str,
        req: StatusUpdate,
    ) -> Result<bool, RecordError> {
        let value = required(req.status, "status")?;
        let status = VerificationStatus::from_str(&value).ok_or(RecordError::InvalidStatus {
            kind: "verification",
            value,
        })?;

        let updated = self.repo.update_kyc_status(kyc_id, status, Utc::now()).await?;
        info!(kyc_id, %status, updated, "KYC status update");
        Ok(updated)
    }

    // ========================
    // Farmers
    // ========================

    pub async fn create_farmer(&self, req: NewFarmer) -> Result<Farmer, RecordError> {
        let farmer = Farmer {
            farmer_id: required(req.farmer_id, "farmer_id")?,
            name: required(req.name, "name")?,
            location: req.location.unwrap_or_default(),
            contact_number: req.contact_number.unwrap_or_default(),
            kyc_id: required(req.kyc_id, "kyc_id")?,
        };

        self.repo.save_farmer(&farmer).await?;
        info!(farmer_id = %farmer.farmer_id, "Farmer created");
        Ok(farmer)
    }

    pub async fn get_farmer(&self, farmer_id: &str) -> Result<Option<Farmer>, RecordError> {
        Ok(self.repo.get_farmer(farmer_id).await?)
    }

    pub async fn list_farmers(&self) -> Result<Vec<Farmer>, RecordError> {
        Ok(self.repo.list_farmers(DEFAULT_LIST_LIMIT).await?)
    }

    pub async fn farmer_batches(&self, farmer_id: &str) -> Result<Vec<Batch>, RecordError> {
        Ok(self.repo.list_batches_for_farmer(farmer_id).await?)
    }

    pub async fn farmer_ratings(&self, farmer_id: &str) -> Result<Vec<Rating>, RecordError> {
        Ok(self.repo.list_ratings_for_farmer(farmer_id).await?)
    }

    // ========================
    // Consumers
    // ========================

    pub async fn create_consumer(&self, req: NewConsumer) -> Result<Consumer, RecordError> {
        let consumer_id = required(req.consumer_id, "consumer_id")?;
        let consumer_name = required(req.consumer_name, "consumer_name")?;
        let verification = req
            .verification
            .unwrap_or_else(|| VerificationStatus::default().to_string());

        let consumer = Consumer {
            consumer_id,
            consumer_name,
            verification,
        };
        self.repo.save_consumer(&consumer).await?;
        info!(consumer_id = %consumer.consumer_id, "Consumer created");
        Ok(consumer)
    }

    pub async fn get_consumer(&self, consumer_id: &str) -> Result<Option<Consumer>, RecordError> {
        Ok(self.repo.get_consumer(consumer_id).await?)
    }

    pub async fn list_consumers(&self) -> Result<Vec<Consumer>, RecordError> {
        Ok(self.repo.list_consumers(DEFAULT_LIST_LIMIT).await?)
    }

    // ========================
    // Aggregators, manufacturers, inspections (read-only)
    // ========================

    pub async fn get_aggregator(&self, id: &str) -> Result<Option<Aggregator>, RecordError> {
        Ok(self.repo.get_aggregator(id).await?)
    }

    pub async fn list_aggregators(&self) -> Result<Vec<Aggregator>, RecordError> {
        Ok(self.repo.list_aggregators(DEFAULT_LIST_LIMIT).await?)
    }

    pub async fn get_manufacturer(&self, id: &str) -> Result<Option<Manufacturer>, RecordError> {
        Ok(self.repo.get_manufacturer(id).await?)
    }

    pub async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>, RecordError> {
        Ok(self.repo.list_manufacturers(DEFAULT_LIST_LIMIT).await?)
    }

    pub async fn get_inspection(&self, id: &str) -> Result<Option<Inspection>, RecordError> {
        Ok(self.repo.get_inspection(id).await?)
    }

    pub async fn list_inspections(&self) -> Result<Vec<Inspection>, RecordError> {
        Ok(self.repo.list_inspections(DEFAULT_LIST_LIMIT).await?)
    }

    // ========================
    // Batches
    // ========================

    pub async fn create_batch(&self, req: NewBatch) -> Result<Batch, RecordError> {
        let batch_id = required(req.batch_id, "batch_id")?;
        let batch_type = required(req.batch_type, "type")?;
        let farmer_id = required(req.farmer_id, "farmer_id")?;

        let batch = Batch::new(
            batch_id,
            batch_type,
            req.geotag.unwrap_or_default(),
            farmer_id,
            Utc::now(),
        );
        self.repo.save_batch(&batch).await?;
        info!(batch_id = %batch.batch_id, farmer_id = %batch.farmer_id, "Batch created");
        Ok(batch)
    }

    pub async fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>, RecordError> {
        Ok(self.repo.get_batch(batch_id).await?)
    }

    pub async fn list_batches(&self) -> Result<Vec<Batch>, RecordError> {
        Ok(self.repo.list_batches(DEFAULT_LIST_LIMIT).await?)
    }

    pub async fn batch_orders(&self, batch_id: &str) -> Result<Vec<Order>, RecordError> {
        Ok(self.repo.list_orders_for_batch(batch_id).await?)
    }

    pub async fn update_batch_status(
        &self,
        batch_id: &str,
        req: StatusUpdate,
    ) -> Result<bool, RecordError> {
        let value = required(req.status, "status")?;
        let status = BatchStatus::from_str(&value).ok_or(RecordError::InvalidStatus {
            kind: "batch",
            value,
        })?;

        let updated = self.repo.update_batch_status(batch_id, status).await?;
        info!(batch_id, %status, updated, "Batch status update");
        Ok(updated)
    }

    // ========================
    // Orders
    // ========================

    pub async fn create_order(&self, req: NewOrder) -> Result<Order, RecordError> {
        let order_id = required(req.order_id, "order_id")?;
        let order_from = required(req.order_from, "order_from")?;
        let from_id = required(req.from_id, "from_id")?;
        let receiver = required(req.receiver, "receiver")?;
        let receiver_id = required(req.receiver_id, "receiver_id")?;
        let batch_id = required(req.batch_id, "batch_id")?;
        let quantity = required(req.quantity, "quantity")?;
        let price = required(req.price, "price")?;

        let order = Order {
            order_id,
            order_from,
            from_id,
            receiver,
            receiver_id,
            batch_id,
            quantity,
            price,
            status: OrderStatus::Pending,
        };
        self.repo.save_order(&order).await?;
        info!(order_id = %order.order_id, batch_id = %order.batch_id, "Order created");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>, RecordError> {
        Ok(self.repo.get_order(order_id).await?)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, RecordError> {
        Ok(self.repo.list_orders(DEFAULT_LIST_LIMIT).await?)
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        req: StatusUpdate,
    ) -> Result<bool, RecordError> {
        let value = required(req.status, "status")?;
        let status = OrderStatus::from_str(&value).ok_or(RecordError::InvalidStatus {
            kind: "order",
            value,
        })?;

        let updated = self.repo.update_order_status(order_id, status).await?;
        info!(order_id, %status, updated, "Order status update");
        Ok(updated)
    }

    // ========================
    // Ratings
    // ========================

    pub async fn create_rating(&self, req: NewRating) -> Result<Rating, RecordError> {
        let rating_id = required(req.rating_id, "rating_id")?;
        let consumer_id = required(req.consumer_id, "consumer_id")?;
        let farmer_id = required(req.farmer_id, "farmer_id")?;
        let score = required(req.rating, "rating")?;

        if !Rating::is_valid_score(score) {
            return Err(RecordError::InvalidRating(score));
        }

        let rating = Rating {
            rating_id,
            consumer_id,
            farmer_id,
            rating: score,
        };
        self.repo.save_rating(&rating).await?;
        info!(rating_id = %rating.rating_id, farmer_id = %rating.farmer_id, "Rating created");
        Ok(rating)
    }

    pub async fn get_rating(&self, rating_id: &str) -> Result<Option<Rating>, RecordError> {
        Ok(self.repo.get_rating(rating_id).await?)
    }

    pub async fn list_ratings(&self) -> Result<Vec<Rating>, RecordError> {
        Ok(self.repo.list_ratings(DEFAULT_LIST_LIMIT).await?)
    }
}
