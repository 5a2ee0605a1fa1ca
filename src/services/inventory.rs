use crate::{
    db::DbPool,
    entities::device::{self, Availability, Column as DeviceColumn, Entity as Device},
    errors::ServiceError,
    events::{Event, EventSender},
    services::accounts::{AccountClient, PatternLookup, DEVICE_ID_PATTERN},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Fields supplied by the caller when registering a device. The
/// device number, organization, creator, and timestamp are assigned by
/// the service.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub device: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub specifications: Option<String>,
    pub ram: Option<String>,
    pub availability: Availability,
    pub product_id: Option<String>,
    pub price: Option<Decimal>,
    pub date_of_purchase: Option<NaiveDate>,
    pub comments: Option<String>,
    pub accessory_type: Option<String>,
}

/// Sparse update: `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
    pub device: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub specifications: Option<String>,
    pub ram: Option<String>,
    pub availability: Option<Availability>,
    pub product_id: Option<String>,
    pub price: Option<Decimal>,
    pub date_of_purchase: Option<NaiveDate>,
    pub comments: Option<String>,
    pub accessory_type: Option<String>,
}

/// Optional equality filters plus a device-number search term for
/// listing, all scoped to one organization.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub device: Option<String>,
    pub provider: Option<String>,
    pub availability: Option<Availability>,
    pub os: Option<String>,
    pub ram: Option<String>,
    pub search_term: Option<String>,
}

/// Service for managing device inventory records.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    accounts: Arc<AccountClient>,
    event_sender: EventSender,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Renders the next device number from the organization's pattern
/// lookup and a 1-based sequence number.
///
/// With no pattern configured the sequence is returned as a plain
/// decimal. With a pattern, the sequence is zero-padded to
/// `pattern_length - prefix length` digits behind the upper-cased
/// prefix; a prefix at least as long as the pattern length collapses
/// the padding to zero width.
fn format_device_number(lookup: &PatternLookup, sequence: u64) -> String {
    match lookup {
        PatternLookup::NotConfigured => sequence.to_string(),
        PatternLookup::Configured(pattern) => {
            let prefix = pattern.prefix.as_deref().unwrap_or("").to_uppercase();
            let number_length = pattern.pattern_length.saturating_sub(prefix.len());
            format!("{}{:0width$}", prefix, sequence, width = number_length)
        }
    }
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, accounts: Arc<AccountClient>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            accounts,
            event_sender,
        }
    }

    /// Registers a new device for the organization.
    ///
    /// Rejects a non-empty product id that another record already
    /// holds, then assigns the next device number and persists the
    /// record with the system-owned fields filled in.
    #[instrument(skip(self, details))]
    pub async fn add_device(
        &self,
        details: NewDevice,
        organization_id: &str,
        created_by: &str,
    ) -> Result<device::Model, ServiceError> {
        let db = &*self.db_pool;

        let product_id = non_empty(&details.product_id).map(str::to_string);
        if let Some(pid) = product_id.as_deref() {
            if self.find_by_product_id(pid).await?.is_some() {
                return Err(ServiceError::DuplicateData(format!(
                    "Product ID {} already exists",
                    pid
                )));
            }
        }

        let device_number = self.generate_device_number(organization_id).await?;

        let record = device::ActiveModel {
            id: Set(Uuid::new_v4()),
            device: Set(details.device),
            provider: Set(details.provider),
            model: Set(details.model),
            device_type: Set(details.device_type),
            os: Set(details.os),
            specifications: Set(details.specifications),
            ram: Set(details.ram),
            availability: Set(details.availability),
            product_id: Set(product_id),
            price: Set(details.price),
            date_of_purchase: Set(details.date_of_purchase),
            comments: Set(details.comments),
            accessory_type: Set(details.accessory_type),
            device_number: Set(device_number),
            organization_id: Set(organization_id.to_string()),
            created_by: Set(created_by.to_string()),
            created_at: Set(Utc::now()),
        };

        let saved = record.insert(db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                ServiceError::DuplicateData(format!("Device violates a uniqueness rule: {}", detail))
            }
            _ => ServiceError::save_error(e),
        })?;

        self.publish(Event::DeviceAdded(saved.id)).await;
        info!(device_id = %saved.id, device_number = %saved.device_number, "Device added");

        Ok(saved)
    }

    /// Produces the next device number for the organization.
    ///
    /// The count-then-assign sequence is not transactional; the unique
    /// index on (organization_id, device_number) is the backstop for
    /// concurrent writers.
    #[instrument(skip(self))]
    pub async fn generate_device_number(
        &self,
        organization_id: &str,
    ) -> Result<String, ServiceError> {
        let lookup = self
            .accounts
            .get_active_pattern_by_type(organization_id, DEVICE_ID_PATTERN)
            .await?;

        let existing = Device::find()
            .filter(DeviceColumn::OrganizationId.eq(organization_id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::fetch_error)?;

        Ok(format_device_number(&lookup, existing + 1))
    }

    /// Applies a sparse update to a device owned by the organization.
    ///
    /// Every present field of the update overwrites the stored one; an
    /// absent or empty product id never replaces the stored product id.
    #[instrument(skip(self, update))]
    pub async fn update_device_details(
        &self,
        update: DeviceUpdate,
        device_id: Uuid,
        organization_id: &str,
    ) -> Result<device::Model, ServiceError> {
        let db = &*self.db_pool;

        if let Some(pid) = non_empty(&update.product_id) {
            if let Some(existing) = self.find_by_product_id(pid).await? {
                if existing.id != device_id {
                    return Err(ServiceError::DuplicateData(format!(
                        "Product ID {} already exists",
                        pid
                    )));
                }
            }
        }

        let target = self.find_scoped(device_id, organization_id).await?;

        let mut record: device::ActiveModel = target.into();

        if let Some(name) = update.device {
            record.device = Set(name);
        }
        if let Some(provider) = update.provider {
            record.provider = Set(Some(provider));
        }
        if let Some(model) = update.model {
            record.model = Set(Some(model));
        }
        if let Some(device_type) = update.device_type {
            record.device_type = Set(Some(device_type));
        }
        if let Some(os) = update.os {
            record.os = Set(Some(os));
        }
        if let Some(specifications) = update.specifications {
            record.specifications = Set(Some(specifications));
        }
        if let Some(ram) = update.ram {
            record.ram = Set(Some(ram));
        }
        if let Some(availability) = update.availability {
            record.availability = Set(availability);
        }
        if let Some(price) = update.price {
            record.price = Set(Some(price));
        }
        if let Some(date_of_purchase) = update.date_of_purchase {
            record.date_of_purchase = Set(Some(date_of_purchase));
        }
        if let Some(comments) = update.comments {
            record.comments = Set(Some(comments));
        }
        if let Some(accessory_type) = update.accessory_type {
            record.accessory_type = Set(Some(accessory_type));
        }
        // The stored product id survives unless the update carries a
        // non-empty replacement.
        if let Some(pid) = non_empty(&update.product_id) {
            record.product_id = Set(Some(pid.to_string()));
        }

        let updated = record.update(db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                ServiceError::DuplicateData(format!("Device violates a uniqueness rule: {}", detail))
            }
            _ => ServiceError::save_error(e),
        })?;

        self.publish(Event::DeviceUpdated(updated.id)).await;
        info!(device_id = %updated.id, "Device updated");

        Ok(updated)
    }

    /// Deletes a device owned by the organization and returns its
    /// prior state.
    #[instrument(skip(self))]
    pub async fn delete_device(
        &self,
        device_id: Uuid,
        organization_id: &str,
    ) -> Result<device::Model, ServiceError> {
        let db = &*self.db_pool;

        let target = self.find_scoped(device_id, organization_id).await?;
        let snapshot = target.clone();

        target
            .delete(db)
            .await
            .map_err(ServiceError::delete_error)?;

        self.publish(Event::DeviceDeleted(snapshot.id)).await;
        info!(device_id = %snapshot.id, "Device deleted");

        Ok(snapshot)
    }

    /// Lists the organization's devices, newest first, with optional
    /// filters. Returns the requested page plus the total count for
    /// the filter set.
    #[instrument(skip(self))]
    pub async fn list_devices(
        &self,
        organization_id: &str,
        filter: DeviceFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<device::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = Device::find().filter(DeviceColumn::OrganizationId.eq(organization_id));

        if let Some(device) = non_empty(&filter.device) {
            query = query.filter(DeviceColumn::Device.eq(device));
        }
        if let Some(provider) = non_empty(&filter.provider) {
            query = query.filter(DeviceColumn::Provider.eq(provider));
        }
        if let Some(availability) = filter.availability {
            query = query.filter(DeviceColumn::Availability.eq(availability));
        }
        if let Some(os) = non_empty(&filter.os) {
            query = query.filter(DeviceColumn::Os.eq(os));
        }
        if let Some(ram) = non_empty(&filter.ram) {
            query = query.filter(DeviceColumn::Ram.eq(ram));
        }
        if let Some(term) = non_empty(&filter.search_term) {
            query = query.filter(DeviceColumn::DeviceNumber.contains(term));
        }

        let paginator = query
            .order_by_desc(DeviceColumn::CreatedAt)
            .paginate(db, limit.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::fetch_error)?;
        let devices = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::fetch_error)?;

        Ok((devices, total))
    }

    async fn find_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Option<device::Model>, ServiceError> {
        Device::find()
            .filter(DeviceColumn::ProductId.eq(product_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::fetch_error)
    }

    /// Looks a device up by (id, organization). A record owned by a
    /// different organization is reported as absent, not forbidden.
    async fn find_scoped(
        &self,
        device_id: Uuid,
        organization_id: &str,
    ) -> Result<device::Model, ServiceError> {
        Device::find()
            .filter(DeviceColumn::Id.eq(device_id))
            .filter(DeviceColumn::OrganizationId.eq(organization_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::fetch_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Device with ID {} not found", device_id))
            })
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!("Failed to publish inventory event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::accounts::OrganizationPattern;

    fn configured(prefix: Option<&str>, pattern_length: usize) -> PatternLookup {
        PatternLookup::Configured(OrganizationPattern {
            prefix: prefix.map(str::to_string),
            pattern_length,
        })
    }

    #[test]
    fn plain_sequence_without_pattern() {
        assert_eq!(format_device_number(&PatternLookup::NotConfigured, 1), "1");
        assert_eq!(
            format_device_number(&PatternLookup::NotConfigured, 120),
            "120"
        );
    }

    #[test]
    fn prefixed_and_zero_padded_with_pattern() {
        let lookup = configured(Some("DEV"), 6);
        assert_eq!(format_device_number(&lookup, 6), "DEV006");
        assert_eq!(format_device_number(&lookup, 1234), "DEV1234");
    }

    #[test]
    fn prefix_is_upper_cased() {
        let lookup = configured(Some("dev"), 5);
        assert_eq!(format_device_number(&lookup, 7), "DEV07");
    }

    #[test]
    fn missing_prefix_pads_to_full_length() {
        let lookup = configured(None, 4);
        assert_eq!(format_device_number(&lookup, 9), "0009");
    }

    #[test]
    fn oversized_prefix_collapses_padding() {
        let lookup = configured(Some("DEVICES"), 4);
        assert_eq!(format_device_number(&lookup, 12), "DEVICES12");
    }

    #[test]
    fn empty_values_do_not_count_as_product_ids() {
        assert_eq!(non_empty(&Some("".to_string())), None);
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&Some("P-1".to_string())), Some("P-1"));
        assert_eq!(non_empty(&None), None);
    }
}
