//! Row storage boundary: cards, designs, face lookups, deliveries.
//!
//! The real row store is an external collaborator reachable through CRUD
//! operations; [`CardStore`] pins down the contract. Designs are stored
//! as opaque structured values and replaced wholesale. The card-faces
//! upsert is atomic per card: the lookup record is either fully old or
//! fully new, never a mix.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::StorageError;

/// Unique identifier for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(Uuid);

impl CardId {
    /// Create a new unique card ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One card owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    /// Card identifier.
    pub id: CardId,
    /// Owning user.
    pub user_id: String,
    /// Card title.
    pub title: String,
    /// Creation time, unix milliseconds.
    pub created_at: u64,
}

/// The face-lookup row: one per card, mapping it to the three stable
/// exported bitmap paths. The single source of truth for "what is live".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFacesRecord {
    /// Card identifier (upsert key).
    pub card_id: CardId,
    /// Stable path of the exported front bitmap.
    pub front_url: String,
    /// Stable path of the exported inside-left bitmap.
    pub inside_left_url: String,
    /// Stable path of the exported inside-right bitmap.
    pub inside_right_url: String,
    /// Last export time, unix milliseconds.
    pub updated_at: u64,
}

/// A share-token row granting anonymous view access to one card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// The card being shared.
    pub card_id: CardId,
    /// Opaque share token.
    pub share_token: String,
    /// Recipient display name.
    pub recipient_name: String,
    /// Best-effort open/view counter.
    pub open_count: u64,
    /// Creation time, unix milliseconds.
    pub created_at: u64,
}

/// The row-store contract.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Insert a new card.
    async fn insert_card(&self, card: CardRecord) -> Result<(), StorageError>;

    /// Fetch a card by ID.
    async fn get_card(&self, card_id: CardId) -> Result<Option<CardRecord>, StorageError>;

    /// All cards owned by a user, newest first.
    async fn list_cards(&self, user_id: &str) -> Result<Vec<CardRecord>, StorageError>;

    /// Replace a card's design wholesale with an opaque structured value.
    async fn put_design(
        &self,
        card_id: CardId,
        design: serde_json::Value,
    ) -> Result<(), StorageError>;

    /// Fetch a card's stored design value.
    async fn get_design(&self, card_id: CardId)
        -> Result<Option<serde_json::Value>, StorageError>;

    /// Atomically insert-or-replace the face-lookup row for a card.
    async fn upsert_card_faces(&self, record: CardFacesRecord) -> Result<(), StorageError>;

    /// Fetch the face-lookup row for a card.
    async fn get_card_faces(
        &self,
        card_id: CardId,
    ) -> Result<Option<CardFacesRecord>, StorageError>;

    /// Insert a new delivery row.
    async fn insert_delivery(&self, delivery: DeliveryRecord) -> Result<(), StorageError>;

    /// Fetch the delivery row for a card, if one exists.
    async fn get_delivery_by_card(
        &self,
        card_id: CardId,
    ) -> Result<Option<DeliveryRecord>, StorageError>;

    /// Fetch a delivery row by its share token.
    async fn get_delivery_by_token(
        &self,
        token: &str,
    ) -> Result<Option<DeliveryRecord>, StorageError>;

    /// Write a caller-computed open count (read-then-write: the counter is
    /// best-effort by design and may undercount under concurrent opens).
    async fn set_open_count(&self, token: &str, open_count: u64) -> Result<(), StorageError>;
}

/// Current unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[derive(Debug, Default)]
struct Tables {
    cards: HashMap<CardId, CardRecord>,
    designs: HashMap<CardId, serde_json::Value>,
    card_faces: HashMap<CardId, CardFacesRecord>,
    deliveries: HashMap<String, DeliveryRecord>,
}

/// In-memory row store for tests and development.
#[derive(Debug, Clone, Default)]
pub struct MemoryCardStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryCardStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    async fn insert_card(&self, card: CardRecord) -> Result<(), StorageError> {
        self.write().cards.insert(card.id, card);
        Ok(())
    }

    async fn get_card(&self, card_id: CardId) -> Result<Option<CardRecord>, StorageError> {
        Ok(self.read().cards.get(&card_id).cloned())
    }

    async fn list_cards(&self, user_id: &str) -> Result<Vec<CardRecord>, StorageError> {
        let mut cards: Vec<CardRecord> = self
            .read()
            .cards
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }

    async fn put_design(
        &self,
        card_id: CardId,
        design: serde_json::Value,
    ) -> Result<(), StorageError> {
        self.write().designs.insert(card_id, design);
        Ok(())
    }

    async fn get_design(
        &self,
        card_id: CardId,
    ) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.read().designs.get(&card_id).cloned())
    }

    async fn upsert_card_faces(&self, record: CardFacesRecord) -> Result<(), StorageError> {
        self.write().card_faces.insert(record.card_id, record);
        Ok(())
    }

    async fn get_card_faces(
        &self,
        card_id: CardId,
    ) -> Result<Option<CardFacesRecord>, StorageError> {
        Ok(self.read().card_faces.get(&card_id).cloned())
    }

    async fn insert_delivery(&self, delivery: DeliveryRecord) -> Result<(), StorageError> {
        self.write()
            .deliveries
            .insert(delivery.share_token.clone(), delivery);
        Ok(())
    }

    async fn get_delivery_by_card(
        &self,
        card_id: CardId,
    ) -> Result<Option<DeliveryRecord>, StorageError> {
        Ok(self
            .read()
            .deliveries
            .values()
            .find(|d| d.card_id == card_id)
            .cloned())
    }

    async fn get_delivery_by_token(
        &self,
        token: &str,
    ) -> Result<Option<DeliveryRecord>, StorageError> {
        Ok(self.read().deliveries.get(token).cloned())
    }

    async fn set_open_count(&self, token: &str, open_count: u64) -> Result<(), StorageError> {
        let mut tables = self.write();
        let delivery = tables
            .deliveries
            .get_mut(token)
            .ok_or_else(|| StorageError::NotFound(format!("delivery {token}")))?;
        delivery.open_count = open_count;
        Ok(())
    }
}
