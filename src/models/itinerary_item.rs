use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::vault_item::VaultItem;

/// A time-boxed placement of a vault item on the trip calendar. Stores a
/// reference, not a copy; edits to the shared vault item show through here.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ItineraryItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub vault_item_id: ObjectId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Calendar view of a placement with its vault item embedded, matching what
/// the frontend renders for each event.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PopulatedItineraryItem {
    #[serde(flatten)]
    pub item: ItineraryItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_item: Option<VaultItem>,
}
