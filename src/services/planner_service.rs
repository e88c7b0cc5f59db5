use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, Bson};
use mongodb::{Client, Collection};
use std::collections::HashMap;

use crate::db::mongo::{DATABASE, ITINERARY_ITEMS_COLLECTION, VAULT_ITEMS_COLLECTION};
use crate::models::activity_type::ActivityType;
use crate::models::itinerary_item::{ItineraryItem, PopulatedItineraryItem};
use crate::models::vault_item::VaultItem;

#[derive(Debug)]
pub enum PlannerError {
    NotFound(&'static str),
    DatabaseError(String),
}

impl std::fmt::Display for PlannerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannerError::NotFound(entity) => write!(f, "{} not found", entity),
            PlannerError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for PlannerError {}

impl From<mongodb::error::Error> for PlannerError {
    fn from(err: mongodb::error::Error) -> Self {
        PlannerError::DatabaseError(err.to_string())
    }
}

#[derive(Debug)]
pub struct VaultItemRemoval {
    pub trip_id: ObjectId,
    pub placements_removed: u64,
}

fn vault_items(client: &Client) -> Collection<VaultItem> {
    client.database(DATABASE).collection(VAULT_ITEMS_COLLECTION)
}

fn itinerary_items(client: &Client) -> Collection<ItineraryItem> {
    client.database(DATABASE).collection(ITINERARY_ITEMS_COLLECTION)
}

// Timestamps are stored the way serde writes them on insert, so raw $set
// documents must go through the same serializer.
fn bson_datetime(value: &DateTime<Utc>) -> Result<Bson, PlannerError> {
    mongodb::bson::to_bson(value).map_err(|e| PlannerError::DatabaseError(e.to_string()))
}

/// Places a vault item on the calendar. The owning trip comes from the
/// vault item itself. No overlap checking: the calendar is advisory, not
/// a resource scheduler.
pub async fn add_to_itinerary(
    client: &Client,
    vault_item_id: ObjectId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<ItineraryItem, PlannerError> {
    let vault_item = vault_items(client)
        .find_one(doc! { "_id": vault_item_id })
        .await?
        .ok_or(PlannerError::NotFound("Vault item"))?;

    let now = Utc::now();
    let mut item = ItineraryItem {
        id: None,
        trip_id: vault_item.trip_id,
        vault_item_id,
        start_time,
        end_time,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = itinerary_items(client).insert_one(&item).await?;
    item.id = result.inserted_id.as_object_id();

    Ok(item)
}

/// Move or resize: a single update of the time box. The service accepts any
/// ordered pair; chronological validation happens at the HTTP boundary.
pub async fn move_itinerary_item(
    client: &Client,
    item_id: ObjectId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<ItineraryItem, PlannerError> {
    let update = doc! {
        "$set": {
            "start_time": bson_datetime(&start_time)?,
            "end_time": bson_datetime(&end_time)?,
            "updated_at": bson_datetime(&Utc::now())?,
        }
    };

    itinerary_items(client)
        .find_one_and_update(doc! { "_id": item_id }, update)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or(PlannerError::NotFound("Itinerary item"))
}

pub async fn delete_itinerary_item(
    client: &Client,
    item_id: ObjectId,
) -> Result<ItineraryItem, PlannerError> {
    itinerary_items(client)
        .find_one_and_delete(doc! { "_id": item_id })
        .await?
        .ok_or(PlannerError::NotFound("Itinerary item"))
}

/// Removes a vault item together with every placement referencing it, so no
/// itinerary row is ever left pointing at a deleted vault item. Children go
/// first, then the parent, inside one transaction where the deployment
/// supports it; standalone servers reject transactions, so the same ordered
/// pair of deletes runs without one.
pub async fn delete_vault_item(
    client: &Client,
    vault_item_id: ObjectId,
) -> Result<VaultItemRemoval, PlannerError> {
    let vault = vault_items(client);
    let itinerary = itinerary_items(client);

    let filter = doc! { "_id": vault_item_id };
    let child_filter = doc! { "vault_item_id": vault_item_id };

    // Checked up front so a missing parent never deletes children.
    let existing = vault
        .find_one(filter.clone())
        .await?
        .ok_or(PlannerError::NotFound("Vault item"))?;

    if let Ok(mut session) = client.start_session().await {
        if session.start_transaction().await.is_ok() {
            let cascade = async {
                let removed = itinerary
                    .delete_many(child_filter.clone())
                    .session(&mut session)
                    .await?;
                vault.delete_one(filter.clone()).session(&mut session).await?;
                mongodb::error::Result::Ok(removed.deleted_count)
            }
            .await;

            match cascade {
                Ok(placements_removed) => {
                    session.commit_transaction().await?;
                    return Ok(VaultItemRemoval {
                        trip_id: existing.trip_id,
                        placements_removed,
                    });
                }
                Err(err) => {
                    eprintln!("Transactional cascade failed, retrying without: {}", err);
                    let _ = session.abort_transaction().await;
                }
            }
        }
    }

    let removed = itinerary.delete_many(child_filter).await?;
    vault.delete_one(filter).await?;

    Ok(VaultItemRemoval {
        trip_id: existing.trip_id,
        placements_removed: removed.deleted_count,
    })
}

/// In-place edit of the shared vault entry. Every placement referencing it
/// observes the new fields immediately, placements store a reference, not a
/// copy.
pub async fn update_vault_item(
    client: &Client,
    item_id: ObjectId,
    name: String,
    description: Option<String>,
    activity_type: ActivityType,
) -> Result<VaultItem, PlannerError> {
    let update = doc! {
        "$set": {
            "name": name,
            "description": description.unwrap_or_default(),
            "activity_type": activity_type.as_str(),
            "updated_at": bson_datetime(&Utc::now())?,
        }
    };

    vault_items(client)
        .find_one_and_update(doc! { "_id": item_id }, update)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or(PlannerError::NotFound("Vault item"))
}

/// Duplicates a vault item under the same trip: fresh identity and fields,
/// inherited image reference. A vanished original still yields a copy, just
/// without an image, matching the lenient behavior of the upload flow.
pub async fn copy_vault_item(
    client: &Client,
    trip_id: ObjectId,
    original_item_id: ObjectId,
    name: String,
    description: Option<String>,
    activity_type: ActivityType,
) -> Result<VaultItem, PlannerError> {
    let collection = vault_items(client);

    let image_url = collection
        .find_one(doc! { "_id": original_item_id })
        .await?
        .and_then(|original| original.image_url);

    let now = Utc::now();
    let mut copy = VaultItem {
        id: None,
        trip_id,
        name,
        description,
        activity_type: Some(activity_type),
        image_url,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = collection.insert_one(&copy).await?;
    copy.id = result.inserted_id.as_object_id();

    Ok(copy)
}

/// The "edit this occurrence only" branch: create a copy of the shared
/// vault item with the edited fields, then re-point exactly one placement
/// at it. The original item and every sibling placement stay untouched.
pub async fn copy_vault_item_and_retarget(
    client: &Client,
    itinerary_item_id: ObjectId,
    original_vault_item_id: ObjectId,
    name: String,
    description: Option<String>,
    activity_type: ActivityType,
) -> Result<(VaultItem, ObjectId), PlannerError> {
    let itinerary = itinerary_items(client);

    // Verified before the copy exists so the not-found path creates nothing.
    let placement = itinerary
        .find_one(doc! { "_id": itinerary_item_id })
        .await?
        .ok_or(PlannerError::NotFound("Itinerary item"))?;

    let copy = copy_vault_item(
        client,
        placement.trip_id,
        original_vault_item_id,
        name,
        description,
        activity_type,
    )
    .await?;

    let copy_id = copy
        .id
        .ok_or_else(|| PlannerError::DatabaseError("Copy has no id".to_string()))?;

    let update = doc! {
        "$set": {
            "vault_item_id": copy_id,
            "updated_at": bson_datetime(&Utc::now())?,
        }
    };

    let updated = itinerary
        .update_one(doc! { "_id": itinerary_item_id }, update)
        .await?;
    if updated.matched_count == 0 {
        return Err(PlannerError::NotFound("Itinerary item"));
    }

    Ok((copy, placement.trip_id))
}

/// Calendar listing: placements sorted by start time with the referenced
/// vault item joined in.
pub async fn get_itinerary_items(
    client: &Client,
    trip_id: ObjectId,
) -> Result<Vec<PopulatedItineraryItem>, PlannerError> {
    use futures::TryStreamExt;

    let items: Vec<ItineraryItem> = itinerary_items(client)
        .find(doc! { "trip_id": trip_id })
        .sort(doc! { "start_time": 1 })
        .await?
        .try_collect()
        .await?;

    let vault_ids: Vec<ObjectId> = items.iter().map(|item| item.vault_item_id).collect();

    let referenced: Vec<VaultItem> = vault_items(client)
        .find(doc! { "_id": { "$in": vault_ids } })
        .await?
        .try_collect()
        .await?;

    let mut by_id: HashMap<ObjectId, VaultItem> = HashMap::new();
    for vault_item in referenced {
        if let Some(id) = vault_item.id {
            by_id.insert(id, vault_item);
        }
    }

    Ok(items
        .into_iter()
        .map(|item| {
            let vault_item = by_id.get(&item.vault_item_id).cloned();
            PopulatedItineraryItem { item, vault_item }
        })
        .collect())
}
