use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::{DATABASE, VAULT_ITEMS_COLLECTION};
use crate::models::activity_type::ActivityType;
use crate::models::vault_item::VaultItem;
use crate::services::planner_service::{self, PlannerError};
use crate::services::storage_service::StorageService;

fn vault_items(client: &Client) -> mongodb::Collection<VaultItem> {
    client.database(DATABASE).collection(VAULT_ITEMS_COLLECTION)
}

#[derive(Debug, Deserialize)]
pub struct VaultItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "activityType")]
    pub activity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VaultItemWithTimeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "activityType")]
    pub activity_type: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CopyVaultItemRequest {
    #[serde(rename = "originalItemId")]
    pub original_item_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "activityType")]
    pub activity_type: Option<String>,
}

fn normalized_type(label: &Option<String>) -> ActivityType {
    match label {
        Some(label) => ActivityType::from_label(label),
        None => ActivityType::Other,
    }
}

/*
    GET /api/trips/{trip_id}/vault
*/
pub async fn get_vault_items(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let client = data.into_inner();

    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    match vault_items(&client)
        .find(doc! { "trip_id": trip_id })
        .sort(doc! { "created_at": -1 })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<VaultItem>>().await {
            Ok(items) => HttpResponse::Ok().json(items),
            Err(err) => {
                eprintln!("Failed to collect vault items: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect vault items")
            }
        },
        Err(err) => {
            eprintln!("Failed to find vault items: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find vault items")
        }
    }
}

/*
    POST /api/trips/{trip_id}/vault

    Manual entry with no image attached.
*/
pub async fn create_vault_item(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    input: web::Json<VaultItemRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    if input.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Name is required");
    }

    let now = Utc::now();
    let mut item = VaultItem {
        id: None,
        trip_id,
        name: input.name.trim().to_string(),
        description: input.description,
        activity_type: Some(normalized_type(&input.activity_type)),
        image_url: None,
        created_at: Some(now),
        updated_at: Some(now),
    };

    match vault_items(&client).insert_one(&item).await {
        Ok(result) => {
            item.id = result.inserted_id.as_object_id();
            HttpResponse::Ok().json(item)
        }
        Err(err) => {
            eprintln!("Failed to create vault item: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create vault item")
        }
    }
}

/*
    POST /api/trips/{trip_id}/vault/with-time

    Creates a vault item and places it on the calendar in one call, used
    when an activity is typed straight onto a time slot.
*/
pub async fn create_vault_item_with_time(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    input: web::Json<VaultItemWithTimeRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    if input.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Name, start time, and end time are required");
    }
    if input.end_time <= input.start_time {
        return HttpResponse::BadRequest().body("End time must be after start time");
    }

    let now = Utc::now();
    let mut item = VaultItem {
        id: None,
        trip_id,
        name: input.name.trim().to_string(),
        description: input.description,
        activity_type: Some(normalized_type(&input.activity_type)),
        image_url: None,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let vault_item_id = match vault_items(&client).insert_one(&item).await {
        Ok(result) => match result.inserted_id.as_object_id() {
            Some(id) => id,
            None => {
                return HttpResponse::InternalServerError()
                    .body("Failed to create vault item with time")
            }
        },
        Err(err) => {
            eprintln!("Failed to create vault item with time: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to create vault item with time");
        }
    };
    item.id = Some(vault_item_id);

    match planner_service::add_to_itinerary(&client, vault_item_id, input.start_time, input.end_time)
        .await
    {
        Ok(placement) => HttpResponse::Ok().json(json!({
            "success": true,
            "vaultItem": item,
            "itineraryItem": placement,
        })),
        Err(err) => {
            eprintln!("Failed to place vault item: {}", err);
            HttpResponse::InternalServerError().body("Failed to create vault item with time")
        }
    }
}

/*
    POST /api/trips/{trip_id}/vault/copy
*/
pub async fn copy_vault_item(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    input: web::Json<CopyVaultItemRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };
    let original_item_id = match ObjectId::parse_str(&input.original_item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid vault item ID"),
    };

    if input.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Name is required");
    }

    match planner_service::copy_vault_item(
        &client,
        trip_id,
        original_item_id,
        input.name.trim().to_string(),
        input.description,
        normalized_type(&input.activity_type),
    )
    .await
    {
        Ok(copy) => HttpResponse::Ok().json(json!({ "success": true, "vaultItem": copy })),
        Err(PlannerError::NotFound(entity)) => {
            HttpResponse::NotFound().body(format!("{} not found", entity))
        }
        Err(err) => {
            eprintln!("Failed to copy vault item: {}", err);
            HttpResponse::InternalServerError().body("Failed to copy vault item")
        }
    }
}

/*
    PUT /api/trips/{trip_id}/vault/{item_id}

    Shared-reference edit: every placement pointing at this item sees the
    change.
*/
pub async fn update_vault_item(
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
    input: web::Json<VaultItemRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let (_, item_id) = path.into_inner();
    let item_id = match ObjectId::parse_str(&item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid vault item ID"),
    };

    if input.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Name is required");
    }

    match planner_service::update_vault_item(
        &client,
        item_id,
        input.name.trim().to_string(),
        input.description,
        normalized_type(&input.activity_type),
    )
    .await
    {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(PlannerError::NotFound(entity)) => {
            HttpResponse::NotFound().body(format!("{} not found", entity))
        }
        Err(err) => {
            eprintln!("Failed to update vault item: {}", err);
            HttpResponse::InternalServerError().body("Failed to update vault item")
        }
    }
}

/*
    DELETE /api/trips/{trip_id}/vault/{item_id}

    Cascades over the itinerary first so no placement is left dangling.
*/
pub async fn delete_vault_item(
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let client = data.into_inner();

    let (_, item_id) = path.into_inner();
    let item_id = match ObjectId::parse_str(&item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid vault item ID"),
    };

    match planner_service::delete_vault_item(&client, item_id).await {
        Ok(removal) => HttpResponse::Ok().json(json!({
            "success": true,
            "placementsRemoved": removal.placements_removed,
        })),
        Err(PlannerError::NotFound(entity)) => {
            HttpResponse::NotFound().body(format!("{} not found", entity))
        }
        Err(err) => {
            eprintln!("Failed to delete vault item: {}", err);
            HttpResponse::InternalServerError().body("Failed to delete vault item")
        }
    }
}

/*
    GET /api/trips/{trip_id}/vault/{item_id}/image

    Serves the stored screenshot through the storage adapter, which is the
    only way to reach images in a private bucket.
*/
pub async fn get_vault_item_image(
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
    storage: web::Data<StorageService>,
) -> impl Responder {
    let client = data.into_inner();

    let (_, item_id) = path.into_inner();
    let item_id = match ObjectId::parse_str(&item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid vault item ID"),
    };

    let item = match vault_items(&client).find_one(doc! { "_id": item_id }).await {
        Ok(Some(item)) => item,
        Ok(None) => return HttpResponse::NotFound().body("Vault item not found"),
        Err(err) => {
            eprintln!("Failed to fetch vault item: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch vault item");
        }
    };

    let image_url = match &item.image_url {
        Some(url) => url,
        None => return HttpResponse::NotFound().body("Vault item has no image"),
    };

    match storage.fetch_image(image_url).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(content_type_for_url(image_url))
            .body(bytes),
        Err(err) => {
            eprintln!("Failed to fetch image: {}", err);
            HttpResponse::InternalServerError().body("Failed to fetch image")
        }
    }
}

fn content_type_for_url(url: &str) -> &'static str {
    if url.ends_with(".png") {
        "image/png"
    } else if url.ends_with(".gif") {
        "image/gif"
    } else if url.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
