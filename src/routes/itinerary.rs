use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::activity_type::ActivityType;
use crate::services::planner_service::{self, PlannerError};

#[derive(Debug, Deserialize)]
pub struct AddToItineraryRequest {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MoveItineraryRequest {
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RetargetRequest {
    #[serde(rename = "originalItemId")]
    pub original_item_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "activityType")]
    pub activity_type: Option<String>,
}

/*
    GET /api/trips/{trip_id}/itinerary
*/
pub async fn get_itinerary_items(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let client = data.into_inner();

    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    match planner_service::get_itinerary_items(&client, trip_id).await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(err) => {
            eprintln!("Failed to retrieve itinerary: {}", err);
            HttpResponse::InternalServerError().body("Failed to retrieve itinerary")
        }
    }
}

/*
    POST /api/trips/{trip_id}/itinerary

    Drops a vault item onto a time slot. Overlaps with other placements are
    allowed.
*/
pub async fn add_to_itinerary(
    data: web::Data<Arc<Client>>,
    input: web::Json<AddToItineraryRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let vault_item_id = match ObjectId::parse_str(&input.item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid vault item ID"),
    };

    if input.end_time <= input.start_time {
        return HttpResponse::BadRequest().body("End time must be after start time");
    }

    match planner_service::add_to_itinerary(&client, vault_item_id, input.start_time, input.end_time)
        .await
    {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(PlannerError::NotFound(entity)) => {
            HttpResponse::NotFound().body(format!("{} not found", entity))
        }
        Err(err) => {
            eprintln!("Failed to add to itinerary: {}", err);
            HttpResponse::InternalServerError().body("Failed to add to itinerary")
        }
    }
}

/*
    PUT /api/trips/{trip_id}/itinerary/{item_id}

    Move or resize a placement.
*/
pub async fn move_itinerary_item(
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
    input: web::Json<MoveItineraryRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let (_, item_id) = path.into_inner();
    let item_id = match ObjectId::parse_str(&item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid itinerary item ID"),
    };

    if input.end_time <= input.start_time {
        return HttpResponse::BadRequest().body("End time must be after start time");
    }

    match planner_service::move_itinerary_item(&client, item_id, input.start_time, input.end_time)
        .await
    {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(PlannerError::NotFound(entity)) => {
            HttpResponse::NotFound().body(format!("{} not found", entity))
        }
        Err(err) => {
            eprintln!("Failed to move itinerary item: {}", err);
            HttpResponse::InternalServerError().body("Failed to move itinerary item")
        }
    }
}

/*
    DELETE /api/trips/{trip_id}/itinerary/{item_id}
*/
pub async fn delete_itinerary_item(
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let client = data.into_inner();

    let (_, item_id) = path.into_inner();
    let item_id = match ObjectId::parse_str(&item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid itinerary item ID"),
    };

    match planner_service::delete_itinerary_item(&client, item_id).await {
        Ok(_) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(PlannerError::NotFound(entity)) => {
            HttpResponse::NotFound().body(format!("{} not found", entity))
        }
        Err(err) => {
            eprintln!("Failed to delete itinerary item: {}", err);
            HttpResponse::InternalServerError().body("Failed to delete itinerary item")
        }
    }
}

/*
    PUT /api/trips/{trip_id}/itinerary/{item_id}/vault-reference

    "Save this instance only": copies the shared vault item and re-points
    this single placement at the copy, leaving siblings on the original.
*/
pub async fn retarget_vault_reference(
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
    input: web::Json<RetargetRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let (_, item_id) = path.into_inner();
    let item_id = match ObjectId::parse_str(&item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid itinerary item ID"),
    };
    let original_item_id = match ObjectId::parse_str(&input.original_item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid vault item ID"),
    };

    if input.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Name is required");
    }

    let activity_type = match &input.activity_type {
        Some(label) => ActivityType::from_label(label),
        None => ActivityType::Other,
    };

    match planner_service::copy_vault_item_and_retarget(
        &client,
        item_id,
        original_item_id,
        input.name.trim().to_string(),
        input.description,
        activity_type,
    )
    .await
    {
        Ok((copy, _)) => HttpResponse::Ok().json(json!({ "success": true, "vaultItem": copy })),
        Err(PlannerError::NotFound(entity)) => {
            HttpResponse::NotFound().body(format!("{} not found", entity))
        }
        Err(err) => {
            eprintln!("Failed to retarget itinerary item: {}", err);
            HttpResponse::InternalServerError().body("Failed to retarget itinerary item")
        }
    }
}
