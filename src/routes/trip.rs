use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, Bson};
use mongodb::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::db::mongo::{DATABASE, TRIPS_COLLECTION};
use crate::models::trip::Trip;

fn trips(client: &Client) -> mongodb::Collection<Trip> {
    client.database(DATABASE).collection(TRIPS_COLLECTION)
}

#[derive(Debug, Deserialize)]
pub struct TripRequest {
    pub name: String,
    #[serde(default, rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
}

/*
    POST /api/trips
*/
pub async fn create_trip(
    data: web::Data<Arc<Client>>,
    input: web::Json<TripRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    if input.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Trip name is required");
    }

    let now = Utc::now();
    let mut trip = Trip {
        id: None,
        name: input.name.trim().to_string(),
        start_date: input.start_date,
        end_date: input.end_date,
        created_at: Some(now),
        updated_at: Some(now),
    };

    match trips(&client).insert_one(&trip).await {
        Ok(result) => {
            trip.id = result.inserted_id.as_object_id();
            HttpResponse::Ok().json(trip)
        }
        Err(err) => {
            eprintln!("Failed to create trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create trip")
        }
    }
}

/*
    GET /api/trips/{trip_id}
*/
pub async fn get_trip(path: web::Path<String>, data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();

    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    match trips(&client).find_one(doc! { "_id": trip_id }).await {
        Ok(Some(trip)) => HttpResponse::Ok().json(trip),
        Ok(None) => HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to retrieve trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to retrieve trip")
        }
    }
}

/*
    PUT /api/trips/{trip_id}

    Name and dates are the only mutable trip fields.
*/
pub async fn update_trip(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    input: web::Json<TripRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    if input.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Trip name is required");
    }

    let mut set = doc! {
        "name": input.name.trim(),
        "updated_at": bson_date(&Utc::now()),
    };
    if let Some(start_date) = &input.start_date {
        set.insert("start_date", bson_date(start_date));
    }
    if let Some(end_date) = &input.end_date {
        set.insert("end_date", bson_date(end_date));
    }

    match trips(&client)
        .find_one_and_update(doc! { "_id": trip_id }, doc! { "$set": set })
        .return_document(mongodb::options::ReturnDocument::After)
        .await
    {
        Ok(Some(trip)) => HttpResponse::Ok().json(trip),
        Ok(None) => HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to update trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update trip")
        }
    }
}

// Keeps raw updates in the same representation serde uses on insert.
fn bson_date(value: &DateTime<Utc>) -> Bson {
    mongodb::bson::to_bson(value).unwrap_or_else(|_| Bson::String(value.to_rfc3339()))
}
