use actix_web::{web, HttpResponse, Responder};
use mongodb::{bson::doc, Client};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use crate::db::mongo::DATABASE;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(client: web::Data<Arc<Client>>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mongo_result = check_mongodb(&client).await;
    health
        .services
        .insert("mongodb".to_string(), mongo_result.clone());

    let storage_result = check_storage();
    health
        .services
        .insert("storage".to_string(), storage_result.clone());

    let vision_result = check_vision_api();
    health
        .services
        .insert("vision".to_string(), vision_result.clone());

    // Any failing service degrades the overall status
    if mongo_result.status != "ok"
        || storage_result.status != "ok"
        || vision_result.status != "ok"
    {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(client: &web::Data<Arc<Client>>) -> ServiceStatus {
    match client.database(DATABASE).run_command(doc! {"ping": 1}).await {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Connected successfully to MongoDB".to_string()),
        },
        Err(e) => {
            eprintln!("MongoDB health check failed: {}", e);

            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("Failed to connect: {}", e)),
            }
        }
    }
}

fn check_storage() -> ServiceStatus {
    // Local disk is a valid backend, so a missing bucket is not an error
    match env::var("SCREENSHOT_BUCKET") {
        Ok(bucket) => ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("Cloud Storage bucket '{}' configured", bucket)),
        },
        Err(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Using local uploads directory".to_string()),
        },
    }
}

fn check_vision_api() -> ServiceStatus {
    match env::var("OPENAI_API_KEY") {
        Ok(key) => {
            let masked_key = if key.len() > 8 {
                format!("{}***{}", &key[0..4], &key[key.len() - 4..])
            } else {
                "***".to_string()
            };

            ServiceStatus {
                status: "ok".to_string(),
                details: Some(format!("Vision API key configured ({})", masked_key)),
            }
        }
        Err(_) => ServiceStatus {
            status: "error".to_string(),
            details: Some("OPENAI_API_KEY not configured".to_string()),
        },
    }
}
