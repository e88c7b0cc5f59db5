#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::{web, App};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use std::sync::Arc;
use std::time::Duration;

use tripvault_api::routes;
use tripvault_api::services::storage_service::StorageService;

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mongo_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("MongoDB URI may be incorrect! Failed to parse.");

        Self {
            client: Arc::new(client),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<
                actix_web::body::EitherBody<actix_web::body::BoxBody>,
            >,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(StorageService::local(
                std::env::temp_dir().join("tripvault-test-uploads"),
            )))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .service(
                web::scope("/api").service(
                    web::scope("/trips")
                        .route("", web::post().to(routes::trip::create_trip))
                        .route("/{trip_id}", web::get().to(routes::trip::get_trip))
                        .route("/{trip_id}", web::put().to(routes::trip::update_trip))
                        .service(
                            web::scope("/{trip_id}/vault")
                                .route("", web::get().to(routes::vault::get_vault_items))
                                .route("", web::post().to(routes::vault::create_vault_item))
                                .route(
                                    "/upload",
                                    web::post().to(routes::upload::upload_screenshot),
                                )
                                .route(
                                    "/with-time",
                                    web::post().to(routes::vault::create_vault_item_with_time),
                                )
                                .route("/copy", web::post().to(routes::vault::copy_vault_item))
                                .route(
                                    "/{item_id}",
                                    web::put().to(routes::vault::update_vault_item),
                                )
                                .route(
                                    "/{item_id}",
                                    web::delete().to(routes::vault::delete_vault_item),
                                )
                                .route(
                                    "/{item_id}/image",
                                    web::get().to(routes::vault::get_vault_item_image),
                                ),
                        )
                        .service(
                            web::scope("/{trip_id}/itinerary")
                                .route("", web::get().to(routes::itinerary::get_itinerary_items))
                                .route("", web::post().to(routes::itinerary::add_to_itinerary))
                                .route(
                                    "/{item_id}",
                                    web::put().to(routes::itinerary::move_itinerary_item),
                                )
                                .route(
                                    "/{item_id}",
                                    web::delete().to(routes::itinerary::delete_itinerary_item),
                                )
                                .route(
                                    "/{item_id}/vault-reference",
                                    web::put().to(routes::itinerary::retarget_vault_reference),
                                ),
                        ),
                ),
            )
    }
}

/// Connects with a short timeout and pings; tests that need a live database
/// call this and return early when it yields None, so the suite still
/// passes on machines without a local MongoDB.
pub async fn mongo_client() -> Option<Arc<mongodb::Client>> {
    let mongo_uri =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mut options = ClientOptions::parse(&mongo_uri).await.ok()?;
    options.connect_timeout = Some(Duration::from_secs(2));
    options.server_selection_timeout = Some(Duration::from_secs(2));

    let client = mongodb::Client::with_options(options).ok()?;
    client
        .database("TripVault")
        .run_command(doc! {"ping": 1})
        .await
        .ok()?;

    Some(Arc::new(client))
}

/// A syntactically valid ObjectId that no document will ever carry.
pub fn unknown_object_id() -> String {
    "507f1f77bcf86cd799439011".to_string()
}

pub fn multipart_body(
    boundary: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            boundary, file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
