use std::{env, path::PathBuf};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use tripvault_api::db;
use tripvault_api::routes;
use tripvault_api::services::storage_service::StorageService;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[cfg(debug_assertions)]
fn setup_credentials() {
    println!("Credentials setup complete");

    let credentials_path = PathBuf::from("credentials/service-account.json");
    env::set_var(
        "GOOGLE_APPLICATION_CREDENTIALS",
        credentials_path.to_str().unwrap(),
    );
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    #[cfg(debug_assertions)]
    setup_credentials();

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    println!("MongoDB connection established");

    let storage = web::Data::new(StorageService::from_env().await);

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/health", web::get().to(routes::health::health_check))
            .app_data(web::Data::new(client.clone()))
            .app_data(storage.clone())
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
    })
    .bind((host, port))?
    .run()
    .await
}
