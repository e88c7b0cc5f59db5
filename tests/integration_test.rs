mod common;

use actix_web::{http::header, test};
use chrono::DateTime;
use image::{DynamicImage, RgbImage};
use serde_json::json;
use serial_test::serial;
use std::io::Cursor;

use common::TestApp;

const BOUNDARY: &str = "----tripvault-int-boundary";

fn tiny_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, image::Rgb([120, 180, 240]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("failed to encode test PNG");
    out.into_inner()
}

fn upload_body(file_name: &str, content_type: &str, data: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn oid(value: &serde_json::Value) -> String {
    value["$oid"]
        .as_str()
        .expect("expected an ObjectId field")
        .to_string()
}

#[actix_rt::test]
#[serial]
async fn test_full_trip_planning_flow() {
    if common::mongo_client().await.is_none() {
        eprintln!("skipping: MongoDB not reachable");
        return;
    }
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    // Create a trip
    let req = test::TestRequest::post()
        .uri("/api/trips")
        .set_json(&json!({ "name": "Kyoto Trip" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let trip: serde_json::Value = test::read_body_json(resp).await;
    let trip_id = oid(&trip["_id"]);
    assert_eq!(trip["name"], "Kyoto Trip");

    // Manual vault entry; the free-text label folds into the closed set
    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/vault", trip_id))
        .set_json(&json!({
            "name": "Fushimi Inari Hike",
            "description": "Early morning torii gates",
            "activityType": "outdoor adventure"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let vault_item: serde_json::Value = test::read_body_json(resp).await;
    let vault_item_id = oid(&vault_item["_id"]);
    assert_eq!(vault_item["activity_type"], "Adventure");

    // Drop it onto the calendar
    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/itinerary", trip_id))
        .set_json(&json!({
            "itemId": vault_item_id,
            "startTime": "2024-06-01T10:00:00Z",
            "endTime": "2024-06-01T12:00:00Z"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let placement: serde_json::Value = test::read_body_json(resp).await;
    let placement_id = oid(&placement["_id"]);
    assert_eq!(oid(&placement["trip_id"]), trip_id);

    // Move it an hour later
    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}/itinerary/{}", trip_id, placement_id))
        .set_json(&json!({
            "startTime": "2024-06-01T11:00:00Z",
            "endTime": "2024-06-01T13:00:00Z"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let moved: serde_json::Value = test::read_body_json(resp).await;

    let start = DateTime::parse_from_rfc3339(moved["start_time"].as_str().unwrap()).unwrap();
    let end = DateTime::parse_from_rfc3339(moved["end_time"].as_str().unwrap()).unwrap();
    assert!(end > start);

    // The calendar listing carries the embedded vault item
    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}/itinerary", trip_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let calendar: serde_json::Value = test::read_body_json(resp).await;
    let placements = calendar.as_array().unwrap();
    assert_eq!(placements.len(), 1);
    assert_eq!(
        placements[0]["vault_item"]["name"],
        "Fushimi Inari Hike"
    );

    // Deleting the vault item sweeps the calendar clean
    let req = test::TestRequest::delete()
        .uri(&format!("/api/trips/{}/vault/{}", trip_id, vault_item_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let removal: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(removal["placementsRemoved"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}/itinerary", trip_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let calendar: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(calendar.as_array().unwrap().len(), 0);

    // A second delete reports the item as already gone
    let req = test::TestRequest::delete()
        .uri(&format!("/api/trips/{}/vault/{}", trip_id, vault_item_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
#[serial]
async fn test_upload_with_manual_override_creates_vault_item() {
    if common::mongo_client().await.is_none() {
        eprintln!("skipping: MongoDB not reachable");
        return;
    }
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .set_json(&json!({ "name": "Upload Trip" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let trip: serde_json::Value = test::read_body_json(resp).await;
    let trip_id = oid(&trip["_id"]);

    // The override skips the vision call, so this stays deterministic
    let body = upload_body(
        "screenshot.png",
        "image/png",
        &tiny_png(),
        &[
            ("name", "Nishiki Market Lunch"),
            ("description", "Street food stalls"),
            ("activityType", "street market"),
        ],
    );
    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/vault/upload", trip_id))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let item: serde_json::Value = test::read_body_json(resp).await;
    let item_id = oid(&item["_id"]);

    assert_eq!(item["name"], "Nishiki Market Lunch");
    assert_eq!(item["activity_type"], "Shopping");
    assert!(item["image_url"].as_str().is_some());

    // The stored screenshot is retrievable through the storage adapter
    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}/vault/{}/image", trip_id, item_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let bytes = test::read_body(resp).await;
    assert!(!bytes.is_empty());
}

#[actix_rt::test]
#[serial]
async fn test_move_unknown_placement_returns_not_found() {
    if common::mongo_client().await.is_none() {
        eprintln!("skipping: MongoDB not reachable");
        return;
    }
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::put()
        .uri(&format!(
            "/api/trips/{}/itinerary/{}",
            common::unknown_object_id(),
            common::unknown_object_id()
        ))
        .set_json(&json!({
            "startTime": "2024-06-01T10:00:00Z",
            "endTime": "2024-06-01T12:00:00Z"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
