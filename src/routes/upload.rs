use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::oid::ObjectId;
use mongodb::Client;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::mongo::{DATABASE, VAULT_ITEMS_COLLECTION};
use crate::models::activity_type::ActivityType;
use crate::models::vault_item::VaultItem;
use crate::services::image_processing;
use crate::services::storage_service::StorageService;
use crate::services::vision_service::{ParsedActivity, VisionService};

struct UploadForm {
    file_bytes: Option<Vec<u8>>,
    file_name: String,
    content_type: String,
    name: Option<String>,
    description: Option<String>,
    activity_type: Option<String>,
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Option<String> {
    let mut bytes = Vec::new();
    while let Some(Ok(chunk)) = field.next().await {
        bytes.extend_from_slice(&chunk);
    }
    let text = String::from_utf8_lossy(&bytes).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

async fn read_upload_form(payload: &mut Multipart) -> Result<UploadForm, &'static str> {
    let mut form = UploadForm {
        file_bytes: None,
        file_name: String::new(),
        content_type: String::new(),
        name: None,
        description: None,
        activity_type: None,
    };

    while let Ok(Some(mut field)) = payload.try_next().await {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                form.file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or("upload")
                    .to_string();
                form.content_type = field
                    .content_type()
                    .map(|mime| mime.to_string())
                    .unwrap_or_default();

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    match chunk {
                        Ok(chunk) => bytes.extend_from_slice(&chunk),
                        Err(_) => return Err("Failed to read upload data"),
                    }
                }
                form.file_bytes = Some(bytes);
            }
            "name" => form.name = read_text_field(&mut field).await,
            "description" => form.description = read_text_field(&mut field).await,
            "activityType" => form.activity_type = read_text_field(&mut field).await,
            _ => {
                // Drain unknown parts so the multipart stream stays in sync.
                while field.next().await.is_some() {}
            }
        }
    }

    Ok(form)
}

/*
    POST /api/trips/{trip_id}/vault/upload

    The screenshot pipeline: validate, downsize when oversized, store,
    classify, insert. The image is stored before the row is inserted so a
    storage failure never leaves a vault item pointing at nothing. A failed
    classification falls back to a generic record instead of failing the
    upload.
*/
pub async fn upload_screenshot(
    mut payload: Multipart,
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    storage: web::Data<StorageService>,
) -> impl Responder {
    let client = data.into_inner();

    let trip_id_raw = path.into_inner();
    let trip_id = match ObjectId::parse_str(&trip_id_raw) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    let form = match read_upload_form(&mut payload).await {
        Ok(form) => form,
        Err(message) => return HttpResponse::InternalServerError().body(message),
    };

    let bytes = match form.file_bytes {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return HttpResponse::BadRequest().body("File and trip ID are required"),
    };

    if !image_processing::is_image_content_type(&form.content_type) {
        return HttpResponse::BadRequest().body("Please upload an image file");
    }

    if image_processing::is_heic(&form.content_type, &form.file_name) {
        return HttpResponse::BadRequest().body(
            "HEIC images are not supported. Please convert the image to JPEG or PNG and try again.",
        );
    }

    let prepared = match image_processing::prepare_for_storage(bytes, &form.content_type) {
        Ok(prepared) => prepared,
        Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
    };

    let extension =
        image_processing::extension_for_content_type(&prepared.content_type).unwrap_or("jpg");
    let object_name = format!(
        "{}/{}-{}.{}",
        trip_id_raw,
        Utc::now().timestamp(),
        Uuid::new_v4(),
        extension
    );

    let image_url = match storage
        .put_image(prepared.bytes.clone(), &object_name, &prepared.content_type)
        .await
    {
        Ok(url) => url,
        Err(err) => {
            eprintln!("Failed to store screenshot: {}", err);
            return HttpResponse::InternalServerError().body("Failed to upload screenshot");
        }
    };

    // A manual override skips the vision call entirely.
    let parsed = match form.name {
        Some(name) => ParsedActivity {
            name,
            description: form.description.unwrap_or_default(),
            activity_type: form.activity_type.unwrap_or_else(|| "Other".to_string()),
        },
        None => classify_screenshot(&prepared.bytes, &prepared.content_type).await,
    };

    let now = Utc::now();
    let mut item = VaultItem {
        id: None,
        trip_id,
        name: parsed.name,
        description: Some(parsed.description).filter(|d| !d.is_empty()),
        activity_type: Some(ActivityType::from_label(&parsed.activity_type)),
        image_url: Some(image_url),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let collection: mongodb::Collection<VaultItem> =
        client.database(DATABASE).collection(VAULT_ITEMS_COLLECTION);

    match collection.insert_one(&item).await {
        Ok(result) => {
            item.id = result.inserted_id.as_object_id();
            HttpResponse::Ok().json(item)
        }
        Err(err) => {
            eprintln!("Failed to insert vault item: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to upload screenshot")
        }
    }
}

/// Upload success never depends on the vision adapter: any failure here,
/// missing key included, yields the fixed fallback record.
async fn classify_screenshot(image_bytes: &[u8], content_type: &str) -> ParsedActivity {
    let service = match VisionService::new() {
        Ok(service) => service,
        Err(err) => {
            eprintln!("Vision service unavailable: {}", err);
            return ParsedActivity::fallback();
        }
    };

    match service.parse_screenshot(image_bytes, content_type).await {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("Failed to classify screenshot: {}", err);
            ParsedActivity::fallback()
        }
    }
}
