use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;

const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const LOCAL_URL_PREFIX: &str = "/uploads/";

#[derive(Debug)]
pub enum StorageError {
    GcsError(String),
    IoError(String),
    InvalidUrl(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::GcsError(err) => write!(f, "GCS error: {}", err),
            StorageError::IoError(err) => write!(f, "IO error: {}", err),
            StorageError::InvalidUrl(err) => write!(f, "Invalid storage URL: {}", err),
        }
    }
}

impl std::error::Error for StorageError {}

enum Backend {
    Gcs {
        client: GcsClient,
        bucket: String,
        base_url: String,
    },
    Local {
        root: PathBuf,
    },
}

/// Stores uploaded screenshots and hands back a retrievable URL. Backed by
/// Cloud Storage when SCREENSHOT_BUCKET is configured, a local uploads
/// directory otherwise (the development setup).
pub struct StorageService {
    backend: Backend,
}

impl StorageService {
    pub async fn from_env() -> Self {
        if let Ok(bucket) = env::var("SCREENSHOT_BUCKET") {
            match ClientConfig::default().with_auth().await {
                Ok(config) => {
                    let base_url = env::var("CLOUD_STORAGE_URL")
                        .unwrap_or_else(|_| DEFAULT_STORAGE_URL.to_string());
                    println!("Using Cloud Storage bucket: {}", bucket);
                    return Self {
                        backend: Backend::Gcs {
                            client: GcsClient::new(config),
                            bucket,
                            base_url,
                        },
                    };
                }
                Err(e) => {
                    eprintln!("Failed to initialize GCS client: {}", e);
                    eprintln!("Falling back to local uploads directory");
                }
            }
        }

        let root = env::var("UPLOADS_DIR").unwrap_or_else(|_| DEFAULT_UPLOADS_DIR.to_string());
        Self::local(PathBuf::from(root))
    }

    pub fn local(root: PathBuf) -> Self {
        Self {
            backend: Backend::Local { root },
        }
    }

    pub async fn put_image(
        &self,
        bytes: Vec<u8>,
        object_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        match &self.backend {
            Backend::Gcs {
                client,
                bucket,
                base_url,
            } => {
                let mut media = Media::new(object_name.to_string());
                media.content_type = Cow::Owned(content_type.to_string());

                let upload_request = UploadObjectRequest {
                    bucket: bucket.clone(),
                    ..Default::default()
                };

                client
                    .upload_object(&upload_request, bytes, &UploadType::Simple(media))
                    .await
                    .map_err(|e| StorageError::GcsError(format!("Failed to upload: {}", e)))?;

                Ok(format!("{}/{}/{}", base_url, bucket, object_name))
            }
            Backend::Local { root } => {
                let path = root.join(object_name);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| StorageError::IoError(e.to_string()))?;
                }
                tokio::fs::write(&path, bytes)
                    .await
                    .map_err(|e| StorageError::IoError(e.to_string()))?;

                Ok(format!("{}{}", LOCAL_URL_PREFIX, object_name))
            }
        }
    }

    /// Re-fetches stored bytes from a URL previously returned by
    /// `put_image`. Needed to serve images from private buckets.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        match &self.backend {
            Backend::Gcs {
                client,
                bucket,
                base_url,
            } => {
                let prefix = format!("{}/{}/", base_url, bucket);
                let object_name = url
                    .strip_prefix(&prefix)
                    .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

                let request = GetObjectRequest {
                    bucket: bucket.clone(),
                    object: object_name.to_string(),
                    ..Default::default()
                };

                client
                    .download_object(&request, &Range::default())
                    .await
                    .map_err(|e| StorageError::GcsError(format!("Failed to download: {}", e)))
            }
            Backend::Local { root } => {
                let object_name = url
                    .strip_prefix(LOCAL_URL_PREFIX)
                    .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

                tokio::fs::read(root.join(object_name))
                    .await
                    .map_err(|e| StorageError::IoError(e.to_string()))
            }
        }
    }
}
