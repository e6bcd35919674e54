//! S3-compatible object store
//!
//! Talks to the bucket with `aws-sdk-s3` using static credentials and
//! path-style addressing, which is what 4EVERLAND and MinIO expect.
//!
//! Custom metadata travels as `x-amz-meta-*` headers, so values are
//! percent-encoded on write and decoded on read. Values written by the backend
//! itself (`ipfs-hash`) are plain ASCII and pass through decoding unchanged.

use crate::{ListPage, Metadata, ObjectHead, ObjectStore, ObjectSummary, PageSize, Result, S3Config, StoreError};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime as S3DateTime};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Service error codes that mean the configured credentials are unusable
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
];

/// Object store backed by an S3-compatible bucket
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl S3ObjectStore {
    /// Build a client for the configured endpoint
    pub fn new(config: S3Config) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(StoreError::Configuration("S3 endpoint is empty".to_string()));
        }

        let credentials = Credentials::new(
            config.access_key,
            config.secret_key,
            None,
            None,
            "pinbox-static",
        );

        let sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .endpoint_url(config.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket,
        })
    }

    /// Bucket this store writes to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, payload, metadata), fields(bucket = %self.bucket, size = payload.len()))]
    async fn put_object(
        &self,
        key: &str,
        payload: Bytes,
        media_type: &str,
        metadata: Metadata,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(media_type)
            .set_metadata(Some(encode_metadata(metadata)))
            .body(ByteStream::from(payload))
            .send()
            .await
            .map_err(classify)?;

        debug!(key = %key, "Object stored");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn head_object(&self, key: &str) -> Result<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    StoreError::not_found(key)
                } else {
                    classify(e)
                }
            })?;

        Ok(ObjectHead {
            metadata: output.metadata().map(decode_metadata).unwrap_or_default(),
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified: to_chrono(output.last_modified()),
        })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, page_size = page_size.get()))]
    async fn list_objects(&self, page_size: PageSize, cursor: Option<&str>) -> Result<ListPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(page_size.get() as i32)
            .set_continuation_token(cursor.map(str::to_string))
            .send()
            .await
            .map_err(classify)?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| {
                Some(ObjectSummary {
                    key: obj.key()?.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: to_chrono(obj.last_modified()),
                })
            })
            .collect();

        let next_cursor = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage { objects, next_cursor })
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

/// Map an SDK failure onto the store taxonomy
fn classify<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let service = ctx.err();
            let code = service.code().unwrap_or("Unknown");
            let message = service.message().unwrap_or("no message");
            if CREDENTIAL_ERROR_CODES.contains(&code) {
                StoreError::Unavailable(format!("{}: {}", code, message))
            } else {
                StoreError::Rejected(format!("{}: {}", code, message))
            }
        }
        _ => StoreError::Unavailable(DisplayErrorContext(&err).to_string()),
    }
}

fn to_chrono(value: Option<&S3DateTime>) -> DateTime<Utc> {
    value
        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn encode_metadata(metadata: Metadata) -> HashMap<String, String> {
    metadata
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), urlencoding::encode(&v).into_owned()))
        .collect()
}

fn decode_metadata(metadata: &HashMap<String, String>) -> Metadata {
    metadata
        .iter()
        .map(|(k, v)| {
            let value = urlencoding::decode(v)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| v.clone());
            (k.to_ascii_lowercase(), value)
        })
        .collect()
}
