//! S3-compatible bucket backend.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    config::Credentials,
    error::{DisplayErrorContext, SdkError},
    operation::{create_bucket::CreateBucketError, get_object::GetObjectError},
    primitives::ByteStream,
    types::{
        BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument,
        IndexDocument, WebsiteConfiguration,
    },
};
use log::{debug, info};

use super::{ObjectStore, StoreError, StoreResult};
use crate::config::Config;

const CREDENTIALS_PROVIDER: &str = "cloudphoto";
const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Bucket handle built from the persisted configuration.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: String,
    website_url: String,
}

impl S3Store {
    /// Build a client from the configured endpoint, region and static keys.
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint_url.clone())
            .credentials_provider(credentials)
            .load()
            .await;

        let client = Client::new(&shared_config);
        debug!(
            "S3 client ready for bucket {} at {}",
            config.bucket, config.endpoint_url
        );

        Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
            website_url: config.website_url(),
        }
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create the bucket. A bucket already owned by the caller is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the service refuses to create the bucket.
    pub async fn create_bucket(&self) -> StoreResult<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_AWS_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("Created bucket {}", self.bucket);
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateBucketError::is_bucket_already_owned_by_you) =>
            {
                info!("Bucket {} already exists", self.bucket);
                Ok(())
            }
            Err(err) => Err(classify("create_bucket", err)),
        }
    }

    /// Grant anonymous read access to the whole bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the ACL cannot be applied.
    pub async fn make_public(&self) -> StoreResult<()> {
        self.client
            .put_bucket_acl()
            .bucket(&self.bucket)
            .acl(BucketCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|err| classify("put_bucket_acl", err))?;
        info!("Bucket {} is now public-read", self.bucket);
        Ok(())
    }
}

impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let response = page.map_err(|err| classify("list_objects_v2", err))?;
            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(ToString::to_string),
            );
        }

        debug!("Listed {} objects under s3://{}/{prefix}", keys.len(), self.bucket);
        Ok(keys)
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    StoreError::NotFound(key.to_string())
                } else {
                    classify("get_object", err)
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|err| StoreError::Unavailable {
                operation: "get_object",
                message: err.to_string(),
            })?;

        Ok(body.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| classify("put_object", err))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify("delete_object", err))?;
        Ok(())
    }

    async fn configure_website(
        &self,
        index_document: &str,
        error_document: &str,
    ) -> StoreResult<()> {
        let index = IndexDocument::builder()
            .suffix(index_document)
            .build()
            .map_err(|err| rejected_request("put_bucket_website", &err))?;
        let error = ErrorDocument::builder()
            .key(error_document)
            .build()
            .map_err(|err| rejected_request("put_bucket_website", &err))?;

        self.client
            .put_bucket_website()
            .bucket(&self.bucket)
            .website_configuration(
                WebsiteConfiguration::builder()
                    .index_document(index)
                    .error_document(error)
                    .build(),
            )
            .send()
            .await
            .map_err(|err| classify("put_bucket_website", err))?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }

    fn website_url(&self) -> String {
        self.website_url.clone()
    }
}

/// Split SDK failures into transient transport problems and service refusals.
fn classify<E, R>(operation: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            StoreError::Unavailable { operation, message }
        }
        _ => StoreError::Rejected { operation, message },
    }
}

fn rejected_request(operation: &'static str, err: &impl std::fmt::Display) -> StoreError {
    StoreError::Rejected {
        operation,
        message: err.to_string(),
    }
}
