use std::sync::Arc;

use anyhow::Context as _;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};

use crate::domain::repository::BlobStore;
use crate::error::LeadsServiceError;

/// Resume storage backed by any `object_store` implementation.
#[derive(Clone)]
pub struct ObjectBlobStore {
    pub store: Arc<dyn ObjectStore>,
}

impl ObjectBlobStore {
    /// S3 (or an S3-compatible endpoint such as MinIO). Credentials come from
    /// the standard `AWS_*` environment variables.
    pub fn s3(bucket: &str, region: &str, endpoint: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region);
        if let Some(endpoint) = endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        let store = builder.build().context("build S3 object store")?;
        Ok(Self {
            store: Arc::new(store),
        })
    }
}

impl BlobStore for ObjectBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), LeadsServiceError> {
        self.store
            .put(&Path::from(key), PutPayload::from(data))
            .await
            .with_context(|| format!("put blob {key}"))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, LeadsServiceError> {
        match self.store.get(&Path::from(key)).await {
            Ok(result) => {
                let bytes = result
                    .bytes()
                    .await
                    .with_context(|| format!("read blob {key}"))?;
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(anyhow::Error::from(e)
                .context(format!("get blob {key}"))
                .into()),
        }
    }
}
