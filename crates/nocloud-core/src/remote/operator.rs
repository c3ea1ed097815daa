//! OpenDAL operator factory for remote drivers

use std::path::Path;

use opendal::Operator;

use crate::config::{RemoteConfig, S3Settings, DEFAULT_REGION};
use crate::error::{NoCloudError, Result};

/// Build the OpenDAL operator for `config`.
///
/// Relative `local` paths are resolved against `root`.
pub fn build_operator(config: &RemoteConfig, root: &Path) -> Result<Operator> {
    match config {
        RemoteConfig::S3(settings) => layered(s3_builder(settings)),
        RemoteConfig::Minio(settings) => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                NoCloudError::Config("`endpoint` not found in configuration".to_string())
            })?;
            // path-style addressing is the opendal default, which MinIO needs
            layered(s3_builder(settings).endpoint(endpoint))
        }
        RemoteConfig::Local { path } => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            let builder = opendal::services::Fs::default().root(&path.to_string_lossy());
            layered(builder)
        }
    }
}

fn layered<B: opendal::Builder>(builder: B) -> Result<Operator> {
    Ok(Operator::new(builder)?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish())
}

fn s3_builder(settings: &S3Settings) -> opendal::services::S3 {
    let region = settings.region.as_deref().unwrap_or(DEFAULT_REGION);
    let builder = opendal::services::S3::default()
        .bucket(&settings.bucket)
        .region(region)
        .access_key_id(&settings.key)
        .secret_access_key(&settings.secret);

    match settings.endpoint.as_deref() {
        Some(endpoint) => builder.endpoint(endpoint),
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: Option<&str>) -> S3Settings {
        S3Settings {
            bucket: "test-bucket".to_string(),
            key: "test-key".to_string(),
            secret: "test-secret".to_string(),
            region: None,
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_build_s3_operator() {
        let config = RemoteConfig::S3(settings(None));
        assert!(build_operator(&config, Path::new("/tmp")).is_ok());
    }

    #[test]
    fn test_build_minio_operator() {
        let config = RemoteConfig::Minio(settings(Some("http://localhost:9000")));
        assert!(build_operator(&config, Path::new("/tmp")).is_ok());

        let config = RemoteConfig::Minio(settings(None));
        assert!(matches!(
            build_operator(&config, Path::new("/tmp")),
            Err(NoCloudError::Config(_))
        ));
    }

    #[test]
    fn test_build_local_operator() {
        let dir = tempfile::tempdir().unwrap();
        let config = RemoteConfig::Local {
            path: "mirror".into(),
        };
        assert!(build_operator(&config, dir.path()).is_ok());
    }
}
