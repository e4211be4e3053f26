//! Alternate YAML content-type extractor and responder
//!
//! Thin pass-through to `serde_yaml` over the same object model the JSON
//! converter uses.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
};
use gantry_common::Error;
use serde::{de::DeserializeOwned, Serialize};

pub const CONTENT_TYPE_YAML: &str = "application/yaml";

/// YAML request body extractor and response wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml<T>(pub T);

fn is_yaml_content_type(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.split(';').next().unwrap_or(v).trim()),
        Some("application/yaml") | Some("application/x-yaml") | Some("text/yaml")
    )
}

impl<T, S> FromRequest<S> for Yaml<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !is_yaml_content_type(content_type.as_deref()) {
            return Err(Error::Validation(
                "expected a YAML content type".to_string(),
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::Validation(format!("failed to read request body: {e}")))?;
        let value = serde_yaml::from_slice(&bytes)
            .map_err(|e| Error::Validation(format!("invalid YAML body: {e}")))?;
        Ok(Yaml(value))
    }
}

impl<T> IntoResponse for Yaml<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match serde_yaml::to_string(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, CONTENT_TYPE_YAML)],
                body,
            )
                .into_response(),
            Err(e) => Error::Internal(format!("YAML serialization failed: {e}")).into_response(),
        }
    }
}
