//! Request/response types and image extraction for the REST API
//!
//! Every analysis POST accepts the same two payload shapes: a multipart
//! upload with a `file` field, or a JSON body `{ "image": "<base64>" }`
//! where the value may carry a `data:...;base64,` prefix. The annotate flag
//! can come from the `?annotate=true` query or the JSON body.

use crate::http::ApiError;
use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use bytes::Bytes;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// JSON body accepted by the analysis endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub image: Option<String>,
    pub annotate: Option<bool>,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateQuery {
    annotate: Option<String>,
}

/// A decoded frame plus the resolved annotate flag.
#[derive(Debug)]
pub struct ImageInput {
    pub image: RgbImage,
    pub annotate: bool,
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for ImageInput {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query: AnnotateQuery = Query::try_from_uri(req.uri()).map(|Query(q)| q).unwrap_or_default();
        let query_annotate = query.annotate.as_deref() == Some("true");

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let (bytes, body_annotate) = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?;
            (read_file_field(multipart).await?, false)
        } else if content_type.starts_with("application/json") {
            let Json(body): Json<AnalyzeRequest> = Json::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
            let encoded = body
                .image
                .ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;
            (decode_base64_image(&encoded)?, body.annotate.unwrap_or(false))
        } else {
            return Err(ApiError::BadRequest("No image provided".to_string()));
        };

        let image = image::load_from_memory(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("undecodable image: {e}")))?
            .to_rgb8();

        Ok(ImageInput { image, annotate: query_annotate || body_annotate })
    }
}

async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("unreadable upload: {e}")));
        }
    }
    Err(ApiError::BadRequest("No image provided".to_string()))
}

fn decode_base64_image(encoded: &str) -> Result<Bytes, ApiError> {
    // Tolerate data-URI prefixes like "data:image/jpeg;base64,".
    let encoded = encoded.rsplit(',').next().unwrap_or(encoded);
    base64::decode(encoded.trim())
        .map(Bytes::from)
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 image: {e}")))
}

/// Encode an annotated frame as a JPEG data URI.
pub fn to_data_uri(image: &RgbImage) -> Result<String, ApiError> {
    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new(&mut jpeg);
    image
        .write_with_encoder(encoder)
        .map_err(|e| ApiError::Internal(format!("failed to encode annotated image: {e}")))?;
    Ok(format!("data:image/jpeg;base64,{}", base64::encode(&jpeg)))
}
