use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::http::{ApiRequest, FormPart};
use crate::models::laptop::{ImageUpload, LaptopDraft};
use crate::services::api_support::send;
use crate::services::dispatcher::RequestDispatcher;
use crate::services::errors::api_service_errors::ApiServiceError;

/// Catalogue reads and admin-side laptop management.
pub struct LaptopService {
    dispatcher: Arc<RequestDispatcher>,
}

impl LaptopService {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        LaptopService { dispatcher }
    }

    pub async fn laptops(&self) -> Result<Value, ApiServiceError> {
        let response = send(&self.dispatcher, ApiRequest::get("/laptops/all")).await?;
        Ok(response.json_value())
    }

    pub async fn laptop(&self, id: i64) -> Result<Value, ApiServiceError> {
        let request = ApiRequest::get(format!("/laptops/read/{}", id));
        let response = send(&self.dispatcher, request).await?;
        Ok(response.json_value())
    }

    pub async fn create_laptop(&self, laptop: Value) -> Result<Value, ApiServiceError> {
        let request = ApiRequest::post("/laptops/save").json(laptop);
        let response = send(&self.dispatcher, request).await?;
        Ok(response.json_value())
    }

    /// Multipart create. If the server refuses it and the caller is signed
    /// in, retries as JSON: base64 image through `/laptops/create`, or a
    /// plain save when there is no image.
    pub async fn create_laptop_with_image(
        &self,
        draft: &LaptopDraft,
        image: Option<&ImageUpload>,
    ) -> Result<Value, ApiServiceError> {
        let mut parts = vec![
            text_part("brand", &draft.brand),
            text_part("model", &draft.model),
            text_part("specifications", &draft.specifications),
            text_part("price", &draft.price.to_string()),
            text_part("laptopCondition", &draft.laptop_condition),
        ];
        if let Some(image) = image {
            parts.push(file_part("image", image));
        }

        let first = match self
            .dispatcher
            .dispatch(ApiRequest::post("/laptops/create-with-image").multipart(parts))
            .await
        {
            Ok(response) => {
                info!("Created laptop {} {}", draft.brand, draft.model);
                return Ok(response.json_value());
            }
            Err(error) => error,
        };

        if self.dispatcher.session().token().await.is_none() {
            return Err(self.dispatcher.handle_api_error(&first).await.into());
        }

        warn!("Multipart create failed ({}), retrying as JSON", first);
        let retry = match image {
            Some(image) => {
                let mut body = json!(draft);
                body["imageBase64"] = Value::String(STANDARD.encode(&image.bytes));
                ApiRequest::post("/laptops/create").json(body)
            }
            None => ApiRequest::post("/laptops/save").json(json!(draft)),
        };
        let response = send(&self.dispatcher, retry).await?;
        Ok(response.json_value())
    }

    pub async fn update_laptop(&self, laptop: Value) -> Result<Value, ApiServiceError> {
        let request = ApiRequest::put("/laptops/update").json(laptop);
        let response = send(&self.dispatcher, request).await?;
        Ok(response.json_value())
    }

    pub async fn delete_laptop(&self, id: i64) -> Result<Value, ApiServiceError> {
        let response =
            send(&self.dispatcher, ApiRequest::delete(format!("/laptops/delete/{}", id))).await?;
        info!("Deleted laptop {}", id);
        Ok(response.json_value())
    }

    pub async fn upload_laptop_image(
        &self,
        id: i64,
        image: &ImageUpload,
    ) -> Result<Value, ApiServiceError> {
        let request = ApiRequest::post(format!("/laptops/{}/upload-image", id))
            .multipart(vec![file_part("image", image)]);
        let response = send(&self.dispatcher, request).await?;
        Ok(response.json_value())
    }

    /// Raw image bytes as served.
    pub async fn laptop_image(&self, id: i64) -> Result<Vec<u8>, ApiServiceError> {
        let request = ApiRequest::get(format!("/laptops/{}/image", id));
        let response = send(&self.dispatcher, request).await?;
        Ok(response.body)
    }
}

fn text_part(name: &str, value: &str) -> FormPart {
    FormPart::Text {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn file_part(name: &str, image: &ImageUpload) -> FormPart {
    FormPart::File {
        name: name.to_string(),
        file_name: image.file_name.clone(),
        content_type: image.content_type.clone(),
        bytes: image.bytes.clone(),
    }
}
