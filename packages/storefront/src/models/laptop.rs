use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaptopDraft {
    pub brand: String,
    pub model: String,
    pub specifications: String,
    pub price: f64,
    pub laptop_condition: String,
}

/// Raw image bytes handed over by the caller; never decoded here.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
