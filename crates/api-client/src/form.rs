//! Multipart encoding of pipeline requests

use cv_types::{FileUpload, MultipartRequest};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::ApiError;

/// A request flattened into form fields
///
/// Kept separately from [`Form`] because a `Form` is consumed by the request
/// and every retry needs a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedForm {
    pub text: Vec<(String, String)>,
    pub files: Vec<(&'static str, FileUpload)>,
}

impl EncodedForm {
    /// Encode every present field of `request`
    ///
    /// - `None` / null fields are left out
    /// - strings are sent verbatim
    /// - numbers and booleans as their plain text form
    /// - arrays and objects as one field of compact JSON
    pub fn encode<R: MultipartRequest>(request: &R) -> Result<Self, ApiError> {
        let value = serde_json::to_value(request).map_err(|e| ApiError::Encode(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(ApiError::Encode(
                "request did not serialize to an object".to_string(),
            ));
        };

        let mut text = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let encoded = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                nested @ (Value::Array(_) | Value::Object(_)) => serde_json::to_string(&nested)
                    .map_err(|e| ApiError::Encode(e.to_string()))?,
            };
            text.push((name, encoded));
        }

        let files = request
            .files()
            .into_iter()
            .map(|(name, file)| (name, file.clone()))
            .collect();

        Ok(Self { text, files })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Build a fresh multipart body
    pub fn to_multipart(&self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in &self.text {
            form = form.text(name.clone(), value.clone());
        }
        for (name, file) in &self.files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(mime) = &file.mime {
                part = part.mime_str(mime)?;
            }
            form = form.part(*name, part);
        }
        Ok(form)
    }
}
