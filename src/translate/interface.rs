//! Wire types for the translation API

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    /// Seconds spent generating, rounded to milliseconds. Absent when the
    /// text was returned without calling the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

impl TranslateRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    /// Parse a raw `/translate` body.
    ///
    /// An empty, unparseable, non-object or empty-object body is
    /// `MissingBody`; a missing, non-string or blank field is `MissingFields`.
    pub fn from_body(body: &[u8]) -> Result<Self, GatewayError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(GatewayError::MissingBody);
        }
        let value: Value = serde_json::from_slice(body).map_err(|_| GatewayError::MissingBody)?;
        let fields = match value.as_object() {
            Some(fields) if !fields.is_empty() => fields,
            _ => return Err(GatewayError::MissingBody),
        };

        let field = |name: &str| -> Result<String, GatewayError> {
            fields
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(GatewayError::MissingFields)
        };

        let request = Self {
            text: field("text")?,
            source_lang: field("source_lang")?,
            target_lang: field("target_lang")?,
        };
        request.validate()?;
        Ok(request)
    }

    /// All three fields must be non-empty after trimming
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.text.trim().is_empty()
            || self.source_lang.trim().is_empty()
            || self.target_lang.trim().is_empty()
        {
            return Err(GatewayError::MissingFields);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_body() {
        let request =
            TranslateRequest::from_body(br#"{"text":"Hello","source_lang":"en","target_lang":"ja"}"#)
                .unwrap();
        assert_eq!(request, TranslateRequest::new("Hello", "en", "ja"));
    }

    #[test]
    fn empty_or_invalid_body_requires_json() {
        let bodies: [&[u8]; 7] = [b"", b"  \n", b"{}", b"not json", b"[1,2]", b"null", b"\"text\""];
        for body in bodies {
            assert!(
                matches!(TranslateRequest::from_body(body), Err(GatewayError::MissingBody)),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn blank_missing_or_mistyped_fields_are_rejected() {
        let bodies = [
            r#"{"text":"","source_lang":"en","target_lang":"ja"}"#,
            r#"{"text":"   ","source_lang":"en","target_lang":"ja"}"#,
            r#"{"text":"Hi","source_lang":" ","target_lang":"ja"}"#,
            r#"{"text":"Hi","source_lang":"en"}"#,
            r#"{"text":5,"source_lang":"en","target_lang":"ja"}"#,
            r#"{"source_lang":"en","target_lang":"ja"}"#,
        ];
        for body in bodies {
            assert!(
                matches!(
                    TranslateRequest::from_body(body.as_bytes()),
                    Err(GatewayError::MissingFields)
                ),
                "body {}",
                body
            );
        }
    }

    #[test]
    fn elapsed_is_omitted_when_absent() {
        let body = serde_json::to_value(TranslateResponse {
            translated_text: "Hello".to_string(),
            elapsed: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"translated_text": "Hello"}));
    }
}
