// src/common/extract.rs

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::Validate;

use crate::common::error::AppError;

/// Extrai o corpo JSON e já roda o `validate()`.
/// Rejeições do `Json` viram o nosso envelope `{ status, message }`.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidBody(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Campos de atualização: string vazia conta como "não informado".
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        bio: Option<String>,
    }

    #[test]
    fn empty_string_is_not_provided() {
        let patch: Patch = serde_json::from_str(r#"{"bio": ""}"#).unwrap();
        assert_eq!(patch.bio, None);

        let patch: Patch = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(patch.bio, None);

        let patch: Patch = serde_json::from_str(r#"{"bio": "hi"}"#).unwrap();
        assert_eq!(patch.bio.as_deref(), Some("hi"));
    }
}
