//! Translation service boundary.

use crate::Result;
use serde::{Deserialize, Serialize};

/// One request to the translation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub model_id: String,
    /// System instruction for the model.
    pub system: String,
    pub user_message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A synchronous natural-language translation backend.
///
/// Implementations return the raw response text; prompt construction and
/// response cleaning belong to the engine.
pub trait TranslationService {
    fn invoke(&self, request: &ServiceRequest) -> Result<String>;
}

impl<T: TranslationService + ?Sized> TranslationService for Box<T> {
    fn invoke(&self, request: &ServiceRequest) -> Result<String> {
        (**self).invoke(request)
    }
}
