use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy)]
pub enum InputType {
    Document,
    Query,
}

/// Turns text into fixed-length vectors.
///
/// Implementations must return one vector per input text, each of length
/// [`EmbeddingProvider::dimension`].
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError>;
    fn dimension(&self) -> usize;
}
