//! Boundary traits for collaborators named but explicitly out of scope in
//! §1: the document parser, language model, embedding model, and the
//! underlying task/blob stores a production [`crate::persistence`] adapter
//! would wrap. The core depends only on these interfaces; no concrete
//! implementation ships here beyond the in-memory test doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{DocumentStructure, TaskId};

/// Produces a [`DocumentStructure`] from raw document bytes. Out of scope:
/// actual parsing (docx/pdf extraction, clause segmentation heuristics)
/// lives behind whatever implements this trait in a deployment.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, blob_handle: &str) -> Result<DocumentStructure>;
}

/// A single natural-language generation call, used by skills that draft
/// diff rationale or proposed replacement text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Produces an embedding vector for semantic similarity skills (e.g.
/// baseline clause matching). Out of scope: model choice, vector format.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Underlying store for task metadata that a concrete
/// [`crate::persistence::PersistenceAdapter`] implementation may delegate
/// to. Named in §1 as an out-of-scope collaborator; the core never talks
/// to this trait directly.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn load_raw(&self, task_id: TaskId) -> Result<Vec<u8>>;
    async fn store_raw(&self, task_id: TaskId, bytes: Vec<u8>) -> Result<()>;
}

/// Underlying object store for document bytes. `TaskDocument::blob_handle`
/// is an opaque key into whatever implements this.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, handle: &str) -> Result<Vec<u8>>;
    async fn put(&self, bytes: Vec<u8>) -> Result<String>;
}
