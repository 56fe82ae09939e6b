//! Local smoke-test CLI for the review-orchestration core. Wires an
//! in-memory persistence adapter and trivial collaborator stand-ins
//! behind the same [`review_core::ReviewCore`] facade a real deployment
//! would use, so the full command surface (§6) can be exercised from a
//! terminal. Grounded on the teacher's `cli/config.rs` command-dispatch
//! shape, generalized from config CRUD to the task lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use review_core::collaborators::{BlobStore, DocumentParser};
use review_core::config::ConfigLoader;
use review_core::domain::DomainPluginRegistry;
use review_core::error::Result;
use review_core::events::EventStream;
use review_core::machine::MachineConfig;
use review_core::model::{ClauseNode, DocumentId, DocumentRole, DocumentStructure, TextSpan};
use review_core::persistence::{InMemoryPersistenceAdapter, PersistenceAdapter};
use review_core::skills::{RemoteSkillClient, SkillRegistry, SkillTimeout};
use review_core::ReviewCore;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "review-core-cli", about = "Local smoke-test driver for review-core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a task, upload a trivial single-clause document, start the
    /// review, and print whatever the machine returns (complete or
    /// suspended awaiting approval).
    Demo {
        #[arg(long, default_value = "Acme Corp")]
        party: String,
    },
    /// List the skills and domains registered in this process (always
    /// empty for the bare CLI; present for introspection parity with §6).
    ListRegistrations,
}

/// Blob store that just keeps bytes in memory keyed by a random handle.
struct InMemoryBlobStore {
    blobs: dashmap::DashMap<String, Vec<u8>>,
}

impl InMemoryBlobStore {
    fn new() -> Self {
        Self { blobs: dashmap::DashMap::new() }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, handle: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(handle)
            .map(|b| b.clone())
            .ok_or_else(|| review_core::Error::Internal(format!("no blob for handle {handle}")))
    }

    async fn put(&self, bytes: Vec<u8>) -> Result<String> {
        let handle = format!("blob://{}", Uuid::new_v4());
        self.blobs.insert(handle.clone(), bytes);
        Ok(handle)
    }
}

/// Parser that always returns a single top-level clause spanning the
/// whole document. Real clause segmentation is out of scope (§1).
struct SingleClauseParser;

#[async_trait]
impl DocumentParser for SingleClauseParser {
    async fn parse(&self, _blob_handle: &str) -> Result<DocumentStructure> {
        Ok(DocumentStructure {
            roots: vec![ClauseNode {
                clause_id: "1".into(),
                title: "Whole Document".into(),
                depth: 0,
                span: TextSpan { start: 0, end: 0 },
                children: Vec::new(),
            }],
            definitions: Default::default(),
            cross_references: Vec::new(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // `review-core.toml` in the working directory is an optional
    // override layer; its absence is not an error (§6).
    let config = ConfigLoader::new("review-core.toml").load().unwrap_or_default();
    let default_timeout = SkillTimeout {
        local: std::time::Duration::from_secs(config.per_skill_timeout_local_s),
        remote: std::time::Duration::from_secs(config.per_skill_timeout_remote_s),
    };

    let persistence: Arc<dyn PersistenceAdapter> = Arc::new(InMemoryPersistenceAdapter::new());
    let events = Arc::new(EventStream::new());
    let skills = Arc::new(
        SkillRegistry::with_default_timeout(default_timeout)
            .with_remote_client(RemoteSkillClient::from_config(&config.remote_skill_service)),
    );
    let domains = Arc::new(DomainPluginRegistry::new(vec![], Arc::clone(&skills)));
    let blob_store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
    let parser: Arc<dyn DocumentParser> = Arc::new(SingleClauseParser);

    let core = ReviewCore::new(persistence, events, skills, domains, blob_store, parser, MachineConfig::default());

    match cli.command {
        Command::Demo { party } => {
            let task_id = core.create_task(None, party, "en".into()).await?;
            println!("created task {task_id}");

            let document_id: DocumentId = core
                .upload_document(task_id, DocumentRole::Primary, "contract.txt".into(), b"Sample clause text.".to_vec())
                .await?;
            println!("uploaded primary document {document_id}");

            let outcome = core.start_review(task_id).await?;
            println!("review outcome: {outcome:?}");

            let status = core.get_status(task_id).await?;
            println!("status: phase={:?} pending={}", status.phase, status.pending_count);

            if status.pending_count > 0 {
                println!("task is awaiting approval; re-run approve_diff via the library API to continue");
            }
        }
        Command::ListRegistrations => {
            println!("domains: {:?}", core.list_domains().iter().map(|d| &d.id).collect::<Vec<_>>());
            println!("skills: {}", core.list_skills(None, None).len());
        }
    }

    Ok(())
}
