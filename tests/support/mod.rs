//! Shared harness for the scenario integration tests (§8). Not a test
//! module itself; `mod support;` it from each scenario file.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use review_core::collaborators::{BlobStore, DocumentParser};
use review_core::domain::DomainPluginRegistry;
use review_core::error::Result;
use review_core::events::EventStream;
use review_core::machine::MachineConfig;
use review_core::model::{
    ClauseNode, DocumentStructure, Priority, ReviewChecklistItem, TextSpan,
};
use review_core::persistence::{InMemoryPersistenceAdapter, PersistenceAdapter};
use review_core::skills::local::FnSkillHandler;
use review_core::skills::{SkillBackend, SkillBackendKind, SkillRegistration, SkillRegistry, SkillSchema};
use review_core::ReviewCore;
use serde_json::{json, Value};

pub const RISK_SKILL_ID: &str = "risk_scanner";

pub struct FixedStructureParser {
    pub structure: DocumentStructure,
}

#[async_trait]
impl DocumentParser for FixedStructureParser {
    async fn parse(&self, _blob_handle: &str) -> Result<DocumentStructure> {
        Ok(self.structure.clone())
    }
}

pub struct NullBlobStore;

#[async_trait]
impl BlobStore for NullBlobStore {
    async fn get(&self, _handle: &str) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn put(&self, _bytes: Vec<u8>) -> Result<String> {
        Ok("blob://fixed".into())
    }
}

/// A document structure with a single clause, suitable for most scenarios.
pub fn single_clause_structure(clause_id: &str) -> DocumentStructure {
    DocumentStructure {
        roots: vec![ClauseNode {
            clause_id: clause_id.into(),
            title: "Liability".into(),
            depth: 0,
            span: TextSpan { start: 0, end: 100 },
            children: Vec::new(),
        }],
        definitions: Default::default(),
        cross_references: Vec::new(),
    }
}

fn wildcard_checklist_item() -> ReviewChecklistItem {
    ReviewChecklistItem {
        id: "generic-review".into(),
        clause_id: None,
        priority: Priority::Medium,
        required_skill_ids: vec![RISK_SKILL_ID.into()],
        rationale: "baseline review of every clause".into(),
    }
}

/// Outputs `risk_scanner` returns on successive calls, one per call,
/// holding the last one once exhausted. Lets a scenario script exactly
/// how many analysis passes a clause takes before `validate_strategy`
/// sees a signal.
pub enum SkillScript {
    /// Returns `{"risks": [...]}` with one `High`-severity risk.
    Risk,
    /// Returns two `High`-severity risks in one pass, so `generate_diffs`
    /// proposes two diffs for the same clause.
    TwoRisks,
    /// Returns an empty object: no signal found this pass.
    NoSignal,
    /// The call itself fails (simulates a skill outage, §4.C degraded path).
    Fail,
}

fn skill_output(script: &SkillScript) -> Result<Value> {
    match script {
        SkillScript::Risk => Ok(json!({
            "risks": [{
                "checklist_item_id": "generic-review",
                "severity": "high",
                "summary": "uncapped indemnification obligation",
            }]
        })),
        SkillScript::TwoRisks => Ok(json!({
            "risks": [
                {
                    "checklist_item_id": "generic-review",
                    "severity": "high",
                    "summary": "uncapped indemnification obligation",
                },
                {
                    "checklist_item_id": "generic-review",
                    "severity": "critical",
                    "summary": "unilateral termination right",
                },
            ]
        })),
        SkillScript::NoSignal => Ok(json!({})),
        SkillScript::Fail => Err(review_core::Error::Internal("simulated skill outage".into())),
    }
}

fn risk_scanner_registration() -> SkillRegistration {
    SkillRegistration {
        id: RISK_SKILL_ID.into(),
        name: "Risk Scanner".into(),
        description: "test double: scripted risk findings".into(),
        input_schema: SkillSchema { required_fields: vec!["clause_id".into()] },
        output_schema: SkillSchema::empty(),
        backend: SkillBackendKind::Local,
        timeout: None,
    }
}

/// Registers `risk_scanner` against a scripted call sequence. Calls past
/// the end of `script` repeat the last entry.
pub fn build_skills(script: Vec<SkillScript>) -> Arc<SkillRegistry> {
    let registry = Arc::new(SkillRegistry::new());
    let calls = Arc::new(Mutex::new(0usize));
    let script = Arc::new(script);
    let handler = FnSkillHandler::new(move |_input: Value| {
        let calls = Arc::clone(&calls);
        let script = Arc::clone(&script);
        async move {
            let mut idx = calls.lock().unwrap();
            let step = script.get(*idx).unwrap_or_else(|| script.last().expect("script is non-empty"));
            *idx += 1;
            skill_output(step)
        }
    });
    registry.register(risk_scanner_registration(), SkillBackend::Local(Arc::new(handler))).unwrap();
    registry
}

pub struct Harness {
    pub core: ReviewCore,
    pub persistence: Arc<dyn PersistenceAdapter>,
    pub events: Arc<EventStream>,
}

/// Builds a [`ReviewCore`] over an in-memory adapter and a single-clause
/// document, with `risk_scanner` scripted per `script`.
pub fn build_harness(script: Vec<SkillScript>) -> Harness {
    build_harness_with_config(script, MachineConfig::default())
}

pub fn build_harness_with_config(script: Vec<SkillScript>, machine_config: MachineConfig) -> Harness {
    let persistence: Arc<dyn PersistenceAdapter> = Arc::new(InMemoryPersistenceAdapter::new());
    let events = Arc::new(EventStream::new());
    let skills = build_skills(script);
    let domains = Arc::new(DomainPluginRegistry::new(vec![wildcard_checklist_item()], Arc::clone(&skills)));
    let blob_store: Arc<dyn BlobStore> = Arc::new(NullBlobStore);
    let parser: Arc<dyn DocumentParser> = Arc::new(FixedStructureParser { structure: single_clause_structure("1.1") });

    let core = ReviewCore::new(
        Arc::clone(&persistence),
        Arc::clone(&events),
        skills,
        domains,
        blob_store,
        parser,
        machine_config,
    );
    Harness { core, persistence, events }
}

/// Rebuilds a [`ReviewCore`] over the same persistence (a fresh skill
/// registry, event stream, and machine instance) to simulate resumption
/// in a new process after a crash (§9).
pub fn rebuild_harness(
    persistence: Arc<dyn PersistenceAdapter>,
    script: Vec<SkillScript>,
    machine_config: MachineConfig,
) -> Harness {
    let events = Arc::new(EventStream::new());
    let skills = build_skills(script);
    let domains = Arc::new(DomainPluginRegistry::new(vec![wildcard_checklist_item()], Arc::clone(&skills)));
    let blob_store: Arc<dyn BlobStore> = Arc::new(NullBlobStore);
    let parser: Arc<dyn DocumentParser> = Arc::new(FixedStructureParser { structure: single_clause_structure("1.1") });

    let core = ReviewCore::new(
        Arc::clone(&persistence),
        Arc::clone(&events),
        skills,
        domains,
        blob_store,
        parser,
        machine_config,
    );
    Harness { core, persistence, events }
}
