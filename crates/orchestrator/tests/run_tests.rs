//! End-to-end run behavior against scripted reasoners and in-memory
//! tool backends.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use agent::{
    Reasoner, ReasonerError, ReasoningStep, ToolBackend, ToolError, ToolGateway, Transcript,
};
use dossier_core::{ResearchRequest, TaskId, ToolCapability};
use events::{Event, EventEnvelope};
use orchestrator::{Orchestrator, RunHandle};

/// Minimal conforming final answer for each task.
fn answer_for(task: TaskId) -> String {
    let value = match task {
        TaskId::CompanyOverview => json!({
            "name": "Acme",
            "description": "Acme builds rockets.",
            "founded_year": 2020
        }),
        TaskId::KeyPeople => json!({
            "key_people": [{"name": "Jane Doe", "role": "CEO"}]
        }),
        TaskId::MarketSizing => json!({
            "tam": {"size": "$50B", "cagr": "12%"}
        }),
        TaskId::CompetitorLandscape => json!({
            "direct_competitors": [{"name": "Globex", "description": "Also rockets"}]
        }),
        TaskId::GrowthMetrics => json!({
            "key_metrics": [{"metric": "ARR", "value": "$2M", "growth": "100%"}]
        }),
    };
    value.to_string()
}

/// Plays per-task scripts; tasks without a script answer immediately.
struct ScriptedReasoner {
    scripts: Mutex<HashMap<TaskId, VecDeque<ReasoningStep>>>,
}

impl ScriptedReasoner {
    fn instant() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
        })
    }

    fn with_script(task: TaskId, steps: Vec<ReasoningStep>) -> Arc<Self> {
        let mut scripts = HashMap::new();
        scripts.insert(task, steps.into());
        Arc::new(Self {
            scripts: Mutex::new(scripts),
        })
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn next_step(&self, transcript: &Transcript) -> Result<ReasoningStep, ReasonerError> {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&transcript.task) {
            Some(steps) => steps
                .pop_front()
                .ok_or_else(|| ReasonerError::Backend("script exhausted".to_string())),
            None => Ok(ReasoningStep::FinalAnswer(answer_for(transcript.task))),
        }
    }
}

/// Returns the same non-conforming answer for every task.
struct GarbageReasoner;

#[async_trait]
impl Reasoner for GarbageReasoner {
    async fn next_step(&self, _transcript: &Transcript) -> Result<ReasoningStep, ReasonerError> {
        Ok(ReasoningStep::FinalAnswer("I could not find anything.".to_string()))
    }
}

/// Never produces a step; used to hold runs open for cancellation tests.
struct NeverReasoner;

#[async_trait]
impl Reasoner for NeverReasoner {
    async fn next_step(&self, _transcript: &Transcript) -> Result<ReasoningStep, ReasonerError> {
        std::future::pending().await
    }
}

struct CannedBackend {
    capability: ToolCapability,
}

#[async_trait]
impl ToolBackend for CannedBackend {
    fn capability(&self) -> ToolCapability {
        self.capability
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        Ok(format!("canned {} output for {}", self.capability, query))
    }
}

struct SlowSearch;

#[async_trait]
impl ToolBackend for SlowSearch {
    fn capability(&self) -> ToolCapability {
        ToolCapability::Search
    }

    async fn invoke(&self, _query: &str) -> Result<String, ToolError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

fn full_gateway() -> Arc<ToolGateway> {
    Arc::new(
        ToolGateway::default()
            .with_backend(Arc::new(CannedBackend {
                capability: ToolCapability::Search,
            }))
            .with_backend(Arc::new(CannedBackend {
                capability: ToolCapability::Scrape,
            })),
    )
}

/// Drain the stream until the run's sender side closes.
async fn collect_events(mut handle: RunHandle) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    while let Some(envelope) = handle.events.recv().await {
        events.push(envelope);
    }
    events
}

fn count_type(events: &[EventEnvelope], tag: &str) -> usize {
    events.iter().filter(|e| e.event.type_str() == tag).count()
}

fn assert_task_ordering(events: &[EventEnvelope], task: TaskId) {
    let indices: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.event.task_id() == Some(task))
        .map(|(i, _)| i)
        .collect();
    assert!(!indices.is_empty(), "no events for {task}");

    let first = &events[indices[0]].event;
    assert!(
        matches!(first, Event::PhaseEntered { .. }),
        "{task} first event was {first:?}"
    );
    let last = &events[*indices.last().unwrap()].event;
    assert!(
        matches!(last, Event::TaskCompleted { .. }),
        "{task} last event was {last:?}"
    );
}

#[tokio::test]
async fn test_happy_path_emits_full_sequence_and_dossier() {
    let orchestrator = Orchestrator::new(full_gateway(), ScriptedReasoner::instant());
    let handle = orchestrator.start(ResearchRequest::new("Acme", "standard"), None);
    let events = collect_events(handle).await;

    // Sequence numbers are assigned at the single forwarding point.
    for (i, envelope) in events.iter().enumerate() {
        assert_eq!(envelope.seq, i as u64);
    }

    assert_eq!(count_type(&events, "started"), 1);
    assert_eq!(count_type(&events, "phase_entered"), 5);
    assert_eq!(count_type(&events, "task_completed"), 5);
    assert_eq!(count_type(&events, "result"), 1);
    assert_eq!(count_type(&events, "error"), 0);

    assert!(matches!(events[0].event, Event::Started { .. }));
    let last = &events.last().unwrap().event;
    let Event::RunCompleted { data } = last else {
        panic!("expected terminal result, got {last:?}");
    };

    // Panels in registry order regardless of completion interleaving.
    let ids: Vec<&str> = data.components.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "panel-company_overview",
            "panel-key_people",
            "panel-market_sizing",
            "panel-competitor_landscape",
            "panel-growth_metrics",
        ]
    );

    for def in dossier_core::REGISTRY.list() {
        assert_task_ordering(&events, def.id);
    }
}

#[tokio::test]
async fn test_bogus_depth_fails_before_any_task() {
    let orchestrator = Orchestrator::new(full_gateway(), ScriptedReasoner::instant());
    let handle = orchestrator.start(ResearchRequest::new("Acme", "bogus"), None);
    let events = collect_events(handle).await;

    assert_eq!(events.len(), 1);
    let Event::RunFailed { message } = &events[0].event else {
        panic!("expected error event");
    };
    assert!(message.contains("bogus"));
    assert_eq!(count_type(&events, "phase_entered"), 0);
}

#[tokio::test]
async fn test_empty_subject_fails_before_any_task() {
    let orchestrator = Orchestrator::new(full_gateway(), ScriptedReasoner::instant());
    let handle = orchestrator.start(ResearchRequest::new("   ", "standard"), None);
    let events = collect_events(handle).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].event, Event::RunFailed { .. }));
}

#[tokio::test]
async fn test_focus_areas_restrict_run() {
    let orchestrator = Orchestrator::new(full_gateway(), ScriptedReasoner::instant());
    let request = ResearchRequest::new("Acme", "standard")
        .with_focus(vec!["key_people".to_string(), "growth_metrics".to_string()]);
    let handle = orchestrator.start(request, None);
    let events = collect_events(handle).await;

    assert_eq!(count_type(&events, "phase_entered"), 2);
    assert_eq!(count_type(&events, "task_completed"), 2);

    let Event::RunCompleted { data } = &events.last().unwrap().event else {
        panic!("expected terminal result");
    };
    let ids: Vec<&str> = data.components.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["panel-key_people", "panel-growth_metrics"]);
}

#[tokio::test]
async fn test_tool_events_stay_inside_phase_markers() {
    let reasoner = ScriptedReasoner::with_script(
        TaskId::KeyPeople,
        vec![
            ReasoningStep::Narrate("Looking for the founding team.".to_string()),
            ReasoningStep::CallTool {
                capability: ToolCapability::Search,
                query: "Acme founders".to_string(),
                preamble: None,
            },
            ReasoningStep::FinalAnswer(answer_for(TaskId::KeyPeople)),
        ],
    );
    let orchestrator = Orchestrator::new(full_gateway(), reasoner);
    let handle = orchestrator.start(ResearchRequest::new("Acme", "standard"), None);
    let events = collect_events(handle).await;

    assert_eq!(count_type(&events, "tool_invoked"), 1);
    assert_eq!(count_type(&events, "tool_result"), 1);
    for def in dossier_core::REGISTRY.list() {
        assert_task_ordering(&events, def.id);
    }

    let invoked = events
        .iter()
        .find(|e| e.event.type_str() == "tool_invoked")
        .unwrap();
    assert_eq!(invoked.event.task_id(), Some(TaskId::KeyPeople));
}

#[tokio::test(start_paused = true)]
async fn test_tool_timeout_fails_only_that_task() {
    let gateway = Arc::new(
        ToolGateway::new(Duration::from_millis(100), 8)
            .with_backend(Arc::new(SlowSearch))
            .with_backend(Arc::new(CannedBackend {
                capability: ToolCapability::Scrape,
            })),
    );
    let reasoner = ScriptedReasoner::with_script(
        TaskId::MarketSizing,
        vec![ReasoningStep::CallTool {
            capability: ToolCapability::Search,
            query: "rocket market size".to_string(),
            preamble: None,
        }],
    );
    let orchestrator = Orchestrator::new(gateway, reasoner);
    let handle = orchestrator.start(ResearchRequest::new("Acme", "standard"), None);
    let events = collect_events(handle).await;

    let completed: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.event {
            Event::TaskCompleted { task, status, message } => Some((*task, status.clone(), message.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), 5);

    for (task, status, message) in &completed {
        if *task == TaskId::MarketSizing {
            assert_eq!(status, "failed");
            assert!(message.as_deref().unwrap_or_default().contains("deadline"));
        } else {
            assert_eq!(status, "succeeded", "{task} should be unaffected");
        }
    }

    // The failure was narrated with the error tag for observability.
    assert!(events.iter().any(|e| matches!(
        &e.event,
        Event::Progress { task: TaskId::MarketSizing, error: true, .. }
    )));

    let Event::RunCompleted { data } = &events.last().unwrap().event else {
        panic!("expected terminal result");
    };
    assert_eq!(data.components.len(), 4);
    assert!(!data.components.iter().any(|c| c.id == "panel-market_sizing"));
}

#[tokio::test]
async fn test_zero_successes_still_compose_empty_dossier() {
    let orchestrator = Orchestrator::new(full_gateway(), Arc::new(GarbageReasoner));
    let handle = orchestrator.start(ResearchRequest::new("Acme", "standard"), None);
    let events = collect_events(handle).await;

    let failures = events
        .iter()
        .filter(|e| matches!(&e.event, Event::TaskCompleted { status, .. } if status == "failed"))
        .count();
    assert_eq!(failures, 5);

    let Event::RunCompleted { data } = &events.last().unwrap().event else {
        panic!("a run with zero successes still completes");
    };
    assert!(data.components.is_empty());
    assert_eq!(data.company.name, "Acme");
}

#[tokio::test]
async fn test_missing_capability_short_circuits_task_only() {
    // No scrape backend: tasks requiring scrape are misconfigured, the
    // search-only tasks still run.
    let gateway = Arc::new(ToolGateway::default().with_backend(Arc::new(CannedBackend {
        capability: ToolCapability::Search,
    })));
    let orchestrator = Orchestrator::new(gateway, ScriptedReasoner::instant());
    let handle = orchestrator.start(ResearchRequest::new("Acme", "standard"), None);
    let events = collect_events(handle).await;

    let mut statuses = HashMap::new();
    for envelope in &events {
        if let Event::TaskCompleted { task, status, .. } = &envelope.event {
            statuses.insert(*task, status.clone());
        }
    }
    assert_eq!(statuses.len(), 5);
    assert_eq!(statuses[&TaskId::MarketSizing], "succeeded");
    assert_eq!(statuses[&TaskId::GrowthMetrics], "succeeded");
    assert_eq!(statuses[&TaskId::CompanyOverview], "failed");
    assert_eq!(statuses[&TaskId::KeyPeople], "failed");
    assert_eq!(statuses[&TaskId::CompetitorLandscape], "failed");

    // Short-circuited tasks still honor the phase marker contract.
    assert_task_ordering(&events, TaskId::KeyPeople);

    let Event::RunCompleted { data } = &events.last().unwrap().event else {
        panic!("misconfiguration must not abort the run");
    };
    assert_eq!(data.components.len(), 2);
}

#[tokio::test]
async fn test_cancel_after_started_emits_no_terminal() {
    let orchestrator = Orchestrator::new(full_gateway(), Arc::new(NeverReasoner));
    let mut handle = orchestrator.start(ResearchRequest::new("Acme", "standard"), None);

    let first = handle.events.recv().await.expect("started event");
    assert!(matches!(first.event, Event::Started { .. }));

    handle.cancel();
    // Idempotent: signaling again is a no-op.
    handle.cancel();
    assert!(handle.is_cancelled());

    // The stream closes without ever carrying a terminal event.
    let mut rest = Vec::new();
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(envelope) = handle.events.recv().await {
            rest.push(envelope);
        }
    })
    .await;
    assert!(drained.is_ok(), "run did not quiesce after cancellation");
    assert!(
        rest.iter().all(|e| !e.event.is_terminal()),
        "cancelled run must not emit result/error"
    );
}

#[tokio::test]
async fn test_schema_violation_fails_task_and_narrates() {
    let reasoner = ScriptedReasoner::with_script(
        TaskId::GrowthMetrics,
        vec![ReasoningStep::FinalAnswer("not even json".to_string())],
    );
    let orchestrator = Orchestrator::new(full_gateway(), reasoner);
    let handle = orchestrator.start(ResearchRequest::new("Acme", "standard"), None);
    let events = collect_events(handle).await;

    let completed = events
        .iter()
        .find_map(|e| match &e.event {
            Event::TaskCompleted { task: TaskId::GrowthMetrics, status, message } => {
                Some((status.clone(), message.clone()))
            }
            _ => None,
        })
        .expect("growth_metrics completion");
    assert_eq!(completed.0, "failed");
    assert!(completed.1.unwrap().contains("declared shape"));

    let Event::RunCompleted { data } = &events.last().unwrap().event else {
        panic!("run survives a malformed task output");
    };
    assert_eq!(data.components.len(), 4);
}
