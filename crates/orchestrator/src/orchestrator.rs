//! The run engine.
//!
//! One call to [`Orchestrator::start`] owns one research run: it
//! validates the request, fans the selected tasks out to concurrent
//! agent runners, funnels every runner event through a single forwarding
//! loop (the only place sequence numbers are assigned and run state is
//! written), and finishes by composing the dossier or by going quiet
//! when cancelled.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use agent::{AgentRunner, EventSink, Reasoner, RunnerEvent, ToolGateway};
use dossier_core::{
    CompanyRecord, Depth, ResearchPlan, ResearchRequest, TaskError, TaskId, TaskOutcome, REGISTRY,
};
use events::{Event, EventEnvelope};

use crate::composer;
use crate::run_state::RunState;

/// Step budgets per requested depth.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub standard_budget: usize,
    pub detailed_budget: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            standard_budget: 6,
            detailed_budget: 10,
        }
    }
}

impl OrchestratorSettings {
    fn budget_for(&self, depth: Depth) -> usize {
        match depth {
            Depth::Standard => self.standard_budget,
            Depth::Detailed => self.detailed_budget,
        }
    }
}

/// Handle to one running research run. Dropping the handle does not stop
/// the run; call [`RunHandle::cancel`] (idempotent) to stop it.
pub struct RunHandle {
    pub run_id: Uuid,
    pub events: mpsc::UnboundedReceiver<EventEnvelope>,
    cancel: CancellationToken,
}

impl RunHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Separate the cancellation control from the event stream, for
    /// callers that consume the two from different places.
    pub fn split(self) -> (RunControl, mpsc::UnboundedReceiver<EventEnvelope>) {
        (
            RunControl {
                run_id: self.run_id,
                cancel: self.cancel,
            },
            self.events,
        )
    }
}

/// Cancellation side of a [`RunHandle`].
pub struct RunControl {
    run_id: Uuid,
    cancel: CancellationToken,
}

impl RunControl {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

pub struct Orchestrator {
    gateway: Arc<ToolGateway>,
    reasoner: Arc<dyn Reasoner>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(gateway: Arc<ToolGateway>, reasoner: Arc<dyn Reasoner>) -> Self {
        Self {
            gateway,
            reasoner,
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Start a run and return immediately. All further narration,
    /// including the terminal `result`/`error`, arrives on the handle's
    /// event stream.
    pub fn start(&self, request: ResearchRequest, company: Option<CompanyRecord>) -> RunHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let run_id = Uuid::new_v4();

        let run = Run {
            run_id,
            gateway: self.gateway.clone(),
            reasoner: self.reasoner.clone(),
            settings: self.settings,
            cancel: cancel.clone(),
        };
        tokio::spawn(run.drive(request, company, tx));

        RunHandle {
            run_id,
            events: rx,
            cancel,
        }
    }
}

/// Message from one runner into the forwarding loop.
enum RunnerMessage {
    Emit { task: TaskId, event: RunnerEvent },
    Completed {
        task: TaskId,
        result: Result<serde_json::Value, TaskError>,
    },
}

/// Per-task sink handed to an agent runner. Unbounded send keeps the
/// emit path non-blocking.
struct TaskSink {
    task: TaskId,
    tx: mpsc::UnboundedSender<RunnerMessage>,
}

impl EventSink for TaskSink {
    fn emit(&self, event: RunnerEvent) {
        let _ = self.tx.send(RunnerMessage::Emit {
            task: self.task,
            event,
        });
    }
}

/// Assigns sequence numbers at the moment of forwarding.
struct OutputStream {
    tx: mpsc::UnboundedSender<EventEnvelope>,
    next_seq: u64,
}

impl OutputStream {
    fn new(tx: mpsc::UnboundedSender<EventEnvelope>) -> Self {
        Self { tx, next_seq: 0 }
    }

    fn send(&mut self, event: Event) {
        let envelope = EventEnvelope::new(self.next_seq, event);
        self.next_seq += 1;
        if self.tx.send(envelope).is_err() {
            tracing::debug!("event receiver dropped, run continues until cancelled");
        }
    }
}

struct Run {
    run_id: Uuid,
    gateway: Arc<ToolGateway>,
    reasoner: Arc<dyn Reasoner>,
    settings: OrchestratorSettings,
    cancel: CancellationToken,
}

impl Run {
    async fn drive(
        self,
        request: ResearchRequest,
        company: Option<CompanyRecord>,
        tx: mpsc::UnboundedSender<EventEnvelope>,
    ) {
        let mut out = OutputStream::new(tx);

        // Starting: anything wrong here aborts before any task launches.
        let plan = match request.validate() {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(run_id = %self.run_id, error = %err, "request rejected");
                out.send(Event::RunFailed {
                    message: err.to_string(),
                });
                return;
            }
        };

        tracing::info!(
            run_id = %self.run_id,
            subject = %plan.subject,
            depth = plan.depth.as_str(),
            tasks = plan.tasks.len(),
            "run started"
        );
        out.send(Event::Started {
            company: plan.subject.clone(),
            message: format!("Starting research on {}", plan.subject),
        });

        let mut state = RunState::new(self.run_id, plan.subject.clone(), plan.tasks.iter().map(|d| d.id));
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
        self.launch_runners(&plan, &mut state, &msg_tx);
        drop(msg_tx);

        // Running: the forwarding loop is the single serialization point.
        let mut entered: HashSet<TaskId> = HashSet::new();
        loop {
            let message = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    // Cancelling: runners stop at their next suspension
                    // point; completed outcomes are discarded and no
                    // terminal event is ever emitted.
                    tracing::info!(run_id = %self.run_id, "run cancelled");
                    return;
                }
                message = msg_rx.recv() => message,
            };
            let Some(message) = message else { break };

            match message {
                RunnerMessage::Emit { task, event } => {
                    self.note_phase(task, &mut entered, &mut out);
                    out.send(map_runner_event(task, event));
                }
                RunnerMessage::Completed { task, result } => {
                    self.note_phase(task, &mut entered, &mut out);
                    self.record_outcome(task, result, &mut state, &mut out);
                }
            }
        }

        if self.cancel.is_cancelled() {
            return;
        }

        // Completing: failed tasks are simply absent from the dossier.
        debug_assert!(state.all_terminal());
        let dossier = composer::compose(&plan.subject, company.as_ref(), &state.succeeded());
        tracing::info!(
            run_id = %self.run_id,
            components = dossier.components.len(),
            "run completed"
        );
        out.send(Event::RunCompleted { data: dossier });
    }

    /// Launch one runner per selected task, short-circuiting tasks whose
    /// required capability is not available at all.
    fn launch_runners(
        &self,
        plan: &ResearchPlan,
        state: &mut RunState,
        msg_tx: &mpsc::UnboundedSender<RunnerMessage>,
    ) {
        let budget = self.settings.budget_for(plan.depth);
        let runner = Arc::new(AgentRunner::new(
            self.gateway.clone(),
            self.reasoner.clone(),
            budget,
        ));

        for def in &plan.tasks {
            let missing = def
                .required
                .iter()
                .copied()
                .find(|cap| !self.gateway.has_capability(*cap));
            if let Some(capability) = missing {
                tracing::warn!(task = %def.id, capability = %capability, "task short-circuited");
                let _ = msg_tx.send(RunnerMessage::Completed {
                    task: def.id,
                    result: Err(TaskError::Misconfigured(capability)),
                });
                continue;
            }

            if let Err(err) = state.transition(def.id, TaskOutcome::Running) {
                tracing::error!(error = %err, "launch bookkeeping failed");
                continue;
            }

            let def = *def;
            let runner = runner.clone();
            let subject = plan.subject.clone();
            let sink = TaskSink {
                task: def.id,
                tx: msg_tx.clone(),
            };
            let done_tx = msg_tx.clone();
            let child = self.cancel.child_token();
            tokio::spawn(async move {
                let result = runner.run(&subject, def, &sink, &child).await;
                let _ = done_tx.send(RunnerMessage::Completed {
                    task: def.id,
                    result,
                });
            });
        }
    }

    /// Guarantee each task's phase marker precedes its own events.
    fn note_phase(&self, task: TaskId, entered: &mut HashSet<TaskId>, out: &mut OutputStream) {
        if entered.insert(task) {
            let message = REGISTRY
                .get(task)
                .map(|def| def.phase_label.to_string())
                .unwrap_or_else(|| format!("Working on {task}"));
            out.send(Event::PhaseEntered { task, message });
        }
    }

    fn record_outcome(
        &self,
        task: TaskId,
        result: Result<serde_json::Value, TaskError>,
        state: &mut RunState,
        out: &mut OutputStream,
    ) {
        let (outcome, message) = match result {
            Ok(value) => (TaskOutcome::Succeeded(value), None),
            // Discard quietly: the run is tearing down and the loop will
            // observe the cancellation itself.
            Err(TaskError::Cancelled) => return,
            Err(err) => {
                out.send(Event::Progress {
                    task,
                    message: err.to_string(),
                    error: true,
                });
                (TaskOutcome::Failed(err.clone()), Some(err.to_string()))
            }
        };

        let status = outcome.status_str().to_string();
        if let Err(err) = state.transition(task, outcome) {
            tracing::error!(error = %err, "outcome bookkeeping failed");
            return;
        }
        out.send(Event::TaskCompleted {
            task,
            status,
            message,
        });
    }
}

fn map_runner_event(task: TaskId, event: RunnerEvent) -> Event {
    match event {
        RunnerEvent::Progress(message) => Event::Progress {
            task,
            message,
            error: false,
        },
        RunnerEvent::ToolInvoked { tool, args } => Event::ToolInvoked { task, tool, args },
        RunnerEvent::ToolResult { tool, summary } => Event::ToolResult { task, tool, summary },
    }
}
