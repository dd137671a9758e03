//! The execution context: one dedicated thread per agent running a script
//! engine over that agent's compiled decision logic.
//!
//! The engine is built without I/O, timers, module loading, or `eval`, and
//! every call runs under an operation budget and a wall-clock deadline
//! checked from the engine's progress callback. Requests arrive over a
//! bounded queue; each carries its own deadline and a one-shot reply
//! channel. Requests whose deadline has already passed are skipped, so a
//! backlog never delays later ticks.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use rhai::packages::{
    BasicArrayPackage, BasicMapPackage, BasicMathPackage, CorePackage, LogicPackage, Package,
};
use rhai::{AST, CallFnOptions, Dynamic, Engine, EvalAltResult, Scope};
use skirmish_types::{AgentId, Decision, DecisionRequest};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::coerce::coerce_output;
use crate::error::{DecisionFault, SandboxError};
use crate::limits::SandboxLimits;

/// Name of the function every decision script must define.
pub const ENTRY_POINT: &str = "decide";

/// Parameter count of [`ENTRY_POINT`]: `(me, enemies, arena)`.
pub const ENTRY_ARITY: usize = 3;

/// Progress callback granularity (operations between clock reads).
const PROGRESS_MASK: u64 = 0xFF;

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

/// A request to the execution context.
pub(crate) enum Command {
    /// Run the entry point once.
    Decide {
        /// Frozen input for this tick.
        request: Box<DecisionRequest>,
        /// Correlates the reply with the request.
        request_id: u64,
        /// Past this instant the call is abandoned.
        deadline: Instant,
        /// Where the answer goes.
        reply: oneshot::Sender<DecideReply>,
    },
    /// Replace the decision logic.
    Swap {
        /// New source, already through containment.
        source: String,
        /// The swap is only installed if compiled before this instant.
        deadline: Instant,
        /// Shared with the host; whoever claims it first decides the swap.
        ticket: Arc<SwapTicket>,
        /// Where the result goes.
        reply: oneshot::Sender<Result<(), SandboxError>>,
    },
    /// Stop the loop.
    Shutdown,
}

/// Fate of one hot-swap, settled exactly once by either side.
///
/// The context claims it to install compiled logic; the host claims it to
/// give up after its wait runs out. If the context won, the host reports
/// the swap as applied even though no reply arrived in time.
#[derive(Debug, Default)]
pub(crate) struct SwapTicket(AtomicU8);

const PENDING: u8 = 0;
const INSTALLED: u8 = 1;
const ABANDONED: u8 = 2;

impl SwapTicket {
    /// Claim the swap for installation. False if the host already gave up.
    pub(crate) fn install(&self) -> bool {
        self.0
            .compare_exchange(PENDING, INSTALLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Give up on the swap. False if the context already installed it.
    pub(crate) fn abandon(&self) -> bool {
        self.0
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .map_or_else(|current| current != INSTALLED, |_| true)
    }
}

/// Answer to one [`Command::Decide`].
#[derive(Debug)]
pub(crate) struct DecideReply {
    /// Echo of the request id.
    pub request_id: u64,
    /// The coerced decision, or why none was produced.
    pub result: Result<Decision, DecisionFault>,
}

// ---------------------------------------------------------------------------
// Engine construction
// ---------------------------------------------------------------------------

/// Build an engine with only pure computation available.
///
/// `deadline` is read by the progress callback; the caller moves it forward
/// before each call.
pub(crate) fn build_engine(limits: &SandboxLimits, deadline: Rc<Cell<Instant>>) -> Engine {
    let mut engine = Engine::new_raw();

    engine.register_global_module(CorePackage::new().as_shared_module());
    engine.register_global_module(LogicPackage::new().as_shared_module());
    engine.register_global_module(BasicMathPackage::new().as_shared_module());
    engine.register_global_module(BasicArrayPackage::new().as_shared_module());
    engine.register_global_module(BasicMapPackage::new().as_shared_module());

    engine.disable_symbol("eval");
    engine.disable_symbol("import");
    engine.set_module_resolver(rhai::module_resolvers::DummyModuleResolver::new());

    engine.set_max_operations(limits.max_operations);
    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine.set_max_map_size(limits.max_map_size);

    engine.on_progress(move |ops| {
        if ops & PROGRESS_MASK == 0 && Instant::now() >= deadline.get() {
            Some(Dynamic::UNIT)
        } else {
            None
        }
    });

    engine
}

/// Compile `source` and check it defines the entry point.
pub(crate) fn compile(engine: &Engine, source: &str) -> Result<AST, SandboxError> {
    let ast = engine.compile(source).map_err(|err| SandboxError::Compile {
        message: err.to_string(),
    })?;
    let has_entry = ast
        .iter_functions()
        .any(|f| f.name == ENTRY_POINT && f.params.len() == ENTRY_ARITY);
    if !has_entry {
        return Err(SandboxError::MissingEntryPoint {
            name: ENTRY_POINT,
            arity: ENTRY_ARITY,
        });
    }
    Ok(ast)
}

/// Run the entry point against one request and coerce the result.
pub(crate) fn evaluate(
    engine: &Engine,
    ast: &AST,
    request: &DecisionRequest,
) -> Result<Decision, DecisionFault> {
    let me = rhai::serde::to_dynamic(&request.self_view).map_err(|err| input_fault(&err))?;
    let enemies = rhai::serde::to_dynamic(&request.enemies).map_err(|err| input_fault(&err))?;
    let arena = rhai::serde::to_dynamic(&request.arena).map_err(|err| input_fault(&err))?;

    let mut scope = Scope::new();
    let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
    let output = engine
        .call_fn_with_options::<Dynamic>(options, &mut scope, ast, ENTRY_POINT, (me, enemies, arena))
        .map_err(|err| classify(&err))?;

    coerce_output(&output)
}

fn input_fault(err: &EvalAltResult) -> DecisionFault {
    warn!(error = %err, "context: failed to convert decision input");
    DecisionFault::Runtime
}

fn classify(err: &EvalAltResult) -> DecisionFault {
    match err {
        EvalAltResult::ErrorTerminated(..) | EvalAltResult::ErrorTooManyOperations(..) => {
            DecisionFault::Timeout
        }
        other => {
            debug!(error = %other, "context: script raised an error");
            DecisionFault::Runtime
        }
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

/// Thread body. Compiles the initial source, reports readiness on `ready`,
/// then serves commands until shutdown or until every sender is gone.
pub(crate) fn run(
    agent: AgentId,
    limits: &SandboxLimits,
    source: &str,
    ready_deadline: Instant,
    mut commands: mpsc::Receiver<Command>,
    ready: oneshot::Sender<Result<(), SandboxError>>,
) {
    let deadline = Rc::new(Cell::new(ready_deadline));
    let engine = build_engine(limits, Rc::clone(&deadline));

    let mut ast = match compile(&engine, source) {
        Ok(ast) if Instant::now() <= ready_deadline => ast,
        Ok(_) => {
            let _ = ready.send(Err(SandboxError::Timeout {
                waited_ms: limits.swap_timeout_ms,
            }));
            return;
        }
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }
    info!(agent = %agent, "context: decision logic loaded");

    while let Some(command) = commands.blocking_recv() {
        match command {
            Command::Decide {
                request,
                request_id,
                deadline: call_deadline,
                reply,
            } => {
                let result = if Instant::now() >= call_deadline {
                    Err(DecisionFault::Timeout)
                } else {
                    deadline.set(call_deadline);
                    evaluate(&engine, &ast, &request)
                };
                // The host may have stopped waiting; a dropped receiver is fine.
                let _ = reply.send(DecideReply { request_id, result });
            }
            Command::Swap {
                source,
                deadline: swap_deadline,
                ticket,
                reply,
            } => {
                let result = match compile(&engine, &source) {
                    Ok(compiled) if Instant::now() <= swap_deadline && ticket.install() => {
                        ast = compiled;
                        Ok(())
                    }
                    Ok(_) => Err(SandboxError::Timeout {
                        waited_ms: limits.swap_timeout_ms,
                    }),
                    Err(err) => Err(err),
                };
                match &result {
                    Ok(()) => info!(agent = %agent, "context: decision logic replaced"),
                    Err(err) => info!(agent = %agent, error = %err, "context: swap refused"),
                }
                let _ = reply.send(result);
            }
            Command::Shutdown => break,
        }
    }
    debug!(agent = %agent, "context: stopped");
}
