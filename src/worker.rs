use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures::future::{self, BoxFuture, Shared};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::codec::{TextEncoder, UTF8_LABEL};
use crate::config::WorkerConfig;
use crate::module::{ComputeModule, LoadError, ModuleLoader, call_import_to_xlsx};
use crate::polyfill::{self, GlobalScope};

pub const CONVERT: &str = "convert";
pub const READY: &str = "ready";

/// Caller-supplied token echoed back with the result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationId {
    Number(Number),
    Text(String),
}

impl CorrelationId {
    /// Zero and the empty string count as "no token".
    pub fn is_truthy(&self) -> bool {
        match self {
            CorrelationId::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            CorrelationId::Text(s) => !s.is_empty(),
        }
    }

    /// Millisecond timestamp used when the caller gave no usable token.
    pub fn generated() -> Self {
        CorrelationId::Number(Number::from(chrono::Utc::now().timestamp_millis()))
    }
}

impl From<i32> for CorrelationId {
    fn from(value: i32) -> Self {
        CorrelationId::Number(Number::from(value))
    }
}

impl From<i64> for CorrelationId {
    fn from(value: i64) -> Self {
        CorrelationId::Number(Number::from(value))
    }
}

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self {
        CorrelationId::Number(Number::from(value))
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        CorrelationId::Text(value.to_string())
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        CorrelationId::Text(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<CorrelationId>,
    #[serde(default, rename = "wasmPath", skip_serializing_if = "Option::is_none")]
    pub wasm_path: Option<String>,
}

impl InboundMessage {
    pub fn convert(data: Value) -> Self {
        InboundMessage {
            kind: CONVERT.to_string(),
            data,
            uid: None,
            wasm_path: None,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<CorrelationId>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_module_path(mut self, path: impl Into<String>) -> Self {
        self.wasm_path = Some(path.into());
        self
    }
}

/// File-like byte buffer tagged with a MIME type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    #[serde(rename = "type")]
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Blob {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub uid: CorrelationId,
    #[serde(rename = "type")]
    pub kind: String,
    pub blob: Blob,
}

impl OutboundMessage {
    pub fn ready(uid: CorrelationId, blob: Blob) -> Self {
        OutboundMessage {
            uid,
            kind: READY.to_string(),
            blob,
        }
    }
}

fn resolve_uid(uid: Option<CorrelationId>) -> CorrelationId {
    match uid {
        Some(uid) if uid.is_truthy() => uid,
        _ => CorrelationId::generated(),
    }
}

pub type ModuleHandle = Arc<Mutex<Box<dyn ComputeModule>>>;

pub type SharedLoad = Shared<BoxFuture<'static, Result<ModuleHandle, Arc<LoadError>>>>;

enum LoadState {
    Uninitialized,
    Loading(SharedLoad),
    Ready(ModuleHandle),
}

/// Owner of the compute module
///
/// The handle is written once, by the first load that succeeds. Callers
/// arriving while that load is still running get a clone of the same
/// shared future instead of starting their own. A failed load puts the
/// state back to uninitialized.
pub struct ModuleState {
    loader: Arc<dyn ModuleLoader>,
    state: Arc<Mutex<LoadState>>,
    loads: AtomicUsize,
}

impl ModuleState {
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        ModuleState {
            loader,
            state: Arc::new(Mutex::new(LoadState::Uninitialized)),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn get_or_load(&self, path: &str) -> SharedLoad {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            LoadState::Ready(handle) => {
                let handle = Arc::clone(handle);
                return future::ready(Ok::<_, Arc<LoadError>>(handle)).boxed().shared();
            }
            LoadState::Loading(load) => return load.clone(),
            LoadState::Uninitialized => {}
        }

        log::info!("loading compute module from {}", path);
        self.loads.fetch_add(1, Ordering::SeqCst);

        let pending = self.loader.load(path);
        let slot: Weak<Mutex<LoadState>> = Arc::downgrade(&self.state);
        let load = async move {
            let result = pending.await.map(|module| Arc::new(Mutex::new(module)));
            if let Some(slot) = slot.upgrade() {
                let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
                *state = match &result {
                    Ok(handle) => LoadState::Ready(Arc::clone(handle)),
                    Err(_) => LoadState::Uninitialized,
                };
            }
            result.map_err(Arc::new)
        }
        .boxed()
        .shared();

        *state = LoadState::Loading(load.clone());
        load
    }

    pub fn is_ready(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, LoadState::Ready(_))
    }

    /// Number of loads started so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

/// Turns convert requests into ready results
pub struct Converter {
    config: WorkerConfig,
    modules: Arc<ModuleState>,
    encoder: TextEncoder,
}

impl Converter {
    pub fn new(config: WorkerConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        let mut scope = GlobalScope::new();
        if polyfill::install(&mut scope) {
            log::debug!("installed UTF-8 text codec into worker scope");
        }
        let encoder = scope
            .text_encoder(UTF8_LABEL)
            .and_then(Result::ok)
            .unwrap_or_default();

        Converter {
            config,
            modules: Arc::new(ModuleState::new(loader)),
            encoder,
        }
    }

    pub fn modules(&self) -> &ModuleState {
        &self.modules
    }

    /// Serve one convert request
    ///
    /// Returns `None` when the module could not be loaded or the conversion
    /// failed. Both cases are logged and never retried.
    pub async fn convert(&self, request: InboundMessage) -> Option<OutboundMessage> {
        let path = request
            .wasm_path
            .as_deref()
            .unwrap_or(&self.config.module_path);

        let module = match self.modules.get_or_load(path).await {
            Ok(module) => module,
            Err(e) => {
                log::error!("{}", e);
                return None;
            }
        };

        let bytes = {
            let mut module = module.lock().unwrap_or_else(PoisonError::into_inner);
            call_import_to_xlsx(&mut **module, &self.encoder, &request.data)
        };

        match bytes {
            Ok(bytes) => Some(OutboundMessage::ready(
                resolve_uid(request.uid),
                Blob::new(self.config.mime_type.clone(), bytes),
            )),
            Err(e) => {
                log::error!("conversion failed: {}", e);
                None
            }
        }
    }
}

/// Message-driven conversion worker
///
/// Runs on a single task. Requests are accepted while earlier ones are
/// still waiting on the module load, and each result is posted to the
/// outbox as soon as it is ready.
pub struct ConversionWorker {
    converter: Converter,
    outbox: mpsc::UnboundedSender<OutboundMessage>,
}

impl ConversionWorker {
    pub fn new(
        config: WorkerConfig,
        loader: Arc<dyn ModuleLoader>,
        outbox: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Self {
        ConversionWorker {
            converter: Converter::new(config, loader),
            outbox,
        }
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub async fn handle(&self, message: InboundMessage) {
        if message.kind != CONVERT {
            log::debug!("ignoring message of type {:?}", message.kind);
            return;
        }

        if let Some(result) = self.converter.convert(message).await {
            if self.outbox.send(result).is_err() {
                log::warn!("result dropped, receiver has gone away");
            }
        }
    }

    /// Serve messages until the inbox closes and every accepted request has
    /// finished.
    pub async fn run(self, mut inbox: mpsc::UnboundedReceiver<InboundMessage>) {
        let mut in_flight: FuturesUnordered<BoxFuture<'_, ()>> = FuturesUnordered::new();
        let mut open = true;

        loop {
            tokio::select! {
                message = inbox.recv(), if open => match message {
                    Some(message) => in_flight.push(self.handle(message).boxed()),
                    None => open = false,
                },
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
                else => break,
            }
        }

        log::debug!("conversion worker stopped");
    }
}

/// Caller side of a spawned worker
pub struct WorkerHandle {
    inbox: mpsc::UnboundedSender<InboundMessage>,
    outbox: mpsc::UnboundedReceiver<OutboundMessage>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn post(&self, message: InboundMessage) -> Result<(), mpsc::error::SendError<InboundMessage>> {
        self.inbox.send(message)
    }

    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.outbox.recv().await
    }

    /// Close the inbox, wait for outstanding requests and collect every
    /// result not yet received.
    pub async fn finish(self) -> Result<Vec<OutboundMessage>, tokio::task::JoinError> {
        let WorkerHandle {
            inbox,
            mut outbox,
            task,
        } = self;
        drop(inbox);
        task.await?;

        let mut results = Vec::new();
        while let Some(result) = outbox.recv().await {
            results.push(result);
        }
        Ok(results)
    }
}

/// Start a worker on the current tokio runtime.
pub fn spawn(config: WorkerConfig, loader: Arc<dyn ModuleLoader>) -> WorkerHandle {
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();

    let worker = ConversionWorker::new(config, loader, outbox_tx);
    let task = tokio::spawn(worker.run(inbox_rx));

    WorkerHandle {
        inbox: inbox_tx,
        outbox: outbox_rx,
        task,
    }
}
