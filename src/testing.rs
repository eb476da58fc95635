//! Deterministic doubles for the external collaborators

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::connector::Connector;
use crate::core::ServiceConfig;
use crate::embeddings::{EmbeddingConfig, EmbeddingError, EmbeddingProvider, EmbeddingResult};
use crate::inference::{CompletionConfig, CompletionProvider, InferenceError, InferenceResult};
use crate::vector::{
    Distance, MemoryStore, StoredHit, VectorError, VectorResult, VectorStoreAdapter,
    VectorStoreConfig,
};

/// Fixed text to vector table
#[derive(Debug, Default)]
pub struct StubEmbedder {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    fallback: Option<Vec<f32>>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector returned for texts without an entry
    pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = Some(vector);
        self
    }

    pub fn with(self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.lock().insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .lock()
            .get(text)
            .cloned()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| EmbeddingError::RequestFailed {
                reason: format!("no stub vector for '{}'", text),
            })
    }
}

/// Replies with a fixed script and records every prompt it sees
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<InferenceResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failing call after the replies already scripted
    pub fn then_fail(self, reason: &str) -> Self {
        self.replies
            .lock()
            .push_back(Err(InferenceError::CompletionFailed {
                reason: reason.to_string(),
            }));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> InferenceResult<String> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(InferenceError::CompletionFailed {
                    reason: "script exhausted".to_string(),
                })
            })
    }
}

/// Wraps a script and parks call number `gate_at` until released.
///
/// `reached` fires when the parked call arrives; `release` lets it continue.
pub struct GatedCompletion {
    inner: ScriptedCompletion,
    gate_at: usize,
    pub reached: Notify,
    pub release: Notify,
}

impl GatedCompletion {
    pub fn new(inner: ScriptedCompletion, gate_at: usize) -> Self {
        Self {
            inner,
            gate_at,
            reached: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl CompletionProvider for GatedCompletion {
    async fn complete(&self, prompt: &str) -> InferenceResult<String> {
        if self.inner.calls() == self.gate_at {
            self.reached.notify_one();
            self.release.notified().await;
        }
        self.inner.complete(prompt).await
    }
}

/// Store whose every call fails as if Qdrant were down
#[derive(Debug, Default)]
pub struct UnreachableStore;

#[async_trait]
impl VectorStoreAdapter for UnreachableStore {
    async fn upsert(&self, _id: &str, _vector: Vec<f32>, _text: &str) -> VectorResult<()> {
        Err(unreachable_error())
    }

    async fn delete(&self, _id: &str) -> VectorResult<()> {
        Err(unreachable_error())
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> VectorResult<Vec<StoredHit>> {
        Err(unreachable_error())
    }

    async fn recreate(&self, _name: &str, _dimension: u64, _distance: Distance) -> VectorResult<()> {
        Err(unreachable_error())
    }
}

fn unreachable_error() -> VectorError {
    VectorError::StoreUnavailable {
        reason: "connection refused".to_string(),
    }
}

/// Reachable store that refuses every request
#[derive(Debug, Default)]
pub struct RejectingStore;

#[async_trait]
impl VectorStoreAdapter for RejectingStore {
    async fn upsert(&self, _id: &str, _vector: Vec<f32>, _text: &str) -> VectorResult<()> {
        Err(rejected_error())
    }

    async fn delete(&self, _id: &str) -> VectorResult<()> {
        Err(rejected_error())
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> VectorResult<Vec<StoredHit>> {
        Err(VectorError::QueryFailed {
            reason: "bad request".to_string(),
        })
    }

    async fn recreate(&self, _name: &str, _dimension: u64, _distance: Distance) -> VectorResult<()> {
        Err(rejected_error())
    }
}

fn rejected_error() -> VectorError {
    VectorError::WriteFailed {
        reason: "bad request".to_string(),
    }
}

/// Which store [`TestConnector`] hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Memory,
    Unreachable,
    Rejecting,
}

/// Connector handing out shared in-memory doubles
pub struct TestConnector {
    pub memory: MemoryStore,
    pub embedder: Arc<StubEmbedder>,
    pub completion: Mutex<Arc<dyn CompletionProvider>>,
    pub store_mode: StoreMode,
    /// Collection names the pool asked for, in order
    pub requested: Mutex<Vec<String>>,
}

impl TestConnector {
    pub fn new(embedder: StubEmbedder, completion: ScriptedCompletion) -> Self {
        Self {
            memory: MemoryStore::new(String::new()),
            embedder: Arc::new(embedder),
            completion: Mutex::new(Arc::new(completion)),
            store_mode: StoreMode::Memory,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Every store handed out is [`UnreachableStore`]
    pub fn unreachable(mut self) -> Self {
        self.store_mode = StoreMode::Unreachable;
        self
    }

    /// Every store handed out is [`RejectingStore`]
    pub fn rejecting(mut self) -> Self {
        self.store_mode = StoreMode::Rejecting;
        self
    }

    /// Completion double used by the next build
    pub fn set_completion<C>(&self, completion: C) -> Arc<C>
    where
        C: CompletionProvider + 'static,
    {
        let completion = Arc::new(completion);
        *self.completion.lock() = Arc::clone(&completion) as Arc<dyn CompletionProvider>;
        completion
    }

    /// Memory handle bound to `collection`
    pub fn store_for(&self, collection: &str) -> MemoryStore {
        self.memory.for_collection(collection)
    }
}

impl Connector for TestConnector {
    fn store(&self, config: &VectorStoreConfig) -> Arc<dyn VectorStoreAdapter> {
        self.requested.lock().push(config.collection_name.clone());
        match self.store_mode {
            StoreMode::Memory => Arc::new(self.memory.for_collection(&config.collection_name)),
            StoreMode::Unreachable => Arc::new(UnreachableStore),
            StoreMode::Rejecting => Arc::new(RejectingStore),
        }
    }

    fn embedder(&self, _config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::clone(&self.embedder) as Arc<dyn EmbeddingProvider>)
    }

    fn completion(
        &self,
        _config: &CompletionConfig,
    ) -> InferenceResult<Arc<dyn CompletionProvider>> {
        Ok(Arc::clone(&self.completion.lock()))
    }
}

/// Small configuration over the memory backend
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        collection_name: "test_room".to_string(),
        vector_dimension: 2,
        store_backend: crate::vector::StoreBackend::Memory,
        similarity_cutoff: 0.5,
        similarity_top_k: 2,
        roll_time: 3,
        desensitization_prompt: "Scrub: {text}".to_string(),
        evaluation_prompt: "Judge: {des_result}".to_string(),
        ..ServiceConfig::default()
    }
}

/// Prepare `collection` in `memory` with the given dimension
pub async fn create_memory_collection(memory: &MemoryStore, collection: &str, dimension: u64) {
    memory
        .recreate(collection, dimension, Distance::Cosine)
        .await
        .unwrap();
}

/// Serve exactly one HTTP response on a local port.
///
/// Returns the base URL and a handle resolving to the raw request received.
pub async fn serve_once(status: u16, body: &str) -> (String, tokio::task::JoinHandle<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);
            if request_complete(&raw) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {} TEST\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&raw).into_owned()
    });

    (format!("http://{}", addr), handle)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    raw.len() >= header_end + 4 + content_length
}
