#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolgate::adapters::{Neighbor, RecordQuery};
use toolgate::tools::builtin::{register_builtin_tools, BuiltinServices};
use toolgate::{
    AdapterError, Dispatcher, Embedder, Generator, RecordSource, RetrievalPipeline, ToolRegistry,
    VectorIndex,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Clone)]
pub struct MockRecordSource {
    response: Result<Value, AdapterError>,
    delay: Option<Duration>,
    pub calls: Arc<Mutex<Vec<RecordQuery>>>,
}

impl MockRecordSource {
    pub fn new(response: Result<Value, AdapterError>) -> Self {
        Self {
            response,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch(&self, query: &RecordQuery) -> Result<Value, AdapterError> {
        self.calls.lock().unwrap().push(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}

#[derive(Clone)]
pub struct MockGenerator {
    reply: Result<String, AdapterError>,
    pub calls: Arc<Mutex<Vec<(Option<String>, String)>>>,
}

impl MockGenerator {
    pub fn new(reply: Result<String, AdapterError>) -> Self {
        Self {
            reply,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        user_content: &str,
    ) -> Result<String, AdapterError> {
        self.calls.lock().unwrap().push((
            system_instruction.map(str::to_string),
            user_content.to_string(),
        ));
        self.reply.clone()
    }
}

#[derive(Clone)]
pub struct MockEmbedder {
    vector: Result<Vec<f32>, AdapterError>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockEmbedder {
    pub fn new(vector: Result<Vec<f32>, AdapterError>) -> Self {
        Self {
            vector,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AdapterError> {
        self.calls.lock().unwrap().push(text.to_string());
        self.vector.clone()
    }
}

#[derive(Clone)]
pub struct MockIndex {
    neighbors: Result<Vec<Neighbor>, AdapterError>,
    pub calls: Arc<Mutex<Vec<(Vec<f32>, usize)>>>,
}

impl MockIndex {
    pub fn new(neighbors: Result<Vec<Neighbor>, AdapterError>) -> Self {
        Self {
            neighbors,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorIndex for MockIndex {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<Neighbor>, AdapterError> {
        self.calls.lock().unwrap().push((vector.to_vec(), limit));
        self.neighbors.clone()
    }
}

pub fn neighbor(id: &str, score: f32) -> Neighbor {
    Neighbor {
        id: id.to_string(),
        score,
        payload: serde_json::json!({ "name": id }),
    }
}

pub fn five_neighbors() -> Vec<Neighbor> {
    vec![
        neighbor("d", 0.40),
        neighbor("a", 0.91),
        neighbor("e", 0.12),
        neighbor("b", 0.75),
        neighbor("c", 0.75),
    ]
}

pub fn pipeline(embedder: &MockEmbedder, index: &MockIndex) -> RetrievalPipeline {
    RetrievalPipeline::new(Arc::new(embedder.clone()), Arc::new(index.clone()))
}

/// Mocks wired into a dispatcher with the built-in tools.
pub struct Harness {
    pub records: MockRecordSource,
    pub generator: MockGenerator,
    pub embedder: MockEmbedder,
    pub index: MockIndex,
    pub dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new(records: MockRecordSource, generator: MockGenerator) -> Self {
        Self::with_retrieval(
            records,
            generator,
            MockEmbedder::new(Ok(vec![0.1, 0.2, 0.3])),
            MockIndex::new(Ok(five_neighbors())),
        )
    }

    pub fn with_retrieval(
        records: MockRecordSource,
        generator: MockGenerator,
        embedder: MockEmbedder,
        index: MockIndex,
    ) -> Self {
        Self::build(records, generator, embedder, index, None)
    }

    pub fn with_deadline(
        records: MockRecordSource,
        generator: MockGenerator,
        deadline: Duration,
    ) -> Self {
        Self::build(
            records,
            generator,
            MockEmbedder::new(Ok(vec![0.1, 0.2, 0.3])),
            MockIndex::new(Ok(five_neighbors())),
            Some(deadline),
        )
    }

    fn build(
        records: MockRecordSource,
        generator: MockGenerator,
        embedder: MockEmbedder,
        index: MockIndex,
        deadline: Option<Duration>,
    ) -> Self {
        init_tracing();

        let mut registry = ToolRegistry::new();
        register_builtin_tools(
            &mut registry,
            BuiltinServices {
                records: Arc::new(records.clone()),
                generator: Arc::new(generator.clone()),
                pipeline: Arc::new(pipeline(&embedder, &index)),
            },
        )
        .unwrap();

        let mut dispatcher = Dispatcher::new(registry);
        if let Some(deadline) = deadline {
            dispatcher = dispatcher.with_deadline(deadline);
        }

        Self {
            records,
            generator,
            embedder,
            index,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

pub fn args(value: Value) -> toolgate::Arguments {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
