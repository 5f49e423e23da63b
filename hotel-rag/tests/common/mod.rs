//! Deterministic capability doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hotel_rag::{CapabilityError, EmbeddingProvider, Generator, Snapshot};

/// Hash-based embeddings: the same text always maps to the same vector.
pub struct HashEmbedder {
    pub dimensions: usize,
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        Ok((0..self.dimensions).map(|i| ((hash.wrapping_add(i as u64)) as f32).sin()).collect())
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Returns a shorter vector starting at the given call number.
pub struct ShrinkingEmbedder {
    pub shrink_at: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for ShrinkingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(if call >= self.shrink_at { vec![1.0; 3] } else { vec![1.0; 4] })
    }

    fn name(&self) -> &str {
        "shrinking"
    }
}

/// Always unreachable.
pub struct DownEmbedder;

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
        Err(CapabilityError::Provider { provider: "down".into(), message: "unreachable".into() })
    }

    fn name(&self) -> &str {
        "down"
    }
}

/// Batch embedding that loses the last vector of every batch.
pub struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
        Ok(vec![0.5; 4])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        Ok(vec![vec![0.5; 4]; texts.len().saturating_sub(1)])
    }

    fn name(&self) -> &str {
        "short-batch"
    }
}

/// Sleeps before embedding.
pub struct SlowEmbedder(pub Duration);

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
        tokio::time::sleep(self.0).await;
        Ok(vec![1.0; 4])
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Records every prompt and replies with a fixed text.
pub struct RecordingGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Always unreachable.
pub struct DownGenerator;

#[async_trait]
impl Generator for DownGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CapabilityError> {
        Err(CapabilityError::Provider {
            provider: "down".into(),
            message: "connection refused".into(),
        })
    }

    fn name(&self) -> &str {
        "down"
    }
}

/// Sleeps before answering.
pub struct SlowGenerator(pub Duration);

#[async_trait]
impl Generator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CapabilityError> {
        tokio::time::sleep(self.0).await;
        Ok("too late".into())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// A snapshot with `rows` bookings and no revenue column.
pub fn bookings_without_revenue(rows: usize) -> Snapshot {
    let mut csv = String::from("hotel,country,arrival_date,adr,is_canceled,adults\n");
    for i in 0..rows {
        let hotel = if i % 2 == 0 { "city hotel" } else { "resort hotel" };
        let country = ["prt", "gbr", "fra", "esp"][i % 4];
        let day = i % 28 + 1;
        let adr = 50 + i % 90;
        let canceled = i % 3;
        csv.push_str(&format!("{hotel},{country},2017-07-{day:02},{adr}.5,{canceled},2\n"));
    }
    Snapshot::from_reader(csv.as_bytes()).unwrap()
}

/// A snapshot whose revenue column sums to exactly 500000.00, with no July
/// 2017 arrivals.
pub fn bookings_with_revenue() -> Snapshot {
    let csv = "\
hotel,country,arrival_date,adr,is_canceled,revenue
city hotel,prt,2016-05-01,100,0,200000.00
resort hotel,gbr,2016-06-01,120,1,150000.00
city hotel,fra,2017-08-01,90,0,150000.00
";
    Snapshot::from_reader(csv.as_bytes()).unwrap()
}
