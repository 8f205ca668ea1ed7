//! Test Prediction Client
//!
//! Generates random survey records and posts them to a running prediction API.
//!
//! Usage: test_client [base_url] [count] [invalid_rate] [delay_ms]

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Survey record matching the API's expected fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SurveyRecord {
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Age")]
    age: f64,
    #[serde(rename = "Height")]
    height: f64,
    #[serde(rename = "Weight")]
    weight: f64,
    family_history_with_overweight: String,
    #[serde(rename = "FAVC")]
    favc: String,
    #[serde(rename = "FCVC")]
    fcvc: f64,
    #[serde(rename = "NCP")]
    ncp: f64,
    #[serde(rename = "CAEC")]
    caec: String,
    #[serde(rename = "SMOKE")]
    smoke: String,
    #[serde(rename = "CH2O")]
    ch2o: f64,
    #[serde(rename = "SCC")]
    scc: String,
    #[serde(rename = "FAF")]
    faf: f64,
    #[serde(rename = "TUE")]
    tue: f64,
    #[serde(rename = "CALC")]
    calc: String,
    #[serde(rename = "MTRANS")]
    mtrans: String,
}

/// Subset of the prediction response the client reports on
#[derive(Debug, Deserialize)]
struct PredictReply {
    status: String,
    prediction: Option<PredictionSummary>,
    risk_level: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictionSummary {
    class: String,
    confidence: f64,
    bmi: f64,
}

/// Record generator for testing
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RecordGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a plausible survey answer
    fn generate(&mut self) -> SurveyRecord {
        let height: f64 = self.rng.gen_range(1.45..1.98);
        let bmi: f64 = self.rng.gen_range(16.0..45.0);
        let weight = (bmi * height * height * 10.0).round() / 10.0;

        SurveyRecord {
            gender: self.random_choice(&["Female", "Male"]).to_string(),
            age: self.rng.gen_range(14.0..61.0_f64).round(),
            height: (height * 100.0).round() / 100.0,
            weight,
            family_history_with_overweight: self.random_choice(&["yes", "no"]).to_string(),
            favc: self.random_choice(&["yes", "no"]).to_string(),
            fcvc: self.rng.gen_range(1.0..3.0),
            ncp: self.rng.gen_range(1.0..4.0),
            caec: self
                .random_choice(&["no", "Sometimes", "Frequently", "Always"])
                .to_string(),
            smoke: self.random_choice(&["yes", "no"]).to_string(),
            ch2o: self.rng.gen_range(1.0..3.0),
            scc: self.random_choice(&["yes", "no"]).to_string(),
            faf: self.rng.gen_range(0.0..3.0),
            tue: self.rng.gen_range(0.0..2.0),
            calc: self
                .random_choice(&["no", "Sometimes", "Frequently"])
                .to_string(),
            mtrans: self
                .random_choice(&[
                    "Public_Transportation",
                    "Walking",
                    "Automobile",
                    "Motorbike",
                    "Bike",
                ])
                .to_string(),
        }
    }

    /// Generate a record the API should reject
    fn generate_invalid(&mut self) -> SurveyRecord {
        let mut record = self.generate();
        record.mtrans = self.random_choice(&["Teleport", "Horse"]).to_string();
        record
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Prediction Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/'))
        .unwrap_or("http://localhost:5000");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let invalid_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.05);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(50);

    info!(
        base_url = %base_url,
        count = count,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let health_url = format!("{}/health", base_url);
    if let Err(e) = client.get(&health_url).send().await {
        warn!(error = %e, "API not reachable. Running in dry-run mode.");
        return run_dry_mode(count, invalid_rate).await;
    }

    let predict_url = format!("{}/predict", base_url);
    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    let mut by_class: BTreeMap<String, u64> = BTreeMap::new();
    let mut rejected = 0u64;
    let mut failed = 0u64;
    let mut total_latency = Duration::ZERO;

    info!("Sending {} prediction requests...", count);

    for i in 0..count {
        let record = if rng.gen_bool(invalid_rate.clamp(0.0, 1.0)) {
            generator.generate_invalid()
        } else {
            generator.generate()
        };

        let start = Instant::now();
        let response = client.post(&predict_url).json(&record).send().await?;
        let status = response.status();
        let reply: PredictReply = response.json().await?;
        let latency = start.elapsed();
        total_latency += latency;

        match (reply.status.as_str(), reply.prediction) {
            ("success", Some(prediction)) => {
                info!(
                    class = %prediction.class,
                    confidence = format!("{:.3}", prediction.confidence),
                    bmi = prediction.bmi,
                    risk_level = ?reply.risk_level,
                    latency_ms = latency.as_millis() as u64,
                    "Prediction received"
                );
                *by_class.entry(prediction.class).or_insert(0) += 1;
            }
            _ if status.is_client_error() => {
                rejected += 1;
                info!(status = %status, error = ?reply.error, "Request rejected");
            }
            _ => {
                failed += 1;
                warn!(status = %status, error = ?reply.error, "Request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!("Sent {}/{} requests", i + 1, count);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let mean_ms = if count > 0 {
        total_latency.as_secs_f64() * 1000.0 / count as f64
    } else {
        0.0
    };
    info!(
        "Completed! {} requests, {} rejected, {} failed, mean latency {:.2} ms",
        count, rejected, failed, mean_ms
    );
    for (class, n) in &by_class {
        info!("  {:22} {:>6}", class, n);
    }

    Ok(())
}

async fn run_dry_mode(count: u64, invalid_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no API connection)");

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let record = if rng.gen_bool(invalid_rate.clamp(0.0, 1.0)) {
            generator.generate_invalid()
        } else {
            generator.generate()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample record {}:\n{}", i + 1, serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}
