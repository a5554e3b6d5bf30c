//! audit-generate: send synthetic audit events to a running server.

use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use serde_json::json;

use audit_svc::config::GenerateSettings;
use audit_svc::domain::NewAuditEvent;

const EVENT_KINDS: [&str; 3] = ["UserLogin", "UserCreated", "UserLogout"];
const APPLICATIONS: [&str; 3] = ["grease_monkey", "cauliflower", "death_star"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = GenerateSettings::parse();
    settings.log.init();

    let client = reqwest::Client::new();
    let delay = Duration::from_secs_f64(settings.delay_s.max(0.0));

    for i in 1..=settings.iterations {
        tracing::info!(batch = i, total = settings.iterations, "sending batch");
        let batch = generate_events(settings.batch_size);
        let response = client.post(&settings.url).json(&batch).send().await?;
        tracing::info!(batch = i, status = %response.status(), "batch response");
        tokio::time::sleep(delay).await;
    }

    Ok(())
}

/// One batch sharing an application and timestamp, with random kinds and
/// usernames.
fn generate_events(batch_size: usize) -> Vec<NewAuditEvent> {
    let mut rng = rand::rng();
    let application = APPLICATIONS.choose(&mut rng).copied().unwrap_or("cauliflower");
    let now = Utc::now();

    (0..batch_size)
        .map(|_| NewAuditEvent {
            event_ts: now,
            application_name: application.to_string(),
            event_kind: EVENT_KINDS
                .choose(&mut rng)
                .copied()
                .unwrap_or("UserLogin")
                .to_string(),
            payload: json!({ "username": format!("user_{}", random_word(&mut rng)) }),
        })
        .collect()
}

fn random_word(rng: &mut impl Rng) -> String {
    (0..8).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}
