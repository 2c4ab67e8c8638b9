use anyhow::Result;
use serde_json::json;
use skein::prelude::*;
use skein::RebuildOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = StoreConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    init_logging(&config);

    tracing::info!(root = %config.root_dir.display(), "Starting thread demo");

    // Flat per-token pricing, just so costs show up in the rollups
    let store = ThreadStoreBuilder::from_config(&config)
        .pricing_calculator(|_model: &str, input: u64, output: u64| {
            input as f64 * 0.000_002 + output as f64 * 0.000_008
        })
        .build()?;

    // 1. Create a thread
    let thread = store
        .create_thread(
            CreateThreadParams::new()
                .with_user_id("demo-user")
                .with_title("Thread demo"),
        )
        .await?;
    println!("Created thread {}", thread.id);

    // 2. Record a short tool-using exchange
    let turns = vec![
        (ModelMessage::user("What's the weather in Lisbon?"), MessageUsage::new(120, 0, 0)),
        (
            ModelMessage::with_parts(
                MessageRole::Assistant,
                [ContentPart::tool_call("call_1", "weather", json!({"city": "Lisbon"}))],
            ),
            MessageUsage::new(0, 40, 850),
        ),
        (
            ModelMessage::with_parts(
                MessageRole::Tool,
                [ContentPart::tool_result("call_1", "weather", json!({"celsius": 21}))],
            ),
            MessageUsage::new(60, 0, 0),
        ),
        (
            ModelMessage::assistant("It's 21°C and sunny in Lisbon."),
            MessageUsage::new(0, 90, 1200),
        ),
    ];

    for (message, usage) in turns {
        let updated = store
            .save_message(
                &thread.id,
                SaveThreadMessageParams::new(message, usage).with_model_id("demo-model"),
            )
            .await?;
        if let Some(updated) = updated {
            println!(
                "  saved #{} (context {} tokens, cost ${:.6})",
                updated.history.len(),
                updated.context_size.total(),
                updated.usage.total_cost_usd
            );
        }
    }

    // 3. Compact once the context outgrows the configured budget
    let summarizer = |history: Vec<ThreadMessageRecord>| async move {
        Ok::<_, anyhow::Error>(ModelMessage::assistant(format!(
            "The user asked about the weather; {} messages were exchanged.",
            history.len()
        )))
    };
    let options = CompactThreadOptions::new(config.compaction, &summarizer);
    if let Some(result) = store.compact_if_needed(&thread.id, options).await? {
        println!(
            "Compaction: did_compact={} active={} last_compaction_ordinal={:?}",
            result.did_compact,
            result.thread.active_history.len(),
            result.thread.last_compaction_ordinal
        );
    }

    // 4. Undo it again from the full history
    if let Some(rebuilt) = store
        .rebuild_active_history(&thread.id, RebuildOptions::default())
        .await?
    {
        println!("Rebuilt active history: {} records", rebuilt.active_history.len());
    }

    // 5. List what is on disk
    for listed in store.list_threads(ListThreadsOptions::default()).await? {
        println!(
            "{}  {:?}  {} messages  updated {}",
            listed.id,
            listed.title,
            listed.history.len(),
            listed.updated_at
        );
    }

    Ok(())
}

fn init_logging(config: &StoreConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
