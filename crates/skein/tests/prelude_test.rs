use skein::prelude::*;
use tempfile::TempDir;

#[tokio::test]
async fn prelude_covers_a_full_conversation() {
    let tmp = TempDir::new().unwrap();
    let store = ThreadStoreBuilder::new()
        .local_root(tmp.path())
        .build()
        .unwrap();

    let thread = store
        .create_thread(CreateThreadParams::new().with_title("Prelude"))
        .await
        .unwrap();

    for (role, text) in [(MessageRole::User, "ping"), (MessageRole::Assistant, "pong")] {
        store
            .save_message(
                &thread.id,
                SaveThreadMessageParams::new(ModelMessage::new(role, text), MessageUsage::new(40, 40, 5)),
            )
            .await
            .unwrap();
    }

    let summarizer = |history: Vec<ThreadMessageRecord>| async move {
        let text = history
            .iter()
            .filter_map(|record| record.message.content.as_text())
            .collect::<Vec<_>>()
            .join(" / ");
        Ok::<_, anyhow::Error>(ModelMessage::assistant(text))
    };
    let result = store
        .compact_if_needed(
            &thread.id,
            CompactThreadOptions::new(CompactionPolicy::new(100), &summarizer),
        )
        .await
        .unwrap()
        .unwrap();

    assert!(result.did_compact);
    assert_eq!(
        result.thread.active_history[0].message.content,
        MessageContent::text("ping / pong")
    );

    let listed = store.list_threads(ListThreadsOptions::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title.as_deref(), Some("Prelude"));
}
