//! A fake `EnrichmentClient` exercised the way the enrichment queue would
//! drive one, verifying the trait's fire-and-forget contract (§5.1) and
//! the wire task's fingerprint survives the channel round trip.

use std::sync::{Arc, Mutex};

use worldhist_llm::{EnrichmentClient, EnrichmentTask, EnrichmentType, TaskId, WireTaskKind};

#[derive(Default)]
struct RecordingClient {
    received: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl EnrichmentClient for RecordingClient {
    async fn execute(&self, task: EnrichmentTask) -> worldhist_llm::Result<()> {
        self.received.lock().unwrap().push(task.fingerprint);
        Ok(())
    }

    async fn abort(&self, _task_id: Option<TaskId>) -> worldhist_llm::Result<()> {
        Ok(())
    }
}

fn sample_task(id: u64, fingerprint: &str) -> EnrichmentTask {
    EnrichmentTask {
        id: TaskId(id),
        enrichment_type: EnrichmentType::Description,
        wire_kind: WireTaskKind::Text,
        entity_id: None,
        project_id: "test-project".to_string(),
        prompt: "describe this entity".to_string(),
        previous_image_id: None,
        enqueued_tick: 3,
        fingerprint: fingerprint.to_string(),
    }
}

#[tokio::test]
async fn client_receives_dispatched_tasks_in_order() {
    let client = Arc::new(RecordingClient::default());
    client.execute(sample_task(0, "a")).await.unwrap();
    client.execute(sample_task(1, "b")).await.unwrap();
    client.abort(None).await.unwrap();

    let received = client.received.lock().unwrap();
    assert_eq!(*received, vec!["a".to_string(), "b".to_string()]);
}
