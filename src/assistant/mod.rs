use crate::dispatch::{GenerationRequest, RequestError, TemplateDispatcher};
use crate::event::AppEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinError;
use tracing::{debug, error, info};

/// Runs template dispatch off the UI thread and reports back over `tx`.
#[derive(Clone)]
pub struct AssistantClient {
    tx: mpsc::Sender<AppEvent>,
    dispatcher: Arc<TemplateDispatcher>,
    runtime_handle: Handle,
    next_request_id: Arc<AtomicU64>,
}

impl AssistantClient {
    pub fn new(
        runtime_handle: Handle,
        tx: mpsc::Sender<AppEvent>,
        dispatcher: Arc<TemplateDispatcher>,
    ) -> Self {
        Self {
            tx,
            dispatcher,
            runtime_handle,
            next_request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Validates the prompt and queues a generation. Returns the request id.
    ///
    /// Requests are never cancelled; when several are in flight the UI shows
    /// whichever result arrives last.
    pub fn request(&self, prompt: &str, deep_think: bool) -> Result<u64, RequestError> {
        let request = GenerationRequest::new(
            self.next_request_id.fetch_add(1, Ordering::Relaxed),
            prompt,
            deep_think,
        )?;
        let request_id = request.id;

        info!(
            request_id,
            deep_think,
            prompt_len = request.prompt.chars().count(),
            "generation requested"
        );

        let tx = self.tx.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        self.runtime_handle.spawn(async move {
            let started = Instant::now();
            let result = run_guarded(move || dispatcher.generate(&request)).await;

            let event = match result {
                Ok(generation) => {
                    debug!(
                        request_id,
                        category = generation.category.unwrap_or("general"),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "generation finished"
                    );
                    AppEvent::Generated {
                        request_id,
                        category: generation.category,
                        code: generation.code,
                        deep_think,
                        elapsed: started.elapsed(),
                    }
                }
                Err(message) => {
                    error!(request_id, %message, "generation failed");
                    AppEvent::GenerationFailed {
                        request_id,
                        message,
                    }
                }
            };

            if tx.send(event).is_err() {
                debug!(request_id, "event channel closed before result delivery");
            }
        });

        Ok(request_id)
    }
}

/// Runs `job` on the blocking pool and turns a panic into an error message.
async fn run_guarded<F, T>(job: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| describe_join_error(&err))
}

fn describe_join_error(err: &JoinError) -> String {
    if err.is_cancelled() {
        "generation task was cancelled".to_string()
    } else {
        format!("generation task failed: {err}")
    }
}
