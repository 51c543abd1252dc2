use crate::adapters::build_backend;
use crate::config::toml_config::CouncilConfig;
use crate::domain::model::{Seat, SeatReply};
use crate::domain::ports::LlmBackend;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Three backends, one per seat. The same backend may sit in several seats.
#[derive(Clone)]
pub struct Council {
    seats: [Arc<dyn LlmBackend>; 3],
}

impl Council {
    pub fn new(
        primary: Arc<dyn LlmBackend>,
        secondary: Arc<dyn LlmBackend>,
        tertiary: Arc<dyn LlmBackend>,
    ) -> Self {
        Self {
            seats: [primary, secondary, tertiary],
        }
    }

    pub fn from_config(config: &CouncilConfig) -> Result<Self> {
        // 同一個供應商只建立一個 client
        let mut built: HashMap<String, Arc<dyn LlmBackend>> = HashMap::new();
        let mut seat_backend = |seat: Seat| -> Result<Arc<dyn LlmBackend>> {
            let name = config.provider_name(seat).to_string();
            if let Some(backend) = built.get(&name) {
                return Ok(Arc::clone(backend));
            }
            let backend = build_backend(&name, config.provider_for(seat)?)?;
            built.insert(name, Arc::clone(&backend));
            Ok(backend)
        };

        let primary = seat_backend(Seat::Primary)?;
        let secondary = seat_backend(Seat::Secondary)?;
        let tertiary = seat_backend(Seat::Tertiary)?;
        Ok(Self::new(primary, secondary, tertiary))
    }

    pub fn backend(&self, seat: Seat) -> &Arc<dyn LlmBackend> {
        &self.seats[seat.index()]
    }

    pub fn backend_name(&self, seat: Seat) -> &str {
        self.backend(seat).name()
    }

    /// Raw call; errors propagate.
    pub async fn ask(&self, seat: Seat, prompt: &str) -> Result<String> {
        let backend = self.backend(seat);
        tracing::debug!("Asking {} seat ({})", seat, backend.name());
        backend.complete(prompt).await
    }

    /// Catch-all call: a failure becomes the reply text so later prompts and
    /// output still have something to show.
    pub async fn consult(&self, seat: Seat, prompt: &str) -> String {
        self.consult_reply(seat, prompt).await.text
    }

    pub async fn consult_reply(&self, seat: Seat, prompt: &str) -> SeatReply {
        let backend = self.backend_name(seat).to_string();
        match self.ask(seat, prompt).await {
            Ok(text) if text.trim().is_empty() => SeatReply {
                seat,
                backend,
                text: "No response".to_string(),
                failed: true,
            },
            Ok(text) => SeatReply {
                seat,
                backend,
                text,
                failed: false,
            },
            Err(e) => {
                tracing::warn!("{} ({} seat) failed: {}", backend, seat, e);
                SeatReply {
                    seat,
                    text: format!("{} ERROR → {}", backend, e),
                    backend,
                    failed: true,
                }
            }
        }
    }

    /// Ask every seat the same prompt, one after another.
    pub async fn poll_all(&self, prompt: &str) -> Vec<SeatReply> {
        let mut replies = Vec::with_capacity(Seat::ALL.len());
        for seat in Seat::ALL {
            replies.push(self.consult_reply(seat, prompt).await);
        }
        replies
    }
}
