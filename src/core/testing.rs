use crate::domain::ports::LlmBackend;
use crate::utils::error::{CouncilError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Backend double: answers from keyword rules first, then a queue, then a fallback.
#[derive(Clone)]
pub struct ScriptedBackend {
    name: String,
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    rules: Vec<(String, VecDeque<String>)>,
    queue: VecDeque<String>,
    fallback: Option<String>,
    prompts: Vec<String>,
}

impl ScriptedBackend {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.inner.lock().unwrap().queue.push_back(text.to_string());
        self
    }

    /// Answer prompts containing `marker`; successive matches pop successive
    /// replies, the last one repeats.
    pub fn when(self, marker: &str, text: &str) -> Self {
        {
            let mut script = self.inner.lock().unwrap();
            match script.rules.iter_mut().find(|(m, _)| m == marker) {
                Some((_, replies)) => replies.push_back(text.to_string()),
                None => script
                    .rules
                    .push((marker.to_string(), VecDeque::from([text.to_string()]))),
            }
        }
        self
    }

    pub fn otherwise(self, text: &str) -> Self {
        self.inner.lock().unwrap().fallback = Some(text.to_string());
        self
    }

    pub fn arc(&self) -> Arc<dyn LlmBackend> {
        Arc::new(self.clone())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.inner.lock().unwrap().prompts.clone()
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().prompts.len()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut script = self.inner.lock().unwrap();
        script.prompts.push(prompt.to_string());

        for (marker, replies) in script.rules.iter_mut() {
            if prompt.contains(marker.as_str()) {
                let text = if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                };
                if let Some(text) = text {
                    return Ok(text);
                }
            }
        }

        if let Some(text) = script.queue.pop_front() {
            return Ok(text);
        }
        script
            .fallback
            .clone()
            .ok_or_else(|| CouncilError::EmptyResponse {
                backend: self.name.clone(),
            })
    }
}
