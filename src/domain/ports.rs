use crate::utils::error::Result;
use async_trait::async_trait;

/// A chat model reachable over some transport. One prompt in, one reply out.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// Line-oriented user interaction.
pub trait Console: Send {
    fn say(&mut self, line: &str);

    /// Prompt and read one line; `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;
}
