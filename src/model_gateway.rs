use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::providers::{UpstreamError, gemini};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system_instruction: &'a str,
}

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, UpstreamError>> + Send + 'a>>;

/// A backend that turns one prompt into one text answer using a named model.
pub trait ModelGateway: Send + Sync {
    fn generate<'a>(&'a self, request: GenerateRequest<'a>) -> GenerateFuture<'a>;
}

pub struct GeminiGateway {
    client: Client,
    cfg: Arc<Config>,
}

impl GeminiGateway {
    pub fn new(client: Client, cfg: Arc<Config>) -> Self {
        Self { client, cfg }
    }
}

impl ModelGateway for GeminiGateway {
    fn generate<'a>(&'a self, request: GenerateRequest<'a>) -> GenerateFuture<'a> {
        Box::pin(async move {
            gemini::generate(
                &self.client,
                &self.cfg,
                request.model,
                request.prompt,
                request.system_instruction,
            )
            .await
        })
    }
}

impl<G> ModelGateway for Arc<G>
where
    G: ModelGateway + ?Sized,
{
    fn generate<'a>(&'a self, request: GenerateRequest<'a>) -> GenerateFuture<'a> {
        (**self).generate(request)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::{GeminiGateway, GenerateRequest, ModelGateway};
    use crate::config::Config;

    #[tokio::test]
    async fn gemini_gateway_maps_transport_failures_to_upstream_errors() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);

        let vars = HashMap::from([
            ("GOOGLE_API_KEY", "test-key".to_string()),
            ("GEMINI_BASE_URL", format!("http://{addr}/v1beta")),
            ("MODEL_TIMEOUT_SECS", "1".to_string()),
        ]);
        let cfg = Arc::new(Config::from_env_with(|key| vars.get(key).cloned()));
        let gateway = GeminiGateway::new(reqwest::Client::new(), cfg);

        let err = gateway
            .generate(GenerateRequest {
                model: "gemini-2.0-flash",
                prompt: "ping",
                system_instruction: "",
            })
            .await
            .expect_err("generate should fail against a closed port");

        assert_eq!(err.status, None);
        assert!(
            err.message.contains("gemini-2.0-flash"),
            "unexpected message: {}",
            err.message
        );
    }
}
