//! A host-side interceptor with its own in-memory config store.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tlsign_core::{ConfigStore, Context, InterceptRequest, OutboundRequest, Result, StaticEnv};

// Config handled by the store below.
#[derive(Clone, Debug, Default)]
struct TraceConfig {
    header: String,
    value: String,
}

#[derive(Debug, Default)]
struct MemoryStore {
    config: RwLock<Option<TraceConfig>>,
}

#[async_trait]
impl ConfigStore for MemoryStore {
    type Config = TraceConfig;

    async fn load(&self, ctx: &Context) -> Result<Option<Self::Config>> {
        if let Some(cfg) = self.config.read().expect("lock poisoned").clone() {
            return Ok(Some(cfg));
        }
        // Fall back to the environment when nothing was saved yet.
        Ok(ctx.env_var("TRACE_VALUE").map(|value| TraceConfig {
            header: "X-Trace".to_string(),
            value,
        }))
    }

    async fn save(&self, _: &Context, config: &Self::Config) -> Result<()> {
        *self.config.write().expect("lock poisoned") = Some(config.clone());
        Ok(())
    }
}

// Replace one header on every request.
#[derive(Debug)]
struct TraceInterceptor {
    config: TraceConfig,
}

impl InterceptRequest for TraceInterceptor {
    fn on_request(&self, req: OutboundRequest) -> OutboundRequest {
        if self.config.header.is_empty() {
            return req;
        }
        req.without_header(&self.config.header)
            .with_header(&self.config.header, &self.config.value)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let ctx = Context::new().with_env(StaticEnv {
        home_dir: None,
        envs: [("TRACE_VALUE".to_string(), "from-env".to_string())].into(),
    });
    let store = MemoryStore::default();

    let config = store.load(&ctx).await?.unwrap_or_default();
    let interceptor = Arc::new(TraceInterceptor { config });
    let req = interceptor.on_request(OutboundRequest::new("GET", "/ping"));
    println!("before save: {:?}", req.headers());

    store
        .save(
            &ctx,
            &TraceConfig {
                header: "X-Trace".to_string(),
                value: "saved".to_string(),
            },
        )
        .await?;
    let config = store.load(&ctx).await?.unwrap_or_default();
    let interceptor = Arc::new(TraceInterceptor { config });
    let req = interceptor.on_request(OutboundRequest::new("GET", "/ping"));
    println!("after save: {:?}", req.headers());

    Ok(())
}
