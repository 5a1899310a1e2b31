use std::sync::Arc;

use crate::{
    impression::{Analytics, ImpressionHandler},
    Client, Context,
};

/// Configuration for [`Client`].
#[derive(Default)]
pub struct ClientConfig {
    pub(crate) context: Context,
    pub(crate) impression_handlers: Vec<Arc<dyn ImpressionHandler + Send + Sync>>,
    pub(crate) analytics: Option<Analytics>,
}

impl ClientConfig {
    /// Create a default configuration: empty global context, no impression handlers.
    ///
    /// ```
    /// # use rox::ClientConfig;
    /// ClientConfig::new();
    /// ```
    pub fn new() -> Self {
        ClientConfig::default()
    }

    /// Set the global context. It is merged under the context passed to every evaluation and
    /// cannot be changed once the client is created.
    ///
    /// ```
    /// # use rox::{ClientConfig, Context};
    /// let config = ClientConfig::new().context(Context::new().with("app_version", "2.1.0"));
    /// ```
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Add an impression handler to receive every flag evaluation.
    ///
    /// ```
    /// # use rox::{ClientConfig, ImpressionArgs};
    /// let config = ClientConfig::new().impression_handler(|args: &ImpressionArgs| {
    ///     println!("{:?}", args);
    /// });
    /// ```
    pub fn impression_handler(
        mut self,
        handler: impl ImpressionHandler + Send + Sync + 'static,
    ) -> Self {
        self.impression_handlers.push(Arc::new(handler));
        self
    }

    /// Set the analytics side-channel. `sink` receives impressions of bound, non-archived
    /// experiments whenever `gate` returns `true`.
    pub fn analytics(
        mut self,
        sink: impl ImpressionHandler + Send + Sync + 'static,
        gate: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.analytics = Some(Analytics::new(sink, gate));
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// ```
    /// # use rox::{Client, ClientConfig};
    /// let client: Client = ClientConfig::new().to_client();
    /// ```
    pub fn to_client(self) -> Client {
        Client::new(self)
    }
}
