use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::refresh_access_token;
use crate::config::ClientConfig;
use crate::descriptor::{Envelope, RequestDescriptor, RequestOptions, AUTHORIZATION};
use crate::error::ApiError;
use crate::navigation::{login_redirect_target, Navigator, NoopNavigator};
use crate::pipeline::{Pipeline, PostStep, PreStep};
use crate::store::{CredentialStore, MemoryStore};

/// HTTP client for the portal API
///
/// Wraps a reqwest transport, attaches the stored bearer credential to
/// outgoing requests and transparently recovers from an expired access
/// credential exactly once per request. When the recovery fails the client
/// clears stored credentials and asks the navigation collaborator to
/// redirect to the login route.
pub struct PortalHttpClient {
    client: Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    pipeline: Pipeline,
    attach_credential: bool,
}

impl PortalHttpClient {
    /// Create an authenticated client with default collaborators
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::builder().config(config).build()
    }

    /// Create a client builder
    pub fn builder() -> PortalHttpClientBuilder {
        PortalHttpClientBuilder::default()
    }

    /// Base origin this client is configured against
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Credential store shared with login and logout flows
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with(path, HashMap::new(), RequestOptions::default())
            .await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: HashMap<String, String>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let descriptor = self
            .descriptor(Method::GET, path)
            .with_headers(headers)
            .with_options(options);
        self.call(descriptor).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_with(path, body, HashMap::new()).await
    }

    pub async fn post_with<T, B>(
        &self,
        path: &str,
        body: &B,
        headers: HashMap<String, String>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let descriptor = self
            .descriptor(Method::POST, path)
            .with_headers(headers)
            .with_body(serde_json::to_value(body)?);
        self.call(descriptor).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.put_with(path, body, HashMap::new()).await
    }

    pub async fn put_with<T, B>(
        &self,
        path: &str,
        body: &B,
        headers: HashMap<String, String>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let descriptor = self
            .descriptor(Method::PUT, path)
            .with_headers(headers)
            .with_body(serde_json::to_value(body)?);
        self.call(descriptor).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.patch_with(path, body, HashMap::new()).await
    }

    pub async fn patch_with<T, B>(
        &self,
        path: &str,
        body: &B,
        headers: HashMap<String, String>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let descriptor = self
            .descriptor(Method::PATCH, path)
            .with_headers(headers)
            .with_body(serde_json::to_value(body)?);
        self.call(descriptor).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.delete_with::<T, Value>(path, None, HashMap::new())
            .await
    }

    pub async fn delete_with<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        headers: HashMap<String, String>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut descriptor = self.descriptor(Method::DELETE, path).with_headers(headers);
        if let Some(body) = body {
            descriptor = descriptor.with_body(serde_json::to_value(body)?);
        }
        self.call(descriptor).await
    }

    /// Issue a request against an arbitrary origin instead of the
    /// configured base, still injecting the stored access credential
    ///
    /// Used for cross-service calls. The refresh protocol applies exactly
    /// as it does for requests against the base origin.
    pub async fn call_dynamic_api<T: DeserializeOwned>(
        &self,
        origin: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HashMap<String, String>,
    ) -> Result<T, ApiError> {
        let mut descriptor = RequestDescriptor::new(origin, method, path).with_headers(headers);
        descriptor.body = body;
        self.call(descriptor).await
    }

    /// Raw mode: return the full response envelope on success
    ///
    /// Skips the embedded-success-code classification so callers that need
    /// response metadata get the whole envelope. The refresh protocol and
    /// the transport-level status contract are unchanged: non-2xx still
    /// fails with [`ApiError::Request`].
    pub async fn send_raw(&self, descriptor: RequestDescriptor) -> Result<Envelope, ApiError> {
        let envelope = self.dispatch(descriptor).await?;
        if (200..300).contains(&envelope.status) {
            Ok(envelope)
        } else {
            Err(ApiError::Request {
                status: envelope.status,
                payload: envelope.body,
            })
        }
    }

    fn descriptor(&self, method: Method, path: &str) -> RequestDescriptor {
        RequestDescriptor::new(&self.config.base_url, method, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let envelope = self.dispatch(descriptor).await?;
        let payload = classify(envelope)?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Run the pipeline, submit, and recover from a 401 exactly once
    async fn dispatch(&self, descriptor: RequestDescriptor) -> Result<Envelope, ApiError> {
        let descriptor = self.pipeline.apply_pre(descriptor);
        let envelope = self.submit(&descriptor).await?;

        if envelope.status == 401 && self.attach_credential && !descriptor.retried {
            return self.refresh_and_replay(descriptor).await;
        }

        self.pipeline.apply_post(envelope)
    }

    /// Refresh protocol: one-shot credential refresh plus a single replay
    async fn refresh_and_replay(
        &self,
        mut descriptor: RequestDescriptor,
    ) -> Result<Envelope, ApiError> {
        tracing::debug!(id = %descriptor.id, "Received 401, entering refresh protocol");

        let refresh_token = match self.store.load() {
            Ok(Some(pair)) => pair.refresh_token,
            Ok(None) => return self.fail_auth("no refresh credential"),
            Err(e) => {
                tracing::warn!(error = %e, "Credential store read failed during refresh");
                return self.fail_auth("no refresh credential");
            }
        };

        let pair = match refresh_access_token(
            &self.client,
            &self.config.base_url,
            &self.config.refresh_path,
            &refresh_token,
        )
        .await
        {
            Ok(pair) => pair,
            Err(ApiError::Auth(reason)) => {
                tracing::warn!(id = %descriptor.id, reason = %reason, "Token refresh failed");
                return self.fail_auth(&reason);
            }
            Err(e) => {
                tracing::warn!(id = %descriptor.id, error = %e, "Token refresh failed");
                return self.fail_auth(&e.to_string());
            }
        };

        if let Err(e) = self.store.save(&pair) {
            tracing::warn!(error = %e, "Failed to persist refreshed credentials");
        }

        // Replay goes back through the pre pipeline so the credential step
        // re-reads the store and attaches whichever pair was most recently
        // persisted.
        descriptor.retried = true;
        descriptor.headers.remove(AUTHORIZATION);
        let descriptor = self.pipeline.apply_pre(descriptor);

        tracing::debug!(id = %descriptor.id, "Replaying request with refreshed credential");
        let envelope = self.submit(&descriptor).await?;
        self.pipeline.apply_post(envelope)
    }

    /// Credential cleanup and login redirect after a failed refresh
    fn fail_auth(&self, reason: &str) -> Result<Envelope, ApiError> {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear credentials");
        }

        if let Some(location) = self.navigator.current_location() {
            let target = login_redirect_target(&self.config.login_route, &location);
            tracing::info!(target = %target, "Redirecting to login after refresh failure");
            self.navigator.push(&target);
        }

        Err(ApiError::Auth(reason.to_string()))
    }

    async fn submit(&self, descriptor: &RequestDescriptor) -> Result<Envelope, ApiError> {
        let url = descriptor.url();
        tracing::debug!(
            id = %descriptor.id,
            method = %descriptor.method,
            url = %url,
            retried = descriptor.retried,
            "Sending HTTP request"
        );

        let mut request = self.client.request(descriptor.method.clone(), &url);

        if !descriptor.query.is_empty() {
            request = request.query(&descriptor.query);
        }

        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        if let Some(timeout) = descriptor.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        tracing::debug!(id = %descriptor.id, status, "Received HTTP response");

        Ok(Envelope {
            status,
            headers,
            body,
        })
    }
}

/// Success classification for classified mode
///
/// A response is successful when its HTTP status is 200 or its payload
/// carries the embedded success code "200". Everything else fails with the
/// original status and payload attached.
fn classify(envelope: Envelope) -> Result<Value, ApiError> {
    if envelope.status == 200 || envelope.has_success_code() {
        return Ok(envelope.body);
    }

    Err(ApiError::Request {
        status: envelope.status,
        payload: envelope.body,
    })
}

/// Builder for [`PortalHttpClient`]
pub struct PortalHttpClientBuilder {
    config: Option<ClientConfig>,
    store: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    attach_credential: bool,
    pre: Vec<PreStep>,
    post: Vec<PostStep>,
}

impl Default for PortalHttpClientBuilder {
    fn default() -> Self {
        Self {
            config: None,
            store: None,
            navigator: None,
            attach_credential: true,
            pre: Vec::new(),
            post: Vec::new(),
        }
    }
}

impl PortalHttpClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Shorthand for a default configuration against the given origin
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config = Some(ClientConfig::new(url));
        self
    }

    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Whether the stored access credential is attached to requests
    ///
    /// With this off the client behaves like the unauthenticated base
    /// instance: no bearer header, no refresh protocol.
    pub fn attach_credential(mut self, attach: bool) -> Self {
        self.attach_credential = attach;
        self
    }

    /// Register an extra pre step, run after credential injection
    pub fn pre_step(mut self, step: PreStep) -> Self {
        self.pre.push(step);
        self
    }

    /// Register an extra post step
    pub fn post_step(mut self, step: PostStep) -> Self {
        self.post.push(step);
        self
    }

    pub fn build(self) -> Result<PortalHttpClient, ApiError> {
        let config = self
            .config
            .ok_or_else(|| ApiError::Config("base_url is required".to_string()))?;
        config
            .validate()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn CredentialStore>);
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(NoopNavigator) as Arc<dyn Navigator>);

        let client = Client::builder()
            .connect_timeout(config.connect_duration())
            .timeout(config.request_duration())
            .build()
            .map_err(ApiError::Transport)?;

        let mut pipeline = Pipeline::new();

        if self.attach_credential {
            let store_for_step = store.clone();
            pipeline.push_pre(Box::new(move |mut descriptor: RequestDescriptor| {
                match store_for_step.load() {
                    Ok(Some(pair)) => {
                        descriptor.headers.insert(
                            AUTHORIZATION.to_string(),
                            format!("Bearer {}", pair.access_token),
                        );
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Credential store read failed, sending request anonymously");
                    }
                }
                descriptor
            }));
        }

        for step in self.pre {
            pipeline.push_pre(step);
        }
        for step in self.post {
            pipeline.push_post(step);
        }

        Ok(PortalHttpClient {
            client,
            config,
            store,
            navigator,
            pipeline,
            attach_credential: self.attach_credential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn envelope(status: u16, body: Value) -> Envelope {
        Envelope {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    #[test]
    fn test_classify_status_200() {
        let payload = classify(envelope(200, json!({"items": []}))).unwrap();
        assert_eq!(payload, json!({"items": []}));
    }

    #[test]
    fn test_classify_embedded_success_code() {
        let payload = classify(envelope(201, json!({"code": "200", "data": 1}))).unwrap();
        assert_eq!(payload, json!({"code": "200", "data": 1}));
    }

    #[test]
    fn test_classify_failure_carries_status_and_payload() {
        let result = classify(envelope(404, json!({"message": "not found"})));
        match result {
            Err(ApiError::Request { status, payload }) => {
                assert_eq!(status, 404);
                assert_eq!(payload, json!({"message": "not found"}));
            }
            other => panic!("expected Request error, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_requires_config() {
        let result = PortalHttpClient::builder().build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_builder_rejects_invalid_origin() {
        let result = PortalHttpClient::builder().base_url("not-an-origin").build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let client = PortalHttpClient::builder()
            .base_url("https://api.example.com")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert!(client.store().load().unwrap().is_none());
    }
}
