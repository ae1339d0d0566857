// Request pipeline
// Ordered synchronous hooks applied around the transport

use crate::descriptor::{Envelope, RequestDescriptor};
use crate::error::ApiError;

/// Hook applied to a descriptor before submission
pub type PreStep = Box<dyn Fn(RequestDescriptor) -> RequestDescriptor + Send + Sync>;

/// Hook applied to a response envelope after submission
///
/// A post step may rewrite the envelope or fail the request.
pub type PostStep = Box<dyn Fn(Envelope) -> Result<Envelope, ApiError> + Send + Sync>;

/// Ordered lists of pre and post steps
///
/// Steps run in registration order. Credential injection is itself a pre
/// step installed at client construction, so the whole request path is
/// visible in one place.
#[derive(Default)]
pub struct Pipeline {
    pre: Vec<PreStep>,
    post: Vec<PostStep>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_pre(&mut self, step: PreStep) {
        self.pre.push(step);
    }

    pub fn push_post(&mut self, step: PostStep) {
        self.post.push(step);
    }

    /// Run every pre step in order
    pub fn apply_pre(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        self.pre
            .iter()
            .fold(descriptor, |descriptor, step| step(descriptor))
    }

    /// Run every post step in order, stopping at the first failure
    pub fn apply_post(&self, envelope: Envelope) -> Result<Envelope, ApiError> {
        self.post
            .iter()
            .try_fold(envelope, |envelope, step| step(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new("https://api.example.com", Method::GET, "/orders")
    }

    fn envelope(body: Value) -> Envelope {
        Envelope {
            status: 200,
            headers: HashMap::new(),
            body,
        }
    }

    #[test]
    fn test_pre_steps_run_in_order() {
        let mut pipeline = Pipeline::new();
        pipeline.push_pre(Box::new(|mut d| {
            d.headers.insert("X-Step".to_string(), "one".to_string());
            d
        }));
        pipeline.push_pre(Box::new(|mut d| {
            d.headers.insert("X-Step".to_string(), "two".to_string());
            d
        }));

        let result = pipeline.apply_pre(descriptor());
        assert_eq!(result.headers.get("X-Step"), Some(&"two".to_string()));
    }

    #[test]
    fn test_post_step_rewrites_envelope() {
        let mut pipeline = Pipeline::new();
        pipeline.push_post(Box::new(|mut e| {
            e.body = json!({"wrapped": e.body});
            Ok(e)
        }));

        let result = pipeline.apply_post(envelope(json!({"n": 1}))).unwrap();
        assert_eq!(result.body, json!({"wrapped": {"n": 1}}));
    }

    #[test]
    fn test_post_step_failure_short_circuits() {
        let mut pipeline = Pipeline::new();
        pipeline.push_post(Box::new(|_| {
            Err(ApiError::Request {
                status: 500,
                payload: Value::Null,
            })
        }));
        pipeline.push_post(Box::new(|mut e| {
            e.status = 0;
            Ok(e)
        }));

        let result = pipeline.apply_post(envelope(Value::Null));
        assert!(matches!(
            result,
            Err(ApiError::Request { status: 500, .. })
        ));
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Pipeline::new();
        let result = pipeline.apply_post(envelope(json!({"n": 1}))).unwrap();
        assert_eq!(result.body, json!({"n": 1}));
    }
}
