//! Operation Context
//!
//! Metadata about the current request, carried into command handlers for
//! structured logging.

use serde::Serialize;
use std::net::IpAddr;

use super::{Identity, Role};

/// Context for an operation, used for tracing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationContext {
    /// Authenticated caller, if any
    #[serde(skip)]
    pub actor: Option<Identity>,

    /// Value of the `x-request-id` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Client IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: Identity) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// `role:subject` for log fields, or `anonymous`
    pub fn actor_label(&self) -> String {
        match self.actor {
            Some(Identity {
                role: Role::Admin,
                subject,
            }) => format!("admin:{}", subject),
            Some(Identity {
                role: Role::Customer,
                subject,
            }) => format!("customer:{}", subject),
            None => "anonymous".to_string(),
        }
    }

    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_context_builder() {
        let admin = Uuid::new_v4();
        let context = OperationContext::new()
            .with_actor(Identity::admin(admin))
            .with_request_id("req-1")
            .with_client_ip("10.0.0.1".parse().unwrap());

        assert_eq!(context.actor_label(), format!("admin:{}", admin));
        assert_eq!(context.request_id(), "req-1");
        assert!(context.client_ip.is_some());
    }

    #[test]
    fn test_anonymous_context() {
        let context = OperationContext::new();
        assert_eq!(context.actor_label(), "anonymous");
        assert_eq!(context.request_id(), "-");
    }
}
