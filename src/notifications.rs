//! # Push Notification Bridge
//!
//! Connects the host platform's notification machinery to the gateway.
//! Registration is a three-step handshake: confirm (or request) display
//! permission, obtain a push token from the messaging service, and upload
//! that token so the gateway can address this device. The platform pieces
//! are injected as capabilities so the flow is testable without a real
//! messaging service.
//!
//! Pushes that arrive while the app is in the foreground are not shown by
//! the platform; [`NotificationBridge::on_foreground_push`] mirrors them
//! into the same displayable shape the cache worker produces for
//! background pushes.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{DisplayNotification, PushPayload};

/// Display-permission state as reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet
    Prompt,
}

/// Host capability: query and request notification display permission
#[async_trait]
pub trait PermissionProber: Send + Sync {
    /// Current permission state, without prompting
    fn status(&self) -> PermissionStatus;

    /// Prompt the user and return the resulting state
    async fn request(&self) -> PermissionStatus;
}

/// Host capability: obtain a push token from the messaging service
#[async_trait]
pub trait PushTokenSource: Send + Sync {
    /// Fetch the device token, using the application's public VAPID key
    /// when one is configured.
    async fn token(&self, vapid_key: Option<&str>) -> Result<String>;
}

/// The registration bridge
pub struct NotificationBridge<P: PermissionProber, T: PushTokenSource> {
    api: ApiClient,
    permissions: P,
    tokens: T,
    vapid_key: Option<String>,
}

impl<P: PermissionProber, T: PushTokenSource> NotificationBridge<P, T> {
    pub fn new(api: ApiClient, permissions: P, tokens: T, vapid_key: Option<String>) -> Self {
        Self {
            api,
            permissions,
            tokens,
            vapid_key,
        }
    }

    /// Ensure display permission is granted, prompting only when the state
    /// is still undecided. A standing denial is never re-prompted.
    async fn ensure_permission(&self) -> Result<()> {
        match self.permissions.status() {
            PermissionStatus::Granted => Ok(()),
            PermissionStatus::Denied => Err(ClientError::PermissionDenied),
            PermissionStatus::Prompt => match self.permissions.request().await {
                PermissionStatus::Granted => Ok(()),
                _ => Err(ClientError::PermissionDenied),
            },
        }
    }

    /// Register this device for pushes addressed to `user_id`. Returns the
    /// token that was uploaded.
    pub async fn register(&self, user_id: i64) -> Result<String> {
        self.ensure_permission().await?;
        let token = self.tokens.token(self.vapid_key.as_deref()).await?;
        if let Err(e) = self.api.save_fcm_token(user_id, &token).await {
            warn!(user_id, error = %e, "failed to upload push token");
            return Err(e);
        }
        info!(user_id, "push token registered");
        Ok(token)
    }

    /// Mirror a push that arrived while the app is in the foreground into
    /// a displayable notification.
    pub fn on_foreground_push(&self, payload: &PushPayload) -> DisplayNotification {
        payload.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedPermissions {
        current: PermissionStatus,
        after_prompt: PermissionStatus,
        prompts: AtomicUsize,
    }

    impl FixedPermissions {
        fn new(current: PermissionStatus, after_prompt: PermissionStatus) -> Self {
            Self {
                current,
                after_prompt,
                prompts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PermissionProber for FixedPermissions {
        fn status(&self) -> PermissionStatus {
            self.current
        }

        async fn request(&self) -> PermissionStatus {
            self.prompts.fetch_add(1, Ordering::Relaxed);
            self.after_prompt
        }
    }

    struct FixedToken(&'static str);

    #[async_trait]
    impl PushTokenSource for FixedToken {
        async fn token(&self, _vapid_key: Option<&str>) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    async fn token_endpoint(server: &MockServer, user_id: i64, token: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/api/users/{}/fcm-token", user_id)))
            .and(body_string(token.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_granted_permission_registers_without_prompt() {
        let server = MockServer::start().await;
        token_endpoint(&server, 5, "tok-abc").await;

        let permissions =
            FixedPermissions::new(PermissionStatus::Granted, PermissionStatus::Denied);
        let bridge = NotificationBridge::new(
            ApiClient::new(format!("{}/api", server.uri())),
            permissions,
            FixedToken("tok-abc"),
            None,
        );

        let token = bridge.register(5).await.unwrap();
        assert_eq!(token, "tok-abc");
        assert_eq!(bridge.permissions.prompts.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_undecided_permission_prompts_once() {
        let server = MockServer::start().await;
        token_endpoint(&server, 9, "tok-xyz").await;

        let permissions =
            FixedPermissions::new(PermissionStatus::Prompt, PermissionStatus::Granted);
        let bridge = NotificationBridge::new(
            ApiClient::new(format!("{}/api", server.uri())),
            permissions,
            FixedToken("tok-xyz"),
            Some("vapid-public-key".to_string()),
        );

        bridge.register(9).await.unwrap();
        assert_eq!(bridge.permissions.prompts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_denied_permission_short_circuits() {
        let permissions =
            FixedPermissions::new(PermissionStatus::Denied, PermissionStatus::Granted);
        let bridge = NotificationBridge::new(
            ApiClient::new("http://localhost:1/api"),
            permissions,
            FixedToken("unused"),
            None,
        );

        let result = bridge.register(1).await;
        assert!(matches!(result, Err(ClientError::PermissionDenied)));
        // Never prompted, never fetched a token
        assert_eq!(bridge.permissions.prompts.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_prompt_refused_is_denied() {
        let permissions =
            FixedPermissions::new(PermissionStatus::Prompt, PermissionStatus::Denied);
        let bridge = NotificationBridge::new(
            ApiClient::new("http://localhost:1/api"),
            permissions,
            FixedToken("unused"),
            None,
        );

        let result = bridge.register(1).await;
        assert!(matches!(result, Err(ClientError::PermissionDenied)));
        assert_eq!(bridge.permissions.prompts.load(Ordering::Relaxed), 1);
    }
}
