use std::{collections::HashMap, future::Future};

use log::debug;

/// The outcome of a push-delivery attempt. Failure is a value, not an error: the notifier
/// boundary never throws into the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    Failed(String),
}

impl DeliveryResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryResult::Delivered)
    }
}

/// External push-delivery capability.
///
/// Implementations wrap whatever transport the deployment uses (OneSignal, FCM, a test spy).
/// They are expected to enforce their own timeout and return a bounded-time result; retry
/// policy, if any, also belongs to the implementation, not to the engine.
pub trait PushNotifier: Clone + Send + Sync + 'static {
    /// Attempts delivery of one message to one device token.
    fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> impl Future<Output = DeliveryResult> + Send;
}

/// A notifier that delivers nowhere. Useful for tests and deployments without a push
/// transport configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl PushNotifier for NullNotifier {
    async fn send(&self, token: &str, title: &str, _body: &str, _data: &HashMap<String, String>) -> DeliveryResult {
        debug!("🔕️ Push delivery skipped (null notifier). token={token}, title={title}");
        DeliveryResult::Delivered
    }
}
