use crate::base::neterror::NetError;
use crate::network::platform::{NetworkPlatform, Transport};
use std::future::Future;
use std::sync::Arc;

/// Where a binder is in its single bind/unbind cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkBindState {
    Unbound,
    BindRequested,
    Bound,
}

/// Pins the process route to one network for the duration of one request.
///
/// `Unbound -> BindRequested -> Bound -> Unbound`. The route is released
/// whether the request succeeds, fails, or is dropped mid-flight.
pub struct NetworkBinder {
    platform: Arc<dyn NetworkPlatform>,
    transport: Transport,
    state: NetworkBindState,
}

impl NetworkBinder {
    pub fn new(platform: Arc<dyn NetworkPlatform>, transport: Transport) -> Self {
        Self {
            platform,
            transport,
            state: NetworkBindState::Unbound,
        }
    }

    pub fn state(&self) -> NetworkBindState {
        self.state
    }

    /// Acquire a network, run `request` while bound, then release.
    ///
    /// If the platform cannot bind the process, this never completes; callers
    /// put their own timeout around it.
    pub async fn run_bound<F, T>(&mut self, request: F) -> Result<T, NetError>
    where
        F: Future<Output = Result<T, NetError>>,
    {
        self.state = NetworkBindState::BindRequested;

        if !self.platform.can_bind_process_network() {
            tracing::warn!(
                transport = ?self.transport,
                "platform cannot bind process network, request stays pending"
            );
            return std::future::pending().await;
        }

        let network = self.platform.request_network(self.transport).await;
        if let Err(e) = self.platform.bind_to(&network) {
            self.state = NetworkBindState::Unbound;
            return Err(e);
        }
        tracing::info!(network = network.id, interface = ?network.interface, "process bound to network");

        self.state = NetworkBindState::Bound;
        let _release = Release {
            platform: Arc::clone(&self.platform),
            state: &mut self.state,
        };
        request.await
    }
}

/// Unbinds on drop so every exit path releases the route.
struct Release<'a> {
    platform: Arc<dyn NetworkPlatform>,
    state: &'a mut NetworkBindState,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.platform.unbind();
        *self.state = NetworkBindState::Unbound;
        tracing::info!("process network binding released");
    }
}
