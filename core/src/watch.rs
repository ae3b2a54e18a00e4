// Copyright 2025 HEM Sp. z o.o.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::select;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::collaborator::DiscoveryEvent;
use crate::device::Device;
use crate::engine::{DeviceSnapshot, EngineEvent, RouteEngine};
use crate::service::{spawn_service, ServiceHandle};

/// Receives engine notifications on the listener task.
#[async_trait]
pub trait EngineEventListener: Send + Sync + 'static {
    async fn on_device_list_updated(&self, snapshot: Arc<DeviceSnapshot>);

    async fn on_connected_device_changed(&self, device: Option<Device>);
}

/// Feeds discovery notifications into the engine until stopped or the channel closes.
///
/// When the receiver lags behind, the engine is resynchronized instead of replaying.
pub fn run_discovery_watch(
    engine: Arc<RouteEngine>,
    mut discovery_rx: broadcast::Receiver<DiscoveryEvent>,
) -> ServiceHandle {
    spawn_service("discovery-watch", move |mut stop| async move {
        loop {
            select! {
                biased;
                _ = stop.signaled() => {
                    info!("Discovery watch for {} stopped", engine.app_id());
                    break;
                }
                recv_res = discovery_rx.recv() => {
                    let result = match recv_res {
                        Ok(event) => {
                            debug!("Discovery event {:?}", event);
                            engine.on_discovery_event(event)
                        }
                        Err(RecvError::Lagged(n)) => {
                            warn!("DiscoveryEvent lagged by {} messages; resynchronizing", n);
                            engine.resync()
                        }
                        Err(RecvError::Closed) => {
                            info!("DiscoveryEvent channel closed; stopping discovery watch");
                            break;
                        }
                    };
                    if let Err(e) = result {
                        warn!("Device list rebuild failed: {}", e);
                    }
                }
            }
        }
    })
}

/// Forwards engine events to `listener` until stopped or the engine is dropped.
pub fn run_engine_listener<L: EngineEventListener>(
    mut event_rx: broadcast::Receiver<EngineEvent>,
    listener: Arc<L>,
) -> ServiceHandle {
    spawn_service("engine-listener", move |mut stop| async move {
        loop {
            select! {
                biased;
                _ = stop.signaled() => break,
                recv_res = event_rx.recv() => {
                    match recv_res {
                        Ok(EngineEvent::DeviceListUpdated(snapshot)) => {
                            listener.on_device_list_updated(snapshot).await;
                        }
                        Ok(EngineEvent::ConnectedDeviceChanged(device)) => {
                            listener.on_connected_device_changed(device).await;
                        }
                        Err(RecvError::Lagged(n)) => {
                            warn!("EngineEvent lagged by {} messages; catching up", n);
                        }
                        Err(RecvError::Closed) => {
                            info!("EngineEvent channel closed; stopping listener");
                            break;
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::definitions::{Capabilities, RouteType};
    use crate::in_memory::{InMemoryCollaborator, InMemoryPeerCache};
    use crate::route::{Route, RoutingSession};
    use std::sync::Mutex;
    use std::time::Duration;

    const APP: &str = "com.example.player";

    #[derive(Default)]
    struct RecordingListener {
        lists: Mutex<Vec<Vec<String>>>,
        connected: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl EngineEventListener for RecordingListener {
        async fn on_device_list_updated(&self, snapshot: Arc<DeviceSnapshot>) {
            let ids = snapshot.devices.devices().iter().map(|d| d.id.clone()).collect();
            self.lists.lock().unwrap().push(ids);
        }

        async fn on_connected_device_changed(&self, device: Option<Device>) {
            self.connected.lock().unwrap().push(device.map(|d| d.id));
        }
    }

    fn setup() -> (Arc<InMemoryCollaborator>, Arc<RouteEngine>) {
        let system = RoutingSession::new("system", true).with_selected(["speaker"]);
        let collaborator = Arc::new(InMemoryCollaborator::new(Capabilities::all(), system));
        collaborator.add_package(APP);
        collaborator.set_routes(vec![
            Route::new("speaker", "Phone speaker", RouteType::BuiltinSpeaker).system(),
        ]);
        let engine = RouteEngine::new(
            EngineConfig::new().with_app_id(APP),
            collaborator.clone(),
            Arc::new(InMemoryPeerCache::new()),
        )
        .unwrap();
        (collaborator, Arc::new(engine))
    }

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn discovery_changes_rebuild_the_list() {
        let (collaborator, engine) = setup();
        let watch = run_discovery_watch(engine.clone(), collaborator.subscribe());
        engine.start_scan().unwrap();
        assert_eq!(engine.devices().len(), 1);

        collaborator.set_routes(vec![
            Route::new("speaker", "Phone speaker", RouteType::BuiltinSpeaker).system(),
            Route::new("tv", "TV", RouteType::RemoteTv),
        ]);
        collaborator.set_transferable(APP, ["tv"]);

        wait_until(|| engine.devices().len() == 2).await;
        watch.stop().await.unwrap();
    }

    #[tokio::test]
    async fn listener_receives_engine_events() {
        let (collaborator, engine) = setup();
        let listener = Arc::new(RecordingListener::default());
        let listening = run_engine_listener(engine.subscribe(), listener.clone());
        let watch = run_discovery_watch(engine.clone(), collaborator.subscribe());

        engine.start_scan().unwrap();
        collaborator.set_system_session(RoutingSession::new("system", true));

        wait_until(|| listener.connected.lock().unwrap().len() == 2).await;
        assert_eq!(
            *listener.connected.lock().unwrap(),
            vec![Some("speaker".to_string()), None]
        );
        assert_eq!(listener.lists.lock().unwrap()[0], vec!["speaker".to_string()]);

        watch.stop().await.unwrap();
        listening.stop().await.unwrap();
    }

    #[tokio::test]
    async fn watch_ends_when_discovery_closes() {
        let (_collaborator, engine) = setup();
        let (tx, rx) = broadcast::channel::<DiscoveryEvent>(4);
        let watch = run_discovery_watch(engine, rx);
        drop(tx);
        wait_until(|| watch.is_finished()).await;
        watch.join().await.unwrap();
    }
}
