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


use std::future::Future;

use log::{debug, warn};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

/// Lets a background task observe a stop request.
pub struct StopHandle {
    stop_rx: oneshot::Receiver<()>,
}

impl StopHandle {
    fn new(stop_rx: oneshot::Receiver<()>) -> Self {
        Self { stop_rx }
    }

    /// Resolves once a stop is requested or the owning [`ServiceHandle`] is dropped.
    ///
    /// Meant to be used as one branch of a `select!` loop.
    pub async fn signaled(&mut self) {
        (&mut self.stop_rx).await.unwrap_or_default();
    }
}

/// Handle of a named background task with cooperative stop.
pub struct ServiceHandle {
    name: String,
    join: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl ServiceHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Asks the task to stop without waiting for it.
    pub fn request_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            debug!("Stop requested for {}", self.name);
            let _ = tx.send(());
        }
    }

    /// Waits for the task to finish on its own.
    pub async fn join(self) -> Result<(), JoinError> {
        self.join.await
    }

    /// Asks the task to stop and waits for it.
    pub async fn stop(mut self) -> Result<(), JoinError> {
        self.request_stop();
        self.join().await
    }

    pub fn abort(self) {
        warn!("Aborting {}", self.name);
        self.join.abort();
    }
}

/// Spawns `f` on the Tokio runtime, handing it the [`StopHandle`] of the returned service.
pub fn spawn_service<Fut, Func>(name: impl Into<String>, f: Func) -> ServiceHandle
where
    Fut: Future<Output = ()> + Send + 'static,
    Func: FnOnce(StopHandle) -> Fut + Send + 'static,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(f(StopHandle::new(stop_rx)));
    ServiceHandle {
        name: name.into(),
        join,
        stop_tx: Some(stop_tx),
    }
}

/// Services started together and stopped together.
#[derive(Default)]
pub struct ServiceGroup {
    services: Vec<ServiceHandle>,
}

impl ServiceGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, service: ServiceHandle) {
        self.services.push(service);
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Requests every service to stop, then waits for all of them.
    ///
    /// Returns the first join error, after every service has been awaited.
    pub async fn stop(mut self) -> Result<(), JoinError> {
        for service in &mut self.services {
            service.request_stop();
        }
        let mut first_err = None;
        for service in self.services {
            let name = service.name.clone();
            if let Err(e) = service.join().await {
                warn!("Service {} ended abnormally: {}", name, e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
