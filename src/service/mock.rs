//! Mock glasses service for testing
//!
//! Runs the five service calls in-process, with no backend and no glasses. It provides:
//! - A configurable list of discoverable devices
//! - Controllable one-shot failure injection per call
//! - Simulated latency (async-safe, `tokio::time::sleep`)
//! - A call log and a record of displayed frames for test verification
//!
//! Error messages match the ones the real backend sends, so UI code sees the same text.

use super::{GlassesService, ServiceError};
use crate::directory::Device;
use crate::frame::{EncodedFrame, FrameMatrix};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

/// Bytes per BLE write in the default encoded output.
const PACKET_LEN: usize = 20;

/// Calls recorded by [`MockGlassesService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    Discover,
    Connect,
    Disconnect,
    Encode,
    Display,
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<Device>,
    encoded: Option<EncodedFrame>,
    connected: Option<Device>,
    pending_failures: HashMap<MockCall, String>,
    call_log: Vec<MockCall>,
    displayed: Vec<EncodedFrame>,
}

/// In-process [`GlassesService`].
///
/// # Example
///
/// ```
/// use chemion_designer::directory::Device;
/// use chemion_designer::service::{GlassesService, MockGlassesService};
///
/// # tokio_test::block_on(async {
/// let service = MockGlassesService::new()
///     .with_devices(vec![Device::new("CHEMION", "01:02:03:04:05:06")]);
/// let devices = service.discover().await.unwrap();
/// service.connect(&devices[0]).await.unwrap();
/// assert!(service.connected_device().is_some());
/// # })
/// ```
#[derive(Debug, Default)]
pub struct MockGlassesService {
    state: Mutex<MockState>,
    latency: Duration,
}

impl MockGlassesService {
    /// Mock with no devices and no latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices returned by `discover`.
    pub fn with_devices(self, devices: Vec<Device>) -> Self {
        self.lock().devices = devices;
        self
    }

    /// Fixed output for `encode`, instead of the default packetized frame.
    pub fn with_encoded(self, encoded: serde_json::Value) -> Self {
        self.lock().encoded = Some(EncodedFrame::new(encoded));
        self
    }

    /// Delay applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replace the discoverable devices.
    pub fn set_devices(&self, devices: Vec<Device>) {
        self.lock().devices = devices;
    }

    /// Make the next `call` fail with `message`.
    pub fn fail_next(&self, call: MockCall, message: impl Into<String>) {
        self.lock().pending_failures.insert(call, message.into());
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().call_log.clone()
    }

    /// Number of times `call` was received.
    pub fn call_count(&self, call: MockCall) -> usize {
        self.lock().call_log.iter().filter(|c| **c == call).count()
    }

    /// Forget recorded calls and displayed frames.
    pub fn clear_calls(&self) {
        let mut state = self.lock();
        state.call_log.clear();
        state.displayed.clear();
    }

    /// Frames passed to `display`, in order.
    pub fn displayed(&self) -> Vec<EncodedFrame> {
        self.lock().displayed.clone()
    }

    /// Device the mock considers itself connected to.
    pub fn connected_device(&self) -> Option<Device> {
        self.lock().connected.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the call, wait out the latency, then consume any injected failure.
    async fn enter(&self, call: MockCall) -> Result<(), ServiceError> {
        self.lock().call_log.push(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.lock().pending_failures.remove(&call) {
            Some(message) => Err(ServiceError::new(message)),
            None => Ok(()),
        }
    }
}

/// Flatten the matrix into `PACKET_LEN`-sized chunks, standing in for the real encoder.
fn packetize(matrix: &FrameMatrix) -> EncodedFrame {
    let flat: Vec<u8> = matrix.iter().flatten().copied().collect();
    let packets: Vec<Vec<u8>> = flat.chunks(PACKET_LEN).map(<[u8]>::to_vec).collect();
    EncodedFrame::new(serde_json::json!(packets))
}

#[async_trait]
impl GlassesService for MockGlassesService {
    async fn discover(&self) -> Result<Vec<Device>, ServiceError> {
        self.enter(MockCall::Discover).await?;
        Ok(self.lock().devices.clone())
    }

    async fn connect(&self, device: &Device) -> Result<(), ServiceError> {
        self.enter(MockCall::Connect).await?;

        let mut state = self.lock();
        if !state.devices.iter().any(|d| d.address == device.address) {
            return Err(ServiceError::new("Couldn't get peripheral"));
        }
        state.connected = Some(device.clone());
        info!(device = %device, "Mock glasses connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ServiceError> {
        self.enter(MockCall::Disconnect).await?;

        let mut state = self.lock();
        match state.connected.take() {
            Some(device) => {
                info!(device = %device, "Mock glasses disconnected");
                Ok(())
            }
            None => Err(ServiceError::new("Couldn't get stored address")),
        }
    }

    async fn encode(&self, matrix: &FrameMatrix) -> Result<EncodedFrame, ServiceError> {
        self.enter(MockCall::Encode).await?;

        if matrix.iter().flatten().any(|&v| v > 3) {
            return Err(ServiceError::new("Wrong value in frame"));
        }
        let state = self.lock();
        Ok(state.encoded.clone().unwrap_or_else(|| packetize(matrix)))
    }

    async fn display(&self, frame: &EncodedFrame) -> Result<(), ServiceError> {
        self.enter(MockCall::Display).await?;

        let mut state = self.lock();
        if state.connected.is_none() {
            return Err(ServiceError::new("Please connect to a device first"));
        }
        state.displayed.push(frame.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Mock glasses service (latency: {}ms)", self.latency.as_millis())
    }
}
