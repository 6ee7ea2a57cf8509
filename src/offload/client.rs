//! Caller side of the offload channel
//!
//! The client owns both channel ends it talks through and all routing state,
//! so nothing is shared with the worker. Responses that arrive for an id other
//! than the one being awaited are parked until their caller asks for them.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::message::{CorrelationId, Operation, ResponsePayload, WorkerRequest, WorkerResponse};
use super::worker::spawn_worker;
use crate::dsp::NoiseReduction;
use crate::engine::SampleBuffer;
use crate::error::{Result, SoundcutError};

/// Handle for submitting work to a worker and collecting its replies
pub struct OffloadClient {
    requests: Option<Sender<WorkerRequest>>,
    responses: Receiver<WorkerResponse>,
    next_id: u64,
    /// Ids submitted and not yet handed back or cancelled
    pending: HashSet<CorrelationId>,
    /// Responses received ahead of their `wait`
    arrived: HashMap<CorrelationId, ResponsePayload>,
    worker: Option<JoinHandle<()>>,
}

impl OffloadClient {
    /// Start a worker thread and connect to it
    pub fn spawn() -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        let handle = spawn_worker(request_rx, response_tx)?;

        let mut client = Self::from_channels(request_tx, response_rx);
        client.worker = Some(handle);
        Ok(client)
    }

    /// Connect to a worker running elsewhere through an existing channel pair
    pub fn from_channels(
        requests: Sender<WorkerRequest>,
        responses: Receiver<WorkerResponse>,
    ) -> Self {
        Self {
            requests: Some(requests),
            responses,
            next_id: 1,
            pending: HashSet::new(),
            arrived: HashMap::new(),
            worker: None,
        }
    }

    /// Send `operation` to the worker and return its correlation id
    ///
    /// # Errors
    /// * `WorkerError` - if the worker has shut down
    pub fn submit(&mut self, operation: Operation) -> Result<CorrelationId> {
        let id = CorrelationId(self.next_id);
        self.next_id += 1;

        let tag = operation.tag();
        let sender = self.requests.as_ref().ok_or_else(disconnected)?;
        sender
            .send(WorkerRequest { id, operation })
            .map_err(|_| disconnected())?;

        self.pending.insert(id);
        debug!(%id, operation = tag, in_flight = self.pending.len(), "request submitted");
        Ok(id)
    }

    /// Block until the response for `id` arrives
    ///
    /// Responses for other ids received meanwhile are kept for their own
    /// `wait` calls. There is no built-in timeout; see [`Self::wait_timeout`].
    ///
    /// # Errors
    /// * `WorkerError` - if `id` is not pending or the worker has shut down
    pub fn wait(&mut self, id: CorrelationId) -> Result<ResponsePayload> {
        self.ensure_pending(id)?;

        loop {
            if let Some(payload) = self.take_arrived(id) {
                return Ok(payload);
            }

            match self.responses.recv() {
                Ok(response) => self.route(response),
                Err(_) => {
                    self.pending.remove(&id);
                    return Err(disconnected());
                }
            }
        }
    }

    /// Like [`Self::wait`], giving up after `timeout`
    ///
    /// Returns `Ok(None)` on timeout; the request stays pending and can be
    /// waited on again or cancelled.
    pub fn wait_timeout(
        &mut self,
        id: CorrelationId,
        timeout: Duration,
    ) -> Result<Option<ResponsePayload>> {
        self.ensure_pending(id)?;
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(payload) = self.take_arrived(id) {
                return Ok(Some(payload));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(response) => self.route(response),
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    self.pending.remove(&id);
                    return Err(disconnected());
                }
            }
        }
    }

    /// Stop tracking `id`; a response arriving later is discarded
    ///
    /// Returns `false` if `id` was not pending.
    pub fn cancel(&mut self, id: CorrelationId) -> bool {
        self.arrived.remove(&id);
        self.pending.remove(&id)
    }

    /// Number of submitted requests not yet waited on or cancelled
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn trim(
        &mut self,
        buffer: SampleBuffer,
        start_time: f64,
        end_time: f64,
    ) -> Result<SampleBuffer> {
        let id = self.submit(Operation::trim(buffer, start_time, end_time))?;
        self.wait(id)?.into_buffer()
    }

    pub fn normalize(&mut self, buffer: SampleBuffer) -> Result<SampleBuffer> {
        let id = self.submit(Operation::normalize(buffer))?;
        self.wait(id)?.into_buffer()
    }

    pub fn encode_wav(&mut self, buffer: SampleBuffer) -> Result<Vec<u8>> {
        let id = self.submit(Operation::encode_wav(buffer))?;
        self.wait(id)?.into_wav_bytes()
    }

    pub fn denoise(
        &mut self,
        buffer: SampleBuffer,
        reduction: NoiseReduction,
    ) -> Result<SampleBuffer> {
        let id = self.submit(Operation::denoise(buffer, reduction))?;
        self.wait(id)?.into_buffer()
    }

    fn ensure_pending(&self, id: CorrelationId) -> Result<()> {
        if self.pending.contains(&id) {
            Ok(())
        } else {
            Err(SoundcutError::WorkerError {
                reason: format!("no pending request with id {}", id),
            })
        }
    }

    fn take_arrived(&mut self, id: CorrelationId) -> Option<ResponsePayload> {
        let payload = self.arrived.remove(&id)?;
        self.pending.remove(&id);
        Some(payload)
    }

    fn route(&mut self, response: WorkerResponse) {
        if self.pending.contains(&response.id) {
            self.arrived.insert(response.id, response.payload);
        } else {
            warn!(id = %response.id, "discarding response for unknown or cancelled request");
        }
    }
}

impl Drop for OffloadClient {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.requests.take();

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
    }
}

fn disconnected() -> SoundcutError {
    SoundcutError::WorkerError {
        reason: "worker is not running".to_string(),
    }
}
