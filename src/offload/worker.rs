//! Worker side of the offload channel
//!
//! Each request is handled on its own; any failure inside an operation,
//! including a panic, is turned into an `Error` response so the loop keeps
//! serving later requests.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::message::{Operation, ResponsePayload, WorkerRequest, WorkerResponse};
use crate::dsp::reduce_noise;
use crate::engine::{encode_wav, normalize, trim, SampleBuffer};
use crate::error::Result;

/// Name given to threads started by [`spawn_worker`]
pub const WORKER_THREAD_NAME: &str = "soundcut-worker";

/// Run one request to completion
pub fn handle_request(request: WorkerRequest) -> WorkerResponse {
    let WorkerRequest { id, operation } = request;
    let tag = operation.tag();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(operation)));

    let payload = match outcome {
        Ok(Ok(payload)) => payload,
        Ok(Err(e)) => {
            debug!(%id, operation = tag, error = %e, "request failed");
            ResponsePayload::Error {
                message: e.to_string(),
            }
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(%id, operation = tag, %message, "request panicked");
            ResponsePayload::Error {
                message: format!("internal error: {}", message),
            }
        }
    };

    WorkerResponse { id, payload }
}

/// Run one JSON-encoded request and return the JSON-encoded reply
///
/// Failures inside the operation come back as an `error` reply. Only text
/// that does not parse as a request is an `Err`, since it carries no id to
/// answer.
pub fn handle_json_request(text: &str) -> Result<String> {
    let request = WorkerRequest::from_json(text)?;
    handle_request(request).to_json()
}

fn execute(operation: Operation) -> Result<ResponsePayload> {
    match operation {
        Operation::Trim {
            channels,
            sample_rate,
            start_time,
            end_time,
        } => {
            let buffer = SampleBuffer::from_channels(channels, sample_rate)?;
            trim(&buffer, start_time, end_time).map(ResponsePayload::from_buffer)
        }
        Operation::Normalize {
            channels,
            sample_rate,
        } => {
            let buffer = SampleBuffer::from_channels(channels, sample_rate)?;
            normalize(&buffer).map(ResponsePayload::from_buffer)
        }
        Operation::EncodeWav {
            channels,
            sample_rate,
        } => {
            let buffer = SampleBuffer::from_channels(channels, sample_rate)?;
            let bytes = encode_wav(&buffer)?;
            Ok(ResponsePayload::WavResult { bytes })
        }
        Operation::Denoise {
            channels,
            sample_rate,
            reduction,
        } => {
            let buffer = SampleBuffer::from_channels(channels, sample_rate)?;
            reduce_noise(&buffer, &reduction).map(ResponsePayload::from_buffer)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Serve requests until the request channel closes or the client goes away
pub fn run_worker_loop(requests: Receiver<WorkerRequest>, responses: Sender<WorkerResponse>) {
    debug!("worker loop started");

    for request in requests {
        let response = handle_request(request);
        if responses.send(response).is_err() {
            debug!("response channel closed, stopping worker");
            return;
        }
    }

    debug!("request channel closed, stopping worker");
}

/// Start [`run_worker_loop`] on a dedicated named thread
pub fn spawn_worker(
    requests: Receiver<WorkerRequest>,
    responses: Sender<WorkerResponse>,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run_worker_loop(requests, responses))?;
    Ok(handle)
}
