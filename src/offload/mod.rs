//! Offload Protocol
//!
//! Moves editor, codec and denoise work off the caller's thread. The caller
//! submits [`WorkerRequest`]s tagged with a [`CorrelationId`]; the worker
//! answers each with exactly one [`WorkerResponse`] carrying the same id.
//! Responses may come back in any order, and the [`OffloadClient`] matches
//! them purely by id.
//!
//! Transport is a pair of `std::sync::mpsc` channels. Sample data is moved
//! into the request, so nothing is shared between the two sides.

pub mod client;
pub mod message;
pub mod worker;

pub use client::OffloadClient;
pub use message::{CorrelationId, Operation, ResponsePayload, WorkerRequest, WorkerResponse};
pub use worker::{handle_json_request, handle_request, run_worker_loop, spawn_worker};
