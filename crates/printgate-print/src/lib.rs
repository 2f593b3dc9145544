// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printgate Print: talks to the CUPS print server (IPP for queries and
// cancellation, the `lp` client for submission), maps job states for
// display, and builds the queue view.

pub mod backend;
pub mod ipp_client;
pub mod lp_client;
pub mod queue;
pub mod status;

pub use backend::{JobScope, PrintBackend};
pub use ipp_client::CupsClient;
pub use lp_client::LpSubmitter;
pub use queue::{JobEntry, QueueView};
pub use status::{JobBucket, JobStatus, map_state};
