// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printgate-app: HTTP server for the Printgate web print gateway.
//
// Routes parse requests and render JSON or redirects; the upload/print
// pipeline lives in `services`.

pub mod flash;
pub mod guard;
pub mod qr;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
