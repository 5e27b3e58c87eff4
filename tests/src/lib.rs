//! # Identity Intake Test Suite
//!
//! End-to-end tests that drive the full router against a mocked Alloy API.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs        # Mock provider + service wiring
//!     ├── submit_flow.rs    # Submission round trips and error mapping
//!     ├── rate_limiting.rs  # Per-address and global quotas
//!     └── server.rs         # Real socket, CORS, graceful shutdown
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p intake-tests
//! cargo test -p intake-tests integration::rate_limiting
//! ```
