//! End-to-end tests for mdindex
//!
//! Exercises the public API the way a sync layer and a UI would: open a
//! dataset, stream source changes into it, and read indexes back through
//! snapshots.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test end_to_end
//! cargo test --test end_to_end incremental::
//! ```

mod common;
mod incremental;
mod lifecycle;
mod snapshots;
