//! Job dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/count (validated)
//!     → temp.rs (persist payload to tmp_<job-id>.txt)
//!     → job.rs (spawn worker, collect stdout, deliver via Registry)
//!     → input file removed when the actor ends
//! ```

pub mod job;
pub mod temp;

pub use job::{Job, JobDispatch, JobError};
pub use temp::TempInput;
