//! Files written after a session closes.
//!
//! # Submodules
//!
//! - [`transcript`]: the closed [`JobSession`](crate::models::JobSession) as JSON
//!
//! # Output Structure
//!
//! ```text
//! transcript_dir/
//! └── 2025-05-06/
//!     ├── 65f1c0ffee_143000.json
//!     └── 65f1c0ffee_181512.json
//! ```

pub mod transcript;
