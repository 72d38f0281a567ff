//! Pipeline stages for screenshot-to-report generation.
//!
//! Each submodule implements exactly one step. The capture side runs on the
//! caller's thread (the overlay needs it); the document side runs on tokio's
//! blocking pool.
//!
//! ## Data Flow
//!
//! ```text
//! capture ──▶ stage ──▶ template ──▶ bind ──▶ docx ──▶ pdf
//! (xcap/file)  (temp PNG) (load/gen)  (markers) (save)   (soffice)
//! ```
//!
//! 1. [`capture`]: full screen, fixed region or window; interactive slots
//!    go through the region selector
//! 2. [`stage`]: PNG-encode each capture into an owned temp file
//! 3. [`template`]: load the `.docx` template or generate a minimal one
//! 4. [`bind`]: replace each marker with label, time stamp and picture
//! 5. [`docx`]: read/write the Word container, atomic save
//! 6. [`pdf`]: optional conversion; failures are non-fatal

pub mod bind;
pub mod capture;
pub mod docx;
pub mod pdf;
pub mod stage;
pub mod template;
