//! External tools behind capability traits.
//!
//! | Operation | Tool |
//! |---|---|
//! | **Generate docs** | `dil ddoc` |
//! | **Compile** | `dmd`, or `wine dmd` for Windows binaries |
//! | **Archive** | `tar`, `zip`, `7zr` |
//! | **Render PDF** | HTML → PDF helper |
//! | **Checkout** | `git` |
//! | **PATH registration** | `reg` |
//!
//! The module is split into:
//! - **Parameters**: what to run, with argument vectors (unit testable)
//! - **Backend**: the capability traits + `MockTools` for tests
//! - **System**: [`SystemTools`], blocking subprocess calls

pub mod backend;
mod params;
pub mod system;

pub use backend::{
    Archiver, Compiler, DocGenerator, DocumentRenderer, Locator, Registry, SourceControl,
    ToolError, Tools,
};
pub use params::{ArchiveFormat, ArchiveParams, BuildParams, BuildProfile, DocGenParams, RenderParams};
pub use system::SystemTools;
