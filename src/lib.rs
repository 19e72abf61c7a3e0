//! Dockhand - container-image packages kept in a Git content tree
//!
//! Dockhand manages container-image "packages" whose source (Dockerfiles and
//! generated build scripts) lives in an ordinary Git repository, reconciles
//! that tree with the container registry's published versions, and drives
//! the local build/tag/push workflow. It also distributes organization
//! secrets as sealed boxes and regenerates a local secrets file from them.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, builds backends)
//! - [`publish`] - Create / push / delete package workflows and inventory
//! - [`sync`] - Secret upload and local artifact regeneration
//! - [`content`] - Hash-aware CRUD over the remote content tree
//! - [`catalog`] - Registry versions and the tag index
//! - [`templates`] - Build script, manifest and secrets artifact rendering
//! - [`exec`] - Scoped build workspaces and target execution
//! - [`seal`] - Sealed-box encryption
//! - [`secrets`] - Local secret mirror and remote secret registry
//! - [`forge`] - Shared GitHub REST client and remote error taxonomy
//! - [`core`] - Validated types, content layout, configuration
//! - [`ui`] - Output helpers
//!
//! # Correctness Invariants
//!
//! 1. Every content mutation carries the hash it expects to replace
//! 2. Push workspaces are released on every exit path
//! 3. A package with no versions keeps a placeholder marker
//! 4. Secret values never reach logs or error messages

pub mod catalog;
pub mod cli;
pub mod content;
pub mod core;
pub mod exec;
pub mod forge;
pub mod publish;
pub mod seal;
pub mod secrets;
pub mod sync;
pub mod templates;
pub mod ui;
