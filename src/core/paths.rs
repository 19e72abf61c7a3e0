//! core::paths
//!
//! Centralized path routing for the package content tree.
//!
//! # Storage Layout
//!
//! Every package lives in one flat layout inside the content repository:
//!
//! ```text
//! <package>/
//!   .gitkeep          placeholder marker (present while the package has no tags)
//!   <tag>/
//!     Dockerfile      source, written by create / add-version
//!     Makefile        generated build script, written by push
//! ```
//!
//! **Hard rule:** no code outside this module formats content-tree paths.
//! Everything goes through [`ContentLayout`] so a package or tag can never be
//! joined without its separator.
//!
//! # Example
//!
//! ```
//! use dockhand::core::paths::ContentLayout;
//! use dockhand::core::types::{PackageName, Tag};
//!
//! let name = PackageName::new("demo").unwrap();
//! let tag = Tag::new("latest").unwrap();
//!
//! assert_eq!(ContentLayout::dockerfile(&name, &tag), "demo/latest/Dockerfile");
//! assert_eq!(ContentLayout::marker(&name), "demo/.gitkeep");
//! ```

use super::types::{PackageName, Tag};

/// File name of the image source in a version directory.
pub const DOCKERFILE: &str = "Dockerfile";

/// File name of the generated build script in a version directory.
pub const BUILD_SCRIPT: &str = "Makefile";

/// File name of the placeholder marker that keeps an empty package alive.
pub const PLACEHOLDER: &str = ".gitkeep";

/// Path to the root of the content tree.
pub const ROOT: &str = "";

/// Path routing for the package content tree.
#[derive(Debug, Clone, Copy)]
pub struct ContentLayout;

impl ContentLayout {
    /// Directory holding every version of a package.
    pub fn package_dir(name: &PackageName) -> String {
        name.as_str().to_string()
    }

    /// Directory holding one tagged version of a package.
    pub fn version_dir(name: &PackageName, tag: &Tag) -> String {
        format!("{}/{}", name, tag)
    }

    /// A file inside a version directory.
    pub fn version_file(name: &PackageName, tag: &Tag, file: &str) -> String {
        format!("{}/{}/{}", name, tag, file)
    }

    /// The Dockerfile of a tagged version.
    pub fn dockerfile(name: &PackageName, tag: &Tag) -> String {
        Self::version_file(name, tag, DOCKERFILE)
    }

    /// The generated build script of a tagged version.
    pub fn build_script(name: &PackageName, tag: &Tag) -> String {
        Self::version_file(name, tag, BUILD_SCRIPT)
    }

    /// The placeholder marker of a package.
    pub fn marker(name: &PackageName) -> String {
        format!("{}/{}", name, PLACEHOLDER)
    }

    /// Whether a directory entry name is the placeholder marker.
    pub fn is_marker(entry_name: &str) -> bool {
        entry_name == PLACEHOLDER
    }
}
