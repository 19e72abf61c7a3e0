//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dockhand - container-image packages kept in a Git content tree
#[derive(Parser, Debug)]
#[command(name = "dockhand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage container-image packages
    #[command(
        name = "package",
        long_about = "Manage container-image packages.\n\n\
            A package is a top-level directory of the content repository. Each tag \
            is a subdirectory holding a Dockerfile and, once pushed, the generated \
            Makefile. Published versions live in the container registry.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Start a package and publish its first image
    dockhand package create demo latest --file ./Dockerfile
    dockhand package push demo latest --version-key sha123

    # Inspect what is published
    dockhand package show demo
    dockhand package cat demo latest Makefile

    # Retire one version, then the whole package
    dockhand package delete-version demo latest --id 123456
    dockhand package delete demo"
    )]
    Package {
        #[command(subcommand)]
        action: PackageAction,
    },

    /// Manage organization secrets
    #[command(
        name = "secret",
        long_about = "Manage organization secrets.\n\n\
            Values are sealed against the organization's current public key before \
            upload; the remote store never returns them. A plaintext copy is kept \
            in the local mirror so the secrets artifact can be regenerated.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Create or replace a secret (value read from stdin when omitted)
    echo -n 's3cret' | dockhand secret set API_KEY

    # See what exists remotely
    dockhand secret list"
    )]
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Regenerate the local secrets artifact
    #[command(
        name = "sync",
        long_about = "Regenerate the local secrets artifact.\n\n\
            Lists the organization's secrets, reads each value from the local \
            mirror, collapses it onto one line, and rewrites the artifact file \
            (by default ~/.config/act/.secrets). Secrets missing from the mirror \
            are skipped with a warning."
    )]
    Sync,

    /// Seal a value against a public key
    #[command(
        name = "seal",
        after_help = "\
EXAMPLES:
    dockhand seal --key 2Sg8iYjAxxmI2LvUXpJjkYrMxURPc8r+dB7TJyvv1234= 'value'
    printf 'value' | dockhand seal --key <BASE64_KEY>"
    )]
    Seal {
        /// Recipient public key (base64, 32 bytes)
        #[arg(long)]
        key: String,

        /// Value to seal (read from stdin if omitted)
        value: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    dockhand completion bash > ~/.local/share/bash-completion/completions/dockhand

    # Zsh
    dockhand completion zsh > ~/.zfunc/_dockhand

    # Fish
    dockhand completion fish > ~/.config/fish/completions/dockhand.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Package subcommands.
#[derive(Subcommand, Debug)]
pub enum PackageAction {
    /// Create an empty package (placeholder marker only)
    Init {
        /// Package name
        name: String,
    },

    /// Create a package version from a Dockerfile
    Create {
        /// Package name
        name: String,
        /// Tag
        tag: String,
        /// Dockerfile to upload ('-' for stdin)
        #[arg(long, short, default_value = "Dockerfile")]
        file: PathBuf,
    },

    /// Add a tag to an existing package, with provenance labels
    AddVersion {
        /// Package name
        name: String,
        /// Tag
        tag: String,
        /// Dockerfile to upload ('-' for stdin)
        #[arg(long, short, default_value = "Dockerfile")]
        file: PathBuf,
    },

    /// Build, tag and push an image from its stored Dockerfile
    Push {
        /// Package name
        name: String,
        /// Tag
        tag: String,
        /// Caller-chosen version key isolating the build workspace
        #[arg(long, value_name = "KEY")]
        version_key: String,
        /// Give up after this many seconds (the workspace is still removed)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Delete every version directory of a package
    Delete {
        /// Package name
        name: String,
    },

    /// Delete one published version and its directory
    DeleteVersion {
        /// Package name
        name: String,
        /// Tag
        tag: String,
        /// Registry version id
        #[arg(long)]
        id: u64,
    },

    /// List packages
    List,

    /// Show a package's tags, files and registry versions
    Show {
        /// Package name
        name: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// List registry tags of a package
    Tags {
        /// Package name
        name: String,
    },

    /// Print a file of a package version
    Cat {
        /// Package name
        name: String,
        /// Tag
        tag: String,
        /// File name
        #[arg(default_value = "Dockerfile")]
        file: String,
    },
}

/// Secret subcommands.
#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Create or replace a secret
    Set {
        /// Secret name
        name: String,
        /// Value (read from stdin if omitted)
        value: Option<String>,
    },

    /// Delete a secret remotely and from the mirror
    Delete {
        /// Secret name
        name: String,
    },

    /// List remote secrets (names and visibility)
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the mirrored value of a secret
    Get {
        /// Secret name
        name: String,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
