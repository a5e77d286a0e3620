/// Application name, used for the profile prefix and install layout.
pub const APP_NAME: &str = "nix-devcontainer";

/// File that marks a directory as a flake.
pub const FLAKE_FILE: &str = "flake.nix";

/// Name of the always-present bundled flake.
pub const DEFAULT_FLAKE_NAME: &str = "default";

/// Template directory holding the bundled default flake.
pub const DEFAULT_FLAKE_TEMPLATE: &str = "flake";

/// Default directory for generated profile scripts.
pub const PROFILE_DIR: &str = "/etc/profile.d";

/// Extension of generated profile scripts.
pub const PROFILE_EXT: &str = "sh";

/// Profile installed by Nix itself. Never written here.
pub const NIX_PROFILE_FILE: &str = "nix.sh";

/// Shell tracing artifact stripped from every captured profile.
pub const RESERVED_TOKEN: &str = "LINENO";

/// Title prefix shown on every capture unit of work.
pub const TASK_LABEL_PREFIX: &str = "DevShell";
