//! nixdc-lib: Profile synchronization engine for nix-devcontainer
//!
//! This crate captures Nix flake dev shells into sourceable profile scripts:
//! - `Flake`: a named directory holding a `flake.nix`
//! - `Registry`: versioned snapshots of the discovered flakes
//! - `ProfileStore`: reads and atomically replaces `/etc/profile.d` scripts
//! - `TaskHub`: runs units of work and correlates their completions
//! - `Coordinator`: discovery, capture, compare, persist, report

pub mod capture;
pub mod config;
pub mod consts;
pub mod flake;
pub mod host;
pub mod platform;
pub mod profile;
pub mod sync;
pub mod task;
