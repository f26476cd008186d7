//! Desktop integration for development builds.

pub mod entry;

pub use entry::{install, install_path, render, DesktopEntryError};
