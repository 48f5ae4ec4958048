//! A small terminal dashboard for a folder of course scripts.
//!
//! Scripts are expected to live in a two-level hierarchy under a base directory:
//! "unit" folders (e.g. `Unidad 1`) containing "topic" folders containing script
//! files. The dashboard lets you browse that tree from nested numbered menus, read a
//! script, launch it in a new terminal window and keep a list of favorites in a
//! plain text file.
//!
//! The building blocks are usable on their own:
//! - [`FavoritesStore`] persists favorite script paths.
//! - [`ProjectExplorer`] scans the unit/topic/script tree.
//! - [`ScriptRunner`] shows script sources and launches them through a list of
//!   [`launcher::LaunchStrategy`] candidates.
//! - [`Dashboard`] ties everything together into the menu loop.

pub mod config;
mod dashboard;
mod explorer;
mod favorites;
pub mod input;
mod item;
pub mod launcher;
pub mod paths;
mod runner;

pub use dashboard::Dashboard;
pub use explorer::ProjectExplorer;
pub use favorites::FavoritesStore;
pub use item::{NO_TOPIC, ScriptItem};
pub use runner::ScriptRunner;
