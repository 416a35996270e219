// ABOUTME: Pure data types with no cross-crate dependencies
// ABOUTME: Foundation layer for all other cartograph crates

pub mod project_state;
pub mod recent_projects;

// Re-export commonly used types
pub use project_state::ProjectState;
pub use recent_projects::{RECENT_PROJECTS_CAPACITY, RecentProjects};
