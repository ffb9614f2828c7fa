pub mod leader;
pub mod scan;
pub mod serve;

// Re-export command functions for convenience
pub use leader::leader;
pub use scan::scan;
pub use serve::serve;
