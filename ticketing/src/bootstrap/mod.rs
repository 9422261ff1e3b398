//! Bootstrap components for application initialization.
//!
//! # Modules
//!
//! - **`resources`**: Infrastructure setup (connection pool, clock)
//!
//! # Example
//!
//! ```rust,ignore
//! let resources = ResourceManager::from_config(&config).await?;
//! let services = TicketingServices::from_resources(&resources);
//! ```

pub mod resources;

pub use resources::ResourceManager;
