//! ChatKu client core: auth flow, message sync with offline cache,
//! message composition and image acquisition, written against injectable
//! collaborator ports.

pub mod auth;
pub mod backend;
pub mod client;
pub mod composer;
pub mod config;
pub mod events;
pub mod image;
pub mod ports;
pub mod sync;

use tracing_subscriber::{fmt, EnvFilter};

pub use auth::AuthService;
pub use client::{ChatClient, Collaborators, Route};
pub use composer::Composer;
pub use config::ClientConfig;
pub use events::{EventSink, NullSink, UiEvent};
pub use image::ImageAcquisition;
pub use sync::{SyncHandle, SyncStatus, Synchronizer};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling this more than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chatku_client=debug,chatku_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
