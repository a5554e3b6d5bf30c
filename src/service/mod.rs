//! Service layer: business logic orchestration.
//!
//! [`EventService`] runs appends and listings against the current
//! resource bundle; [`ReloadService`] rebuilds and swaps that bundle.

pub mod event_service;
pub mod reload_service;

pub use event_service::{EventPage, EventService, PageRequest};
pub use reload_service::ReloadService;
