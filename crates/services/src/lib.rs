#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod practice_service;
pub mod progress_service;

pub use gym_core::{Clock, PracticeCalendar};

pub use backend::{BackendClient, BackendConfig, SessionBatch, SyncReport, sync_sessions};
pub use error::{BackendError, PracticeError, ProgressError};
pub use practice_service::{PracticeService, SessionWithQuestion};
pub use progress_service::{DEFAULT_WEEKLY_GOAL, DashboardReport, ProgressService};
