//! Print queue forecasting for timeline views.
//!
//! Projects pending print jobs onto the printers that could run them and
//! lays the projection out as zoomable, scrollable timeline lanes with a
//! moving "now" marker. The forecast is for display only: nothing here
//! dispatches work or changes what a printer does.
//!
//! # Modules
//!
//! - **`models`**: Queue snapshot input (`QueueSnapshot`, `Peer`, `Job`,
//!   `WorkUnit`) and forecast output (`Lane`, `Event`)
//! - **`scheduler`**: First-fit greedy forecaster and load figures
//! - **`timeline`**: Time-to-pixel geometry, hour markers, duration labels
//! - **`clock`**: Clock abstraction and the periodic "now" driver
//! - **`calendar`**: Controller tying the above together for a UI
//! - **`config`**: Zoom bounds, span, cadence, fallback estimate
//! - **`validation`**: Non-fatal snapshot diagnostics
//!
//! # Logging
//!
//! Diagnostics go through the `log` facade. The crate never installs a
//! logger; the host application chooses one.

pub mod calendar;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod timeline;
pub mod validation;

pub use calendar::Calendar;
pub use config::CalendarConfig;
pub use error::ForecastError;
