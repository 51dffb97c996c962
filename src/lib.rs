//! Appointment scheduling and availability engine for service businesses.
//!
//! The engine turns a tenant's working calendar into bookable slots, detects
//! interval conflicts against existing appointments, enforces per-slot
//! capacity, and gates every write so no two commits land on an over-booked
//! slot. Storage and directory lookups are ports; see [`engine::store`].

pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod policy;

pub use engine::{AppointmentStore, Directory, Engine, EngineError};
pub use model::{Appointment, AppointmentPatch, AppointmentStatus, Ms, SlotBlock, SlotInfo, Span};
pub use policy::{CalendarPolicy, DayHours, WallTime};
