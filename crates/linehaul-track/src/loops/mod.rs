//! Background loops for scheduled tracking passes.

pub mod tracking_loop;

pub use tracking_loop::run_tracking_loop;
