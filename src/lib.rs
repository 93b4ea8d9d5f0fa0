//! `mockupsim` - phase-cycling animation engine for mockup widgets
//!
//! The engine behind the landing-page simulators: a driver that walks an
//! ordered set of phases on a fixed interval, a stage that keeps exactly
//! one phase instance mounted with its own scoped sub-timers, and the
//! widgets, config loader and CLI built on top of it.

pub mod cli;
pub mod config;
pub mod contact;
pub mod error;
pub mod observability;
pub mod phase;
pub mod timer;
pub mod widget;
