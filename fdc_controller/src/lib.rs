//! # FDC Controller Core
//!
//! State machine of a multi-zone fire/smoke damper controller: zone and
//! alarm bookkeeping, damper-position policy, derived LED/relay/analog
//! outputs, full-test sequencing with pass/fail reporting, auto-test
//! scheduling against a simulated clock, Modbus/BACnet register mirrors and
//! whole-state save/restore.
//!
//! ## Architecture
//!
//! 1. **[`zone`]** — per-zone alarm flags, damper position, bounded log
//! 2. **[`position`]** — pure damper-position policy (mode × invert)
//! 3. **[`outputs`]** — pure LED/relay/analog derivation
//! 4. **[`selftest`]** — full-test state machine and report history
//! 5. **[`schedule`]** — auto-test scheduling
//! 6. **[`registers`]** — Modbus/BACnet mirrors of controller state
//! 7. **[`persist`]** — JSON save/restore of the whole state
//! 8. **[`controller`]** — composition root owning all of the above
//! 9. **[`command`]** — closed command vocabulary for the line front end
//!
//! The core is single-threaded and synchronous: every operation runs to
//! completion before the next is accepted, no operation blocks or sleeps,
//! and elapsed time exists only as the simulated clock value. Callers that
//! expose a controller to several writers must serialize access themselves.

pub mod clock;
pub mod command;
pub mod controller;
pub mod history;
pub mod outputs;
pub mod persist;
pub mod position;
pub mod registers;
pub mod schedule;
pub mod selftest;
pub mod zone;
