//! Full-test state machine and report history.
//!
//! A full test exercises every damper closed → open → closed to confirm
//! actuator health. The sequence is refused outright while any alarm is
//! active and always reaches a terminal outcome in one logical step — there
//! is no cancellation. Terminal states fall back to `Idle` immediately in
//! the accelerated model; the report history keeps the outcomes.

use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use fdc_common::consts::TEST_REPORT_CAP;
use fdc_common::types::TestStatus;

// Step descriptions shared between reports and zone logs.
pub const STEP_CLOSED: &str = "Damper closed";
pub const STEP_OPENED: &str = "Damper opened";
pub const STEP_CLOSED_AGAIN: &str = "Damper closed again";
pub const STEP_PASSED: &str = "Test passed";
pub const REFUSAL_REASON: &str = "active alarms detected";
pub const STEP_REFUSED: &str = "Failed: Active alarms detected";
pub const STEP_TIME_EXCEEDED: &str = "Failed: Test time exceeded";

/// Sequencer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TestState {
    /// No test in progress.
    Idle = 0,
    /// Full test choreography executing.
    Running = 1,
    /// Last test passed (transient).
    Passed = 2,
    /// Last test failed (transient).
    Failed = 3,
}

impl Default for TestState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Outcome record of one full test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    /// Simulated-clock instant the test ran.
    pub at: NaiveDateTime,
    /// Terminal outcome.
    pub status: TestStatus,
    /// Ordered step descriptions per zone.
    pub zones: BTreeMap<u8, Vec<String>>,
}

impl TestReport {
    /// Summary line appended to a zone log.
    pub fn summary_line(&self, zone: u8) -> String {
        let steps = self
            .zones
            .get(&zone)
            .map(|s| s.join(", "))
            .unwrap_or_default();
        format!("Test Report - Status: {}, Zone {zone}: {steps}", self.status)
    }
}

/// Full-test sequencer: guards entry, tracks lifecycle state, owns the
/// bounded report history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSequencer {
    state: TestState,
    reports: VecDeque<TestReport>,
}

impl TestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[inline]
    pub const fn state(&self) -> TestState {
        self.state
    }

    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, TestState::Running)
    }

    /// Attempt to start the sequence.
    ///
    /// Refused (state stays `Idle`) while any alarm is active; the caller
    /// records the refusal report via [`record`].
    pub fn begin(&mut self, any_alarm: bool) -> Result<(), &'static str> {
        if any_alarm {
            return Err(REFUSAL_REASON);
        }
        self.state = TestState::Running;
        Ok(())
    }

    /// Record a terminal outcome and return to `Idle`.
    ///
    /// Also used for pre-guard refusals, which never left `Idle`. The
    /// terminal state is transient: the sequence completes in one logical
    /// step, so the machine is immediately ready again.
    pub fn record(&mut self, report: TestReport) {
        self.state = match report.status {
            TestStatus::Passed => TestState::Passed,
            TestStatus::Failed => TestState::Failed,
        };
        self.reports.push_back(report);
        while self.reports.len() > TEST_REPORT_CAP {
            self.reports.pop_front();
        }
        self.acknowledge();
    }

    /// Collapse a terminal state back to `Idle`.
    pub fn acknowledge(&mut self) {
        self.state = TestState::Idle;
    }

    /// Report history, oldest first.
    pub fn reports(&self) -> impl Iterator<Item = &TestReport> {
        self.reports.iter()
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    /// Status of the most recent test, if any ran.
    pub fn last_status(&self) -> Option<TestStatus> {
        self.reports.back().map(|r| r.status)
    }
}
