//! Rolling alarm-code history feeding registers 501-520.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use fdc_common::consts::ALARM_HISTORY_CAP;
use fdc_common::types::AlarmKind;

/// Bounded alarm history, oldest first, capped at the register window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmHistory {
    entries: VecDeque<AlarmKind>,
}

impl AlarmHistory {
    /// Record an alarm, evicting the oldest entry past the cap.
    pub fn push(&mut self, kind: AlarmKind) {
        self.entries.push_back(kind);
        while self.entries.len() > ALARM_HISTORY_CAP {
            self.entries.pop_front();
        }
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Register codes in arrival order.
    pub fn codes(&self) -> Vec<u16> {
        self.entries.iter().map(|k| k.code()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
