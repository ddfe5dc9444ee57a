// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot wake-up event shared between the transaction handler and
/// the data-ready service.
///
/// Carries no payload; only "has fired since the last wait" is remembered.
/// Raising while already pending has no additional effect.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    fired: Arc<AtomicBool>,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.fired.store(true, Ordering::SeqCst);
    }

    /// Take the pending firing, if any.
    pub fn consume(&self) -> bool {
        self.fired.swap(false, Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}
