// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::clock::SimTime;
use crate::peripherals::registers::RegisterFile;
use crate::peripherals::trigger::Trigger;
use std::sync::{Arc, Mutex};

/// Which wait the service is currently suspended at. The two points stay
/// distinct so a virtual clock can be advanced across them deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServicePhase {
    /// Suspended on the trigger signal.
    AwaitingTrigger,
    /// Trigger consumed; suspended until the service delay elapses.
    Delaying { wake_at: SimTime },
}

/// Back half of the data-ready peripheral: the interrupt generator.
///
/// Logically a perpetual loop — wait for the trigger, wait the service
/// delay, latch a fresh sample together with the ready bit, repeat. The
/// loop is driven by [`poll`] instead of a kernel thread; each call runs
/// it up to `now` and parks it at the next suspension point.
///
/// [`poll`]: DataReadyService::poll
#[derive(Debug)]
pub struct DataReadyService {
    regs: Arc<Mutex<RegisterFile>>,
    trigger: Trigger,
    delay: SimTime,
    phase: ServicePhase,
    prng: XorShift32,
    cycles_completed: u64,
}

impl DataReadyService {
    pub(crate) fn new(
        regs: Arc<Mutex<RegisterFile>>,
        trigger: Trigger,
        delay: SimTime,
        seed: u32,
    ) -> Self {
        Self {
            regs,
            trigger,
            delay,
            phase: ServicePhase::AwaitingTrigger,
            prng: XorShift32::new(seed),
            cycles_completed: 0,
        }
    }

    /// Advance the service loop to `now`.
    ///
    /// Returns the wake deadline while a cycle is in flight, `None` while
    /// parked on the trigger. A trigger raised during the delay is consumed
    /// on the next pass through the wait point, scheduling one further
    /// cycle; raises are never queued beyond that single pending slot.
    pub fn poll(&mut self, now: SimTime) -> Option<SimTime> {
        loop {
            match self.phase {
                ServicePhase::AwaitingTrigger => {
                    if !self.trigger.consume() {
                        return None;
                    }
                    self.phase = ServicePhase::Delaying {
                        wake_at: now + self.delay,
                    };
                }
                ServicePhase::Delaying { wake_at } => {
                    if now < wake_at {
                        return Some(wake_at);
                    }
                    self.produce_sample();
                    self.phase = ServicePhase::AwaitingTrigger;
                }
            }
        }
    }

    fn produce_sample(&mut self) {
        // 16-bit samples, same width the modeled device produces.
        let sample = self.prng.next() & 0xFFFF;
        let Ok(mut regs) = self.regs.lock() else {
            return;
        };
        regs.latch_sample(sample);
        drop(regs);

        self.cycles_completed += 1;
        tracing::info!(
            data = format_args!("{sample:#x}"),
            cycle = self.cycles_completed,
            "Interrupt generated"
        );
    }

    /// Completed trigger-to-ready cycles since construction.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }
}

/// Small deterministic sample generator (xorshift32). State must stay
/// nonzero.
#[derive(Debug)]
struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::registers::DATA_REG_OFFSET;

    fn service() -> (DataReadyService, Trigger, Arc<Mutex<RegisterFile>>) {
        let regs = Arc::new(Mutex::new(RegisterFile::new()));
        let trigger = Trigger::new();
        let svc = DataReadyService::new(
            Arc::clone(&regs),
            trigger.clone(),
            SimTime::from_us(100),
            1,
        );
        (svc, trigger, regs)
    }

    #[test]
    fn test_idle_until_triggered() {
        let (mut svc, _trigger, regs) = service();
        assert_eq!(svc.poll(SimTime::ZERO), None);
        assert_eq!(svc.poll(SimTime::from_us(500)), None);
        assert!(!regs.lock().unwrap().data_ready());
        assert_eq!(svc.cycles_completed(), 0);
    }

    #[test]
    fn test_full_cycle_latches_data_and_ready_together() {
        let (mut svc, trigger, regs) = service();

        trigger.raise();
        let deadline = svc.poll(SimTime::ZERO).unwrap();
        assert_eq!(deadline, SimTime::from_us(100));

        // Mid-delay: nothing observable yet.
        assert_eq!(svc.poll(SimTime::from_us(50)), Some(deadline));
        assert!(!regs.lock().unwrap().data_ready());

        // At the deadline the sample and ready bit land as one unit.
        assert_eq!(svc.poll(deadline), None);
        {
            let mut regs = regs.lock().unwrap();
            assert!(regs.data_ready());
            // First xorshift32 output for seed 1, masked to 16 bits.
            assert_eq!(regs.read(DATA_REG_OFFSET).unwrap(), 0x2021);
        }
        assert_eq!(svc.cycles_completed(), 1);
    }

    #[test]
    fn test_double_raise_before_consumption_runs_one_cycle() {
        let (mut svc, trigger, _regs) = service();
        trigger.raise();
        trigger.raise();

        let deadline = svc.poll(SimTime::ZERO).unwrap();
        assert_eq!(svc.poll(deadline), None);
        assert_eq!(svc.cycles_completed(), 1);

        // No second cycle was queued.
        assert_eq!(svc.poll(deadline + SimTime::from_us(500)), None);
        assert_eq!(svc.cycles_completed(), 1);
    }

    #[test]
    fn test_retrigger_during_delay_schedules_next_cycle() {
        let (mut svc, trigger, _regs) = service();
        trigger.raise();
        let first = svc.poll(SimTime::ZERO).unwrap();

        // Fires while the service is inside its delay wait.
        trigger.raise();
        assert_eq!(svc.poll(SimTime::from_us(10)), Some(first));

        // Completing the first cycle consumes the pending firing and arms
        // the second, deadlined relative to the first completion.
        let second = svc.poll(first).unwrap();
        assert_eq!(second, first + SimTime::from_us(100));
        assert_eq!(svc.cycles_completed(), 1);

        assert_eq!(svc.poll(second), None);
        assert_eq!(svc.cycles_completed(), 2);
    }

    #[test]
    fn test_each_cycle_produces_a_new_sample() {
        let (mut svc, trigger, regs) = service();

        trigger.raise();
        let d1 = svc.poll(SimTime::ZERO).unwrap();
        svc.poll(d1);
        let first = regs.lock().unwrap().read(DATA_REG_OFFSET).unwrap();

        trigger.raise();
        let d2 = svc.poll(d1).unwrap();
        svc.poll(d2);
        let second = regs.lock().unwrap().read(DATA_REG_OFFSET).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_poll_past_deadline_still_completes() {
        let (mut svc, trigger, regs) = service();
        trigger.raise();
        svc.poll(SimTime::ZERO);

        // The driver may overshoot the deadline; the cycle still lands.
        assert_eq!(svc.poll(SimTime::from_us(250)), None);
        assert!(regs.lock().unwrap().data_ready());
    }
}
