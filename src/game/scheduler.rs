//! Virtual-time timer scheduler
//!
//! Replaces free-running interval/timeout callbacks with timers owned by the
//! game loop. Nothing fires on its own: the owner moves time forward and pops
//! due timers one by one, so cancelling everything between two pops is atomic.
//!
//! Every timer carries the generation (match epoch) it was armed for. The
//! scheduler does not interpret it; the owner drops fired timers whose
//! generation is stale.

use smallvec::SmallVec;

/// What a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// 1 Hz score increment
    ScoreTick,
    /// Fixed-rate physics/collision update
    UpdateTick,
    /// Deferred obstacle spawn
    ObstacleSpawn,
}

/// Handle for cancelling a single timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    pub kind: TimerKind,
    pub generation: u64,
    /// Virtual time the timer was due at
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
struct TimerEntry {
    handle: TimerHandle,
    kind: TimerKind,
    due_ms: u64,
    period_ms: Option<u64>,
    generation: u64,
}

/// Timer wheel for a handful of timers
///
/// Due timers pop in (due time, arming order) order, so two timers due at the
/// same instant fire in the order they were armed.
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    timers: SmallVec<[TimerEntry; 4]>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of armed timers
    #[inline]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of armed timers of one kind
    pub fn armed_count(&self, kind: TimerKind) -> usize {
        self.timers.iter().filter(|t| t.kind == kind).count()
    }

    /// Fire once after `delay_ms`
    pub fn schedule_once(&mut self, kind: TimerKind, delay_ms: u64, generation: u64) -> TimerHandle {
        self.insert(kind, self.now_ms + delay_ms, None, generation)
    }

    /// Fire every `period_ms`, first after one full period
    ///
    /// A zero period is treated as 1 ms so draining always terminates.
    pub fn schedule_repeating(&mut self, kind: TimerKind, period_ms: u64, generation: u64) -> TimerHandle {
        let period = period_ms.max(1);
        self.insert(kind, self.now_ms + period, Some(period), generation)
    }

    fn insert(&mut self, kind: TimerKind, due_ms: u64, period_ms: Option<u64>, generation: u64) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(TimerEntry {
            handle,
            kind,
            due_ms,
            period_ms,
            generation,
        });
        handle
    }

    /// Cancel one timer. Returns false if it already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    /// Cancel every armed timer, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    /// Pop the earliest timer due at or before `until_ms`
    ///
    /// Virtual time moves to the timer's due time. Repeating timers are
    /// re-armed one period later, so a late caller drains every missed period.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<FiredTimer> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.handle))
            .map(|(i, _)| i)?;

        let entry = &mut self.timers[idx];
        let fired = FiredTimer {
            handle: entry.handle,
            kind: entry.kind,
            generation: entry.generation,
            at_ms: entry.due_ms,
        };

        match entry.period_ms {
            Some(period) => entry.due_ms += period,
            None => {
                self.timers.remove(idx);
            }
        }

        self.now_ms = self.now_ms.max(fired.at_ms);
        Some(fired)
    }

    /// Move virtual time forward without firing anything
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler, until_ms: u64) -> Vec<FiredTimer> {
        let mut fired = Vec::new();
        while let Some(timer) = scheduler.pop_due(until_ms) {
            fired.push(timer);
        }
        scheduler.advance_to(until_ms);
        fired
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_once(TimerKind::ObstacleSpawn, 1500, 0);

        assert!(drain(&mut scheduler, 1499).is_empty());
        let fired = drain(&mut scheduler, 1500);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].handle, handle);
        assert_eq!(fired[0].at_ms, 1500);
        assert!(scheduler.is_empty());
        assert!(drain(&mut scheduler, 10_000).is_empty());
    }

    #[test]
    fn test_repeating_catches_up() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TimerKind::UpdateTick, 20, 0);

        // Late by three periods: all of them fire, in order
        let fired = drain(&mut scheduler, 60);
        let times: Vec<u64> = fired.iter().map(|f| f.at_ms).collect();
        assert_eq!(times, vec![20, 40, 60]);
        assert_eq!(scheduler.now_ms(), 60);
        assert!(scheduler.pop_due(79).is_none());
        assert_eq!(scheduler.pop_due(80).map(|f| f.at_ms), Some(80));
    }

    #[test]
    fn test_same_instant_fires_in_arming_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TimerKind::ScoreTick, 1000, 0);
        scheduler.schedule_repeating(TimerKind::UpdateTick, 20, 0);

        let fired = drain(&mut scheduler, 1000);
        let last_two: Vec<TimerKind> = fired[fired.len() - 2..].iter().map(|f| f.kind).collect();
        // At t=1000 the score tick was armed first
        assert_eq!(last_two, vec![TimerKind::ScoreTick, TimerKind::UpdateTick]);
        assert_eq!(fired.iter().filter(|f| f.kind == TimerKind::UpdateTick).count(), 50);
    }

    #[test]
    fn test_cancel_single() {
        let mut scheduler = Scheduler::new();
        let spawn = scheduler.schedule_once(TimerKind::ObstacleSpawn, 100, 0);
        scheduler.schedule_repeating(TimerKind::UpdateTick, 20, 0);

        assert!(scheduler.cancel(spawn));
        assert!(!scheduler.cancel(spawn));

        let fired = drain(&mut scheduler, 200);
        assert!(fired.iter().all(|f| f.kind == TimerKind::UpdateTick));
    }

    #[test]
    fn test_cancel_all_mid_drain_stops_everything() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TimerKind::UpdateTick, 20, 0);
        scheduler.schedule_repeating(TimerKind::ScoreTick, 1000, 0);
        scheduler.schedule_once(TimerKind::ObstacleSpawn, 50, 0);

        let first = scheduler.pop_due(5000);
        assert!(first.is_some());
        assert_eq!(scheduler.cancel_all(), 3);
        assert!(scheduler.pop_due(5000).is_none());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_generation_is_carried() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(TimerKind::ObstacleSpawn, 10, 7);
        let fired = scheduler.pop_due(10).unwrap();
        assert_eq!(fired.generation, 7);
    }

    #[test]
    fn test_zero_period_terminates() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TimerKind::UpdateTick, 0, 0);
        assert_eq!(drain(&mut scheduler, 5).len(), 5);
    }

    #[test]
    fn test_delays_are_relative_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(1000);
        scheduler.schedule_once(TimerKind::ObstacleSpawn, 250, 0);
        assert!(scheduler.pop_due(1249).is_none());
        assert_eq!(scheduler.pop_due(1250).map(|f| f.at_ms), Some(1250));
    }
}
