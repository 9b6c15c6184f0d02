//! Fixed-rate loop timing.
//!
//! [`Scheduler::poll`] reports when the next period boundary has been reached. A loop that
//! overruns its budget skips the missed boundaries instead of running back-to-back to catch up.

use embedded_time::{duration::Microseconds, Clock};
use log::warn;

mod error;
pub use error::Error;

/// A period boundary reached by the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Number of ticks before this one.
    pub index: u32,

    /// Time of the poll that produced this tick.
    pub now: Microseconds<u32>,

    /// Period boundaries missed since the previous tick.
    pub skipped: u32,
}

pub struct Scheduler<C> {
    clock: C,
    loop_rate_hz: u32,
    loop_period_us: u32,
    tick_counter: u32,
    next_deadline_us: Option<u32>,
    overruns: u32,
}

impl<C> Scheduler<C>
where
    C: Clock,
    C::T: Into<u64>,
{
    /// Create a scheduler ticking `loop_rate_hz` times a second.
    pub fn new(clock: C, loop_rate_hz: u32) -> Self {
        let loop_rate_hz = loop_rate_hz.max(1);
        Self {
            clock,
            loop_rate_hz,
            loop_period_us: (1_000_000 / loop_rate_hz).max(1),
            tick_counter: 0,
            next_deadline_us: None,
            overruns: 0,
        }
    }

    pub fn loop_rate_hz(&self) -> u32 {
        self.loop_rate_hz
    }

    pub fn loop_period(&self) -> Microseconds<u32> {
        Microseconds::new(self.loop_period_us)
    }

    /// Total number of period boundaries skipped because a loop ran late.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns a [`Tick`] if a period boundary has passed since the last tick, otherwise `None`.
    ///
    /// The first poll always ticks and sets the phase of the schedule.
    pub fn poll(&mut self) -> Result<Option<Tick>, Error> {
        let now = self.micros_since_epoch()?;
        let deadline = self.next_deadline_us.unwrap_or(now);

        // Deadline still ahead of us (with wrap-around)
        let late = now.wrapping_sub(deadline);
        if late > u32::MAX / 2 {
            return Ok(None);
        }

        let skipped = late / self.loop_period_us;
        if skipped > 0 {
            self.overruns = self.overruns.saturating_add(skipped);
            warn!(
                "control loop overrun: skipped {} period(s) of {}us",
                skipped, self.loop_period_us
            );
        }

        self.next_deadline_us =
            Some(deadline.wrapping_add((skipped + 1).wrapping_mul(self.loop_period_us)));

        let tick = Tick {
            index: self.tick_counter,
            now: Microseconds::new(now),
            skipped,
        };
        self.tick_counter = self.tick_counter.wrapping_add(1);

        Ok(Some(tick))
    }

    /// Time since the clock's epoch in microseconds, wrapped to 32 bits.
    fn micros_since_epoch(&mut self) -> Result<u32, Error> {
        let instant = self.clock.try_now()?;
        let micros = Microseconds::<C::T>::try_from(instant.duration_since_epoch())?;
        let micros: u64 = micros.0.into();
        Ok(micros as u32)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use embedded_time::{clock, duration::Microseconds, rate::Fraction, Clock, Instant};

    use super::Scheduler;

    #[derive(Default)]
    struct TestClock {
        now_us: Cell<u32>,
    }

    impl TestClock {
        fn set(&self, us: u32) {
            self.now_us.set(us);
        }
    }

    impl<'a> Clock for &'a TestClock {
        type T = u32;

        const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

        fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
            Ok(Instant::new(self.now_us.get()))
        }
    }

    #[test]
    fn it_ticks_on_period_boundaries() {
        let clock = TestClock::default();
        clock.set(1_000);
        let mut scheduler = Scheduler::new(&clock, 500);
        assert_eq!(scheduler.loop_period(), Microseconds(2_000u32));

        let first = scheduler.poll().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.skipped, 0);

        clock.set(2_999);
        assert_eq!(scheduler.poll().unwrap(), None);

        clock.set(3_100);
        let second = scheduler.poll().unwrap().unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.now, Microseconds(3_100u32));

        // Late wake-ups do not shift the schedule
        clock.set(4_999);
        assert_eq!(scheduler.poll().unwrap(), None);
        clock.set(5_000);
        assert_eq!(scheduler.poll().unwrap().unwrap().index, 2);
        assert_eq!(scheduler.overruns(), 0);
    }

    #[test]
    fn overruns_skip_to_next_boundary() {
        let clock = TestClock::default();
        let mut scheduler = Scheduler::new(&clock, 500);
        scheduler.poll().unwrap();

        // The 2ms tick runs at 7.5ms, boundaries at 4 and 6ms are gone
        clock.set(7_500);
        let tick = scheduler.poll().unwrap().unwrap();
        assert_eq!(tick.index, 1);
        assert_eq!(tick.skipped, 2);
        assert_eq!(scheduler.overruns(), 2);

        // No catch-up ticks, the next one is at 8ms
        assert_eq!(scheduler.poll().unwrap(), None);
        clock.set(8_000);
        let tick = scheduler.poll().unwrap().unwrap();
        assert_eq!(tick.index, 2);
        assert_eq!(tick.skipped, 0);
    }

    /// Counts nanoseconds in 64 bits, like a std clock.
    #[derive(Default)]
    struct NanoClock {
        now_ns: Cell<u64>,
    }

    impl<'a> Clock for &'a NanoClock {
        type T = u64;

        const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000_000);

        fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
            Ok(Instant::new(self.now_ns.get()))
        }
    }

    #[test]
    fn it_runs_on_64_bit_clocks() {
        let clock = NanoClock::default();
        clock.now_ns.set(1_000_000);
        let mut scheduler = Scheduler::new(&clock, 500);
        assert_eq!(scheduler.poll().unwrap().unwrap().now, Microseconds(1_000u32));

        clock.now_ns.set(2_999_999);
        assert_eq!(scheduler.poll().unwrap(), None);
        clock.now_ns.set(3_000_000);
        assert_eq!(scheduler.poll().unwrap().unwrap().index, 1);

        clock.now_ns.set(9_500_000);
        assert_eq!(scheduler.poll().unwrap().unwrap().skipped, 2);
    }

    #[test]
    fn wide_clock_time_wraps_like_a_32_bit_timer() {
        let clock = NanoClock::default();
        // Microseconds past the 32 bit range
        let start_us = u64::from(u32::MAX) - 500;
        clock.now_ns.set(start_us * 1_000);
        let mut scheduler = Scheduler::new(&clock, 1_000);
        scheduler.poll().unwrap();

        clock.now_ns.set((start_us + 999) * 1_000);
        assert_eq!(scheduler.poll().unwrap(), None);
        clock.now_ns.set((start_us + 1_000) * 1_000);
        let tick = scheduler.poll().unwrap().unwrap();
        assert_eq!(tick.now, Microseconds(499u32));
        assert_eq!(tick.skipped, 0);
    }

    #[test]
    fn it_handles_timer_wrap_around() {
        let clock = TestClock::default();
        clock.set(u32::MAX - 500);
        let mut scheduler = Scheduler::new(&clock, 1_000);
        scheduler.poll().unwrap();

        clock.set(100);
        assert_eq!(scheduler.poll().unwrap(), None);
        clock.set(499);
        assert!(scheduler.poll().unwrap().is_some());
    }
}
