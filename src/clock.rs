//! Monotonic millisecond clock and short busy-waits
//!
//! The scheduler needs exactly two things from the platform: a monotonic
//! `now_ms` and a `delay_us` busy-wait for its idle loop. On the device both
//! come from here; host builds get a test-settable counter instead so the
//! scheduling logic can be exercised off-target.
//!
//! The counter wraps after ~49.7 days. Sleep deadlines use the same
//! arithmetic, so a wrap shows up as one mistimed sleep at worst.

#[cfg(target_arch = "avr")]
mod tc0 {
    use avr_device::atmega128::TC0;
    use avr_device::interrupt::{self, Mutex};
    use core::cell::Cell;

    use crate::config::CPU_FREQ_HZ;

    static MILLIS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

    /// Configure Timer0 for 1 ms compare ticks: 16 MHz / 64 / 250 = 1 kHz.
    /// Call once from startup, before `start_multitasking`, with global
    /// interrupts enabled so the counter runs.
    pub fn init(timer: TC0) {
        timer.tccr0.write(|w| unsafe {
            w.cs0().bits(0b100) // Prescaler 64
                .wgm0().bits(0b10) // CTC mode
        });
        timer.ocr0.write(|w| unsafe { w.bits(249) });
        timer.timsk.modify(|_, w| w.ocie0().set_bit());
    }

    /// Milliseconds since `init`.
    pub fn now_ms() -> u32 {
        interrupt::free(|cs| MILLIS.borrow(cs).get())
    }

    /// Busy-wait roughly `us` microseconds. The loop body costs ~4 cycles.
    pub fn delay_us(us: u16) {
        let mut count = (CPU_FREQ_HZ / 4_000_000) * us as u32;
        while count != 0 {
            unsafe { core::arch::asm!("nop") };
            count -= 1;
        }
    }

    #[avr_device::interrupt(atmega128)]
    fn TIMER0_COMP() {
        interrupt::free(|cs| {
            let millis = MILLIS.borrow(cs);
            millis.set(millis.get().wrapping_add(1));
        });
    }
}

#[cfg(target_arch = "avr")]
pub use tc0::{delay_us, init, now_ms};

#[cfg(not(target_arch = "avr"))]
mod host {
    use core::sync::atomic::{AtomicU32, Ordering};

    static MILLIS: AtomicU32 = AtomicU32::new(0);

    pub fn now_ms() -> u32 {
        MILLIS.load(Ordering::Relaxed)
    }

    /// Move the fake counter; host tests drive time by hand.
    pub fn set_now_ms(ms: u32) {
        MILLIS.store(ms, Ordering::Relaxed)
    }

    pub fn delay_us(_us: u16) {}
}

#[cfg(not(target_arch = "avr"))]
pub use host::{delay_us, now_ms, set_now_ms};
