//! Three-task blinker: two LED ports toggling at their own pace and a slow
//! counter task that the first blinker restarts every ten iterations.

#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_device::atmega128::{Peripherals, PORTA, PORTB, PORTC};
    use avr_coop_kernel::{
        clock, insert_task, restart_task, sleep, start_multitasking, task_fn, task_stack,
        yield_now,
    };

    /// Slot 0: toggles PORTA every iteration and restarts the counter task
    /// every tenth one.
    fn blink_a() -> ! {
        let mut iterations = 0u8;
        loop {
            iterations += 1;
            if iterations >= 10 {
                iterations = 0;
                restart_task(2);
            }
            unsafe {
                (*PORTA::ptr()).porta.modify(|r, w| w.bits(r.bits() ^ 0xFF));
            }
            sleep(250);
        }
    }

    // Slot 1 gets by with a 40-byte stack: the saved context needs 35.
    task_fn! {
        fn blink_b() {
            unsafe {
                (*PORTB::ptr()).portb.modify(|r, w| w.bits(r.bits() ^ 0xFF));
            }
        }
    }

    /// Slot 2: yields 50 times between PORTC toggles; visibly starts over
    /// from zero whenever `blink_a` restarts it.
    fn slow_counter() -> ! {
        loop {
            let mut count = 0u8;
            while count < 50 {
                yield_now();
                count += 1;
            }
            unsafe {
                (*PORTC::ptr()).portc.modify(|r, w| w.bits(r.bits() ^ 0xFF));
            }
        }
    }

    #[avr_device::entry]
    fn main() -> ! {
        let dp = Peripherals::take().unwrap();

        dp.PORTA.ddra.write(|w| unsafe { w.bits(0xFF) });
        dp.PORTB.ddrb.write(|w| unsafe { w.bits(0xFF) });
        dp.PORTC.ddrc.write(|w| unsafe { w.bits(0xFF) });

        clock::init(dp.TC0);
        unsafe { avr_device::interrupt::enable() };

        insert_task(0, blink_a, task_stack!());
        insert_task(1, blink_b, task_stack!(40));
        insert_task(2, slow_counter, task_stack!());

        start_multitasking()
    }
}

// Keeps `cargo test` green on a development host; the firmware above only
// exists for AVR targets.
#[cfg(not(target_arch = "avr"))]
fn main() {}
