//! Stack instrumentation walkthrough: two workers with different appetites
//! and a reporter task that prints each task's high-water mark over USART0.
//!
//! Build with the `stack-reporting` feature.

#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use core::fmt::{self, Write};

    use panic_halt as _;

    use avr_device::atmega128::{Peripherals, USART0};
    use avr_coop_kernel::{
        clock, config::TASK_COUNT, insert_task, sleep, stack_size, stack_used,
        stack_used_percentage, start_multitasking, task_fn, task_stack, yield_now,
    };

    // 16 MHz / (16 * 9600) - 1
    const UBRR_9600: u16 = 103;

    fn uart_init(usart: &USART0) {
        usart.ubrr0h.write(|w| unsafe { w.bits((UBRR_9600 >> 8) as u8) });
        usart.ubrr0l.write(|w| unsafe { w.bits(UBRR_9600 as u8) });
        usart.ucsr0b.write(|w| w.txen0().set_bit());
    }

    /// Blocking transmit-only console over USART0.
    struct Console;

    impl Console {
        fn write_byte(&mut self, byte: u8) {
            unsafe {
                let usart = &*USART0::ptr();
                while usart.ucsr0a.read().udre0().bit_is_clear() {}
                usart.udr0.write(|w| w.bits(byte));
            }
        }
    }

    impl Write for Console {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for byte in s.bytes() {
                self.write_byte(byte);
            }
            Ok(())
        }
    }

    /// Slot 0: shallow worker, touches almost nothing beyond the yield frame.
    task_fn! {
        fn light_worker() {
            let mut spin = 0u8;
            while spin < 8 {
                spin = spin.wrapping_add(1);
            }
        }
    }

    /// Slot 1: scribbles over a 64-byte buffer each round so its high-water
    /// mark climbs well past the saved-context floor.
    task_fn! {
        fn heavy_worker() {
            let mut buffer = [0u8; 64];
            for (i, slot) in buffer.iter_mut().enumerate() {
                unsafe { core::ptr::write_volatile(slot, i as u8) };
            }
        }
    }

    /// Slot 2: once a second, prints usage for every task.
    fn reporter() -> ! {
        let mut console = Console;
        loop {
            sleep(1000);
            for id in 0..TASK_COUNT as u8 {
                writeln!(
                    console,
                    "task {}: {}/{} bytes ({:.1}%)",
                    id,
                    stack_used(id),
                    stack_size(id),
                    stack_used_percentage(id),
                )
                .ok();
            }
            yield_now();
        }
    }

    #[avr_device::entry]
    fn main() -> ! {
        let dp = Peripherals::take().unwrap();

        uart_init(&dp.USART0);
        clock::init(dp.TC0);
        unsafe { avr_device::interrupt::enable() };

        insert_task(0, light_worker, task_stack!());
        insert_task(1, heavy_worker, task_stack!(200));
        insert_task(2, reporter, task_stack!(256));

        start_multitasking()
    }
}

// Keeps `cargo test` green on a development host; the firmware above only
// exists for AVR targets.
#[cfg(not(target_arch = "avr"))]
fn main() {}
