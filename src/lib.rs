//! Cooperative multitasking kernel for the ATmega128
//!
//! A fixed set of never-returning tasks shares the single CPU by yielding
//! explicitly; there is no preemption, no priorities and no heap. Task
//! storage is reserved statically, switching is a full register-file
//! save/restore on the task's own stack, and a task's first launch goes
//! through the same return-to-task epilogue as every later resumption.
//!
//! Startup sequence:
//!
//! ```text
//! #[avr_device::entry]
//! fn main() -> ! {
//!     clock::init(dp.TC0);              // 1 ms tick for sleep()
//!     interrupt::enable();
//!     insert_task(0, first, task_stack!());
//!     insert_task(1, second, task_stack!(80));
//!     insert_task(2, third, task_stack!());
//!     start_multitasking()              // never returns
//! }
//! ```
//!
//! The scheduling policy is plain round-robin starting one slot past the
//! task that yielded. `sleep` and `pause_task` take tasks out of the scan;
//! when nothing is runnable the kernel busy-waits until something is.
//!
//! With the `stack-reporting` feature enabled, every stack is painted with a
//! canary at start and `stack_used` reports per-task high-water marks.

#![no_std]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch, abi_avr_interrupt))]

pub mod clock;
pub mod config;
pub mod kernel;
mod macros;
pub mod scheduler;
pub mod task;

#[cfg(target_arch = "avr")]
pub mod arch;

pub use kernel::{
    current_task_id, insert_task, is_task_paused, pause_task, restart_task, sleep, unpause_task,
    yield_now,
};

#[cfg(target_arch = "avr")]
pub use kernel::start_multitasking;

#[cfg(feature = "stack-reporting")]
pub use kernel::{stack_size, stack_used, stack_used_percentage};

pub use task::{TaskControl, TaskFlags, TaskFn};
