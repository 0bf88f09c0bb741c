//! Configuration constants for the cooperative kernel
//!
//! `TASK_COUNT` is fixed for the lifetime of the firmware and is edited per
//! application, like the rest of this module.

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// Number of task slots. Must be at least 2 and every slot must be filled
/// with `insert_task` before `start_multitasking`.
pub const TASK_COUNT: usize = 3;

/// Stack size in bytes used by `task_stack!` when none is given
pub const DEFAULT_STACK_SIZE: usize = 150;

/// Byte painted over every task stack at kernel start (stack-reporting)
pub const STACK_CANARY: u8 = 0x55;

/// Busy-wait between scheduler scans when no task is runnable, in microseconds
pub const IDLE_RETRY_US: u16 = 1000;
