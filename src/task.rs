//! Per-task state: control block, flag set, stack accounting

use bitflags::bitflags;

#[cfg(feature = "stack-reporting")]
use crate::config::STACK_CANARY;

/// Entry routine of a task. Tasks never return; `task_fn!` generates the
/// body-then-yield loop that upholds this.
pub type TaskFn = fn() -> !;

bitflags! {
    /// Scheduling state of a task. The bits are independent; any subset may
    /// be set at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TaskFlags: u8 {
        /// Task has never run; next selection cold-starts it.
        const NEED_INIT = 0x01;
        /// Task is waiting for `wakeup_time`; cleared on eligible selection.
        const SLEEPING = 0x02;
        /// Task is excluded from scheduling until unpaused.
        const PAUSED = 0x04;
    }
}

/// Control block of a single task.
///
/// `saved_sp` is written when the task suspends in `yield` and is stale
/// while the task runs. The stack occupies `stack_base..stack_base + stack_size`
/// and grows downward from the top.
#[derive(Clone, Copy)]
pub struct TaskControl {
    pub saved_sp: usize,
    pub id: u8,
    pub flags: TaskFlags,
    pub wakeup_time: u32,
    pub entry: TaskFn,
    pub stack_base: *mut u8,
    pub stack_size: usize,
}

// Slots are filled before the kernel starts; scheduling one that never was
// is undefined behavior, pinned here to a harmless spin.
fn unstarted() -> ! {
    loop {}
}

impl TaskControl {
    pub const EMPTY: TaskControl = TaskControl {
        saved_sp: 0,
        id: 0,
        flags: TaskFlags::empty(),
        wakeup_time: 0,
        entry: unstarted,
        stack_base: core::ptr::null_mut(),
        stack_size: 0,
    };

    /// Address of the last byte of the stack region, where a fresh task's
    /// stack pointer starts.
    #[inline]
    pub fn stack_top(&self) -> usize {
        self.stack_base as usize + self.stack_size - 1
    }
}

#[cfg(feature = "stack-reporting")]
impl TaskControl {
    /// Fill the whole stack region with the canary byte.
    pub fn paint_stack(&mut self) {
        if self.stack_size == 0 {
            return;
        }
        unsafe {
            core::ptr::write_bytes(self.stack_base, STACK_CANARY, self.stack_size);
        }
    }

    /// High-water mark in bytes: intact canary bytes are counted upward from
    /// `stack_base` and everything above them has been used. A region with
    /// no canary left reports `stack_size`; exactly-full and overflowed are
    /// indistinguishable and both get the conservative answer.
    pub fn stack_used(&self) -> usize {
        let mut intact = 0;
        while intact < self.stack_size {
            let byte = unsafe { self.stack_base.add(intact).read_volatile() };
            if byte != STACK_CANARY {
                break;
            }
            intact += 1;
        }
        self.stack_size - intact
    }

    /// Used fraction of the stack as a percentage.
    pub fn stack_used_percentage(&self) -> f32 {
        (self.stack_used() as f32 / self.stack_size as f32) * 100.0
    }
}
