//! Kernel singleton and public API
//!
//! All kernel state lives in one process-wide [`Kernel`] value. The API is a
//! set of free functions over it, callable from any task; with cooperative
//! scheduling only one task executes at a time, so access is race-free as
//! long as interrupt handlers leave the task table alone.

use crate::config::TASK_COUNT;
use crate::task::{TaskControl, TaskFlags, TaskFn};

#[cfg(target_arch = "avr")]
use crate::arch::avr;

/// Process-wide kernel state.
pub struct Kernel {
    /// Slot `i` holds the task whose id is `i`.
    pub tasks: [TaskControl; TASK_COUNT],
    /// Index of the running task. Its `saved_sp` is stale while it runs.
    pub current: u8,
    /// SREG snapshot taken at kernel start, replayed into every cold start
    /// so new tasks inherit the boot-time interrupt-enable state.
    pub seed_sreg: u8,
}

impl Kernel {
    pub const fn new() -> Self {
        Self {
            tasks: [TaskControl::EMPTY; TASK_COUNT],
            current: 0,
            seed_sreg: 0,
        }
    }
}

/// The singleton. Public for the architecture layer and host-side tests;
/// firmware goes through the functions below.
pub static mut KERNEL: Kernel = Kernel::new();

pub(crate) fn kernel_mut() -> &'static mut Kernel {
    // Sole flow of control under cooperative scheduling; see module docs.
    unsafe { &mut *core::ptr::addr_of_mut!(KERNEL) }
}

/// Register a task in slot `id`.
///
/// Every slot must be filled before `start_multitasking`. The stack must be
/// large enough for the saved context (35 bytes on AVR) plus the task's
/// worst-case frame; the kernel does not check.
pub fn insert_task(id: u8, entry: TaskFn, stack: &'static mut [u8]) {
    let kernel = kernel_mut();
    kernel.tasks[id as usize] = TaskControl {
        saved_sp: stack.as_ptr() as usize + stack.len() - 1,
        id,
        flags: TaskFlags::NEED_INIT,
        wakeup_time: 0,
        entry,
        stack_base: stack.as_mut_ptr(),
        stack_size: stack.len(),
    };
}

/// Hand the CPU to the scheduler and start task 0. Called once from the
/// startup path after all `insert_task` calls; task 0 must be registered and
/// not paused (unchecked). Never returns.
#[cfg(target_arch = "avr")]
pub fn start_multitasking() -> ! {
    let kernel = kernel_mut();

    #[cfg(feature = "stack-reporting")]
    for task in kernel.tasks.iter_mut() {
        task.paint_stack();
    }

    kernel.seed_sreg = avr::read_sreg();
    kernel.current = 0;

    let first = &mut kernel.tasks[0];
    first.flags.remove(TaskFlags::NEED_INIT);
    unsafe { avr::cold_start(first.entry, first.stack_top(), kernel.seed_sreg) }
}

/// Suspend the calling task and return when the scheduler selects it again.
#[inline]
pub fn yield_now() {
    #[cfg(target_arch = "avr")]
    unsafe {
        avr::yield_asm()
    };
    // Off-target builds have no machine context to swap; the scheduling
    // logic is exercised directly by the host tests.
}

/// Sleep for at least `ms` milliseconds. The task is not re-selected before
/// the deadline; how much later it actually resumes depends on its peers
/// yielding.
pub fn sleep(ms: u32) {
    let kernel = kernel_mut();
    let task = &mut kernel.tasks[kernel.current as usize];
    task.wakeup_time = crate::clock::now_ms().wrapping_add(ms);
    task.flags.insert(TaskFlags::SLEEPING);
    yield_now();
}

/// Exclude a task from scheduling. Idempotent; pausing the caller takes
/// effect at its next yield.
pub fn pause_task(id: u8) {
    kernel_mut().tasks[id as usize].flags.insert(TaskFlags::PAUSED);
}

/// Make a task schedulable again. Idempotent; an in-progress sleep is
/// undisturbed.
pub fn unpause_task(id: u8) {
    kernel_mut().tasks[id as usize].flags.remove(TaskFlags::PAUSED);
}

pub fn is_task_paused(id: u8) -> bool {
    kernel_mut().tasks[id as usize].flags.contains(TaskFlags::PAUSED)
}

/// Id of the running task.
pub fn current_task_id() -> u8 {
    kernel_mut().current
}

/// Make a task start over from its entry point with a full stack on its next
/// selection. Whatever the task was doing is discarded, not unwound.
/// Restarting the caller takes effect at its next yield.
pub fn restart_task(id: u8) {
    kernel_mut().tasks[id as usize].flags.insert(TaskFlags::NEED_INIT);
}

/// High-water mark of a task's stack in bytes. Valid once
/// `start_multitasking` has painted the stacks.
#[cfg(feature = "stack-reporting")]
pub fn stack_used(id: u8) -> usize {
    kernel_mut().tasks[id as usize].stack_used()
}

/// Configured stack size of a task in bytes.
#[cfg(feature = "stack-reporting")]
pub fn stack_size(id: u8) -> usize {
    kernel_mut().tasks[id as usize].stack_size
}

/// Used fraction of a task's stack as a percentage.
#[cfg(feature = "stack-reporting")]
pub fn stack_used_percentage(id: u8) -> f32 {
    kernel_mut().tasks[id as usize].stack_used_percentage()
}
