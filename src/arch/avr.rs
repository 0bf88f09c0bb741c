//! AVR context switch primitives
//!
//! Three transfers make up the switching protocol. `yield_asm` saves the
//! full register file plus SREG onto the suspending task's own stack and
//! captures its stack pointer. The dispatcher then runs on the scratch stack
//! at the top of RAM, because it calls into the clock and the busy-wait,
//! which need stack of their own. Finally control re-enters a task either by
//! `resume` (pop everything back, `ret` to the instruction after its yield)
//! or by `cold_start` (synthesize the one frame a `ret` consumes: the entry
//! address). First run and Nth resumption thus share a single
//! return-to-task epilogue and no per-task trampoline exists.
//!
//! Interrupts are masked for the whole save/restore critical region, not
//! just the non-atomic SPL/SPH handoffs: `yield_asm` runs `cli` right after
//! capturing SREG and stays masked through the register pushes and the
//! switch to the scratch stack, until the dispatcher re-enables per the seed
//! SREG; `resume` and `cold_start` are masked from adopting the new stack
//! pointer until the final SREG write just before `ret`. An ISR firing
//! mid-save would otherwise run on a half-built register frame.

use crate::config::IDLE_RETRY_US;
use crate::kernel::kernel_mut;
use crate::scheduler;
use crate::task::{TaskFlags, TaskFn};

/// Top of internal SRAM (RAMEND), reused as the scheduler's scratch stack.
/// Nothing on it survives a scheduling decision.
pub const SCRATCH_STACK_TOP: u16 = 0x10FF;

const SPL: u8 = 0x3d;
const SPH: u8 = 0x3e;
const SREG: u8 = 0x3f;

/// Global interrupt enable bit of SREG.
const SREG_I: u8 = 0x80;

/// Snapshot of the status register.
#[inline]
pub(crate) fn read_sreg() -> u8 {
    let sreg: u8;
    unsafe {
        core::arch::asm!("in {0}, {sreg_io}", out(reg) sreg, sreg_io = const SREG);
    }
    sreg
}

/// Save path of a yield. Naked: the compiler must not generate a prologue,
/// every live register is saved by hand. The call that got us here left the
/// return address on the task's stack; it stays put below the register
/// frame and is what `resume` eventually returns through.
///
/// # Safety
/// Must run in task context with the kernel started. Not reentrant from
/// interrupt handlers.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn yield_asm() {
    core::arch::naked_asm!(
        "push r0",
        "in r0, {sreg_io}",
        "cli",
        "push r0",
        "push r1",
        "clr r1",
        "push r2",
        "push r3",
        "push r4",
        "push r5",
        "push r6",
        "push r7",
        "push r8",
        "push r9",
        "push r10",
        "push r11",
        "push r12",
        "push r13",
        "push r14",
        "push r15",
        "push r16",
        "push r17",
        "push r18",
        "push r19",
        "push r20",
        "push r21",
        "push r22",
        "push r23",
        "push r24",
        "push r25",
        "push r26",
        "push r27",
        "push r28",
        "push r29",
        "push r30",
        "push r31",
        // hand the saved stack pointer to the dispatcher in r25:r24
        "in r24, {spl_io}",
        "in r25, {sph_io}",
        // abandon the task stack for the scratch region
        "ldi r31, {scratch_lo}",
        "out {spl_io}, r31",
        "ldi r31, {scratch_hi}",
        "out {sph_io}, r31",
        "jmp {dispatch}",
        sreg_io = const SREG,
        spl_io = const SPL,
        sph_io = const SPH,
        scratch_lo = const SCRATCH_STACK_TOP & 0xff,
        scratch_hi = const (SCRATCH_STACK_TOP >> 8) & 0xff,
        dispatch = sym dispatch,
    )
}

/// Runs on the scratch stack between save and resume. Stores the yielder's
/// stack pointer, scans for the next runnable task, idling in
/// `delay_us`-sized steps when a full cycle finds none, then transfers
/// control.
unsafe extern "C" fn dispatch(saved_sp: u16) -> ! {
    let kernel = kernel_mut();
    kernel.tasks[kernel.current as usize].saved_sp = saved_sp as usize;

    // The tick interrupt must keep the millisecond counter moving while we
    // wait for a sleeper, so interrupts come back on here, per the boot-time
    // state every task inherits.
    if kernel.seed_sreg & SREG_I != 0 {
        unsafe { avr_device::interrupt::enable() };
    }

    let next = loop {
        let now = crate::clock::now_ms();
        if let Some(id) = scheduler::select_next(&mut kernel.tasks, kernel.current, now) {
            break id;
        }
        crate::clock::delay_us(IDLE_RETRY_US);
    };

    kernel.current = next;
    let task = &mut kernel.tasks[next as usize];
    if task.flags.contains(TaskFlags::NEED_INIT) {
        task.flags.remove(TaskFlags::NEED_INIT);
        unsafe { cold_start(task.entry, task.stack_top(), kernel.seed_sreg) }
    } else {
        unsafe { resume(task.saved_sp) }
    }
}

/// First transfer of control into a task, and the restart path. The stack
/// pointer is set to the top of the task's region regardless of `saved_sp`,
/// the entry address is pushed where a return address would sit, and the
/// seed SREG is installed. The trailing `ret` "returns" into the entry.
///
/// # Safety
/// `stack_top` must be the last byte of a valid, exclusively owned stack
/// region. Never returns to the caller.
pub(crate) unsafe fn cold_start(entry: TaskFn, stack_top: usize, sreg: u8) -> ! {
    let entry = entry as usize as u16;
    let sp = stack_top as u16;
    core::arch::asm!(
        "cli",
        "out {spl_io}, {sp_lo}",
        "out {sph_io}, {sp_hi}",
        "push {entry_lo}",
        "push {entry_hi}",
        "out {sreg_io}, {seed}",
        "ret",
        sp_lo = in(reg) sp as u8,
        sp_hi = in(reg) (sp >> 8) as u8,
        entry_lo = in(reg) entry as u8,
        entry_hi = in(reg) (entry >> 8) as u8,
        seed = in(reg) sreg,
        spl_io = const SPL,
        sph_io = const SPH,
        sreg_io = const SREG,
        options(noreturn),
    )
}

/// Undo of `yield_asm`: adopt the task's saved stack pointer, pop the
/// register file in reverse, restore SREG (interrupt state included) and
/// return to the instruction after the yield that suspended it.
unsafe fn resume(saved_sp: usize) -> ! {
    let sp = saved_sp as u16;
    core::arch::asm!(
        "cli",
        "out {spl_io}, {sp_lo}",
        "out {sph_io}, {sp_hi}",
        "pop r31",
        "pop r30",
        "pop r29",
        "pop r28",
        "pop r27",
        "pop r26",
        "pop r25",
        "pop r24",
        "pop r23",
        "pop r22",
        "pop r21",
        "pop r20",
        "pop r19",
        "pop r18",
        "pop r17",
        "pop r16",
        "pop r15",
        "pop r14",
        "pop r13",
        "pop r12",
        "pop r11",
        "pop r10",
        "pop r9",
        "pop r8",
        "pop r7",
        "pop r6",
        "pop r5",
        "pop r4",
        "pop r3",
        "pop r2",
        "pop r1",
        "pop r0",
        "out {sreg_io}, r0",
        "pop r0",
        "ret",
        sp_lo = in(reg) sp as u8,
        sp_hi = in(reg) (sp >> 8) as u8,
        spl_io = const SPL,
        sph_io = const SPH,
        sreg_io = const SREG,
        options(noreturn),
    )
}
