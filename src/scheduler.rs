//! Round-robin task selection

use crate::task::{TaskControl, TaskFlags};

/// Pick the next runnable task, scanning one full cycle that starts one slot
/// past `current` and visits every slot, the caller included last. A task
/// that yields while being the only eligible one is therefore re-selected.
///
/// Sleep expiry is applied here: a sleeper whose `wakeup_time` has passed
/// gets its SLEEPING bit cleared at the moment it is selected. PAUSED
/// excludes a task no matter what else is set.
///
/// Returns `None` when a whole cycle finds nothing; the dispatcher idles and
/// retries.
pub fn select_next(tasks: &mut [TaskControl], current: u8, now: u32) -> Option<u8> {
    let count = tasks.len() as u8;
    let start = (current + 1) % count;
    let mut i = start;
    loop {
        let task = &mut tasks[i as usize];
        if !task.flags.contains(TaskFlags::PAUSED) {
            if !task.flags.contains(TaskFlags::SLEEPING) {
                return Some(i);
            }
            if task.wakeup_time <= now {
                task.flags.remove(TaskFlags::SLEEPING);
                return Some(i);
            }
        }
        i = (i + 1) % count;
        if i == start {
            return None;
        }
    }
}
