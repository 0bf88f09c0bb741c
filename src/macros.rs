//! Task definition helpers

/// Reserve a statically allocated task stack and evaluate to the
/// `&'static mut [u8]` that `insert_task` takes.
///
/// The array lands in `.noinit`: painting (when stack reporting is on) or
/// first use initializes it, zeroing it at boot would be wasted time.
///
/// ```ignore
/// insert_task(0, blink, task_stack!());      // DEFAULT_STACK_SIZE bytes
/// insert_task(1, worker, task_stack!(256));  // explicit size
/// ```
#[macro_export]
macro_rules! task_stack {
    () => {
        $crate::task_stack!($crate::config::DEFAULT_STACK_SIZE)
    };
    ($size:expr) => {{
        #[link_section = ".noinit"]
        static mut STACK: [u8; $size] = [0u8; $size];
        // One static per macro use; nothing else can see it.
        unsafe { &mut *core::ptr::addr_of_mut!(STACK) }
    }};
}

/// Define a task entry from a plain body. Expands to the non-returning
/// wrapper the kernel contract requires: run the body, yield, run it again.
/// Falling off the end of the body is therefore safe, even though the entry
/// itself never returns.
///
/// ```ignore
/// task_fn! {
///     fn blink() {
///         toggle_led();
///         sleep(500);
///     }
/// }
/// ```
#[macro_export]
macro_rules! task_fn {
    ($vis:vis fn $name:ident() $body:block) => {
        $vis fn $name() -> ! {
            loop {
                $body
                $crate::kernel::yield_now();
            }
        }
    };
}
