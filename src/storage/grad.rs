use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Restores the previous gradient mode when dropped.
struct GradModeGuard {
    prev: bool,
}

impl GradModeGuard {
    fn disable() -> Self {
        let prev = GRAD_ENABLED.with(|enabled| enabled.replace(false));
        Self { prev }
    }
}

impl Drop for GradModeGuard {
    fn drop(&mut self) {
        GRAD_ENABLED.with(|enabled| enabled.set(self.prev));
    }
}

/// Returns whether in-place writes on tracked parameters are being recorded in this thread.
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(Cell::get)
}

/// Runs `f` with gradient tracking disabled for the current thread.
///
/// The previous mode is restored once `f` returns, also when it unwinds.
///
/// # Arguments
/// * `f` - The closure to run.
///
/// # Returns
/// Whatever `f` returns.
pub fn no_grad<T>(f: impl FnOnce() -> T) -> T {
    let _guard = GradModeGuard::disable();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_inside() {
        assert!(is_grad_enabled());
        no_grad(|| assert!(!is_grad_enabled()));
        assert!(is_grad_enabled());
    }

    #[test]
    fn nested() {
        no_grad(|| {
            no_grad(|| assert!(!is_grad_enabled()));
            assert!(!is_grad_enabled());
        });
        assert!(is_grad_enabled());
    }

    #[test]
    fn restored_after_error() {
        let res: Result<(), &str> = no_grad(|| Err("boom"));
        assert!(res.is_err());
        assert!(is_grad_enabled());
    }
}
