//! Keeps a panic inside a view from taking the whole process down.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs `f`, turning a panic into its message.
pub fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let msg = panic_message(payload.as_ref());
        tracing::error!("view panicked: {msg}");
        msg
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_values_through() {
        assert_eq!(guarded(|| 7), Ok(7));
    }

    #[test]
    fn captures_panic_messages() {
        assert_eq!(guarded(|| -> u8 { panic!("boom") }), Err("boom".to_string()));
        let n = 3;
        let err = guarded(|| -> u8 { panic!("bad row {n}") }).unwrap_err();
        assert_eq!(err, "bad row 3");
    }
}
