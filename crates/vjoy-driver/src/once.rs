//! Process-wide load-once cell for driver handles.

use std::sync::{Arc, OnceLock};

/// Return the handle cached in `cell`, or run `load` to produce one.
///
/// A failed `load` leaves the cell empty so a later call can retry. `first`
/// runs once, on the handle that ends up cached, and never again after.
/// When two threads race, the loser's handle is dropped and its `first` is
/// skipped.
pub fn load_once<T, E>(
    cell: &OnceLock<Arc<T>>,
    load: impl FnOnce() -> Result<T, E>,
    first: impl FnOnce(&T),
) -> Result<Arc<T>, E> {
    if let Some(handle) = cell.get() {
        return Ok(handle.clone());
    }
    let loaded = Arc::new(load()?);
    let mut fresh = false;
    let handle = cell
        .get_or_init(|| {
            fresh = true;
            loaded
        })
        .clone();
    if fresh {
        first(&handle);
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn failed_load_can_be_retried() {
        let cell = OnceLock::new();
        let hooks = Cell::new(0);

        let err = load_once(&cell, || Err::<u16, _>("missing"), |_| hooks.set(hooks.get() + 1));
        assert_eq!(err.unwrap_err(), "missing");
        assert!(cell.get().is_none());
        assert_eq!(hooks.get(), 0);

        let handle = load_once(&cell, || Ok::<_, &str>(0x0204u16), |_| hooks.set(hooks.get() + 1));
        assert_eq!(*handle.unwrap(), 0x0204);
        assert_eq!(hooks.get(), 1);
    }

    #[test]
    fn loaded_handle_is_reused_and_hook_runs_once() {
        let cell = OnceLock::new();
        let loads = Cell::new(0);
        let hooks = Cell::new(0);
        let load = |v: u16| {
            loads.set(loads.get() + 1);
            Ok::<_, &str>(v)
        };

        let a = load_once(&cell, || load(1), |v| {
            assert_eq!(*v, 1);
            hooks.set(hooks.get() + 1);
        })
        .unwrap();
        let b = load_once(&cell, || load(2), |_| hooks.set(hooks.get() + 1)).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b, 1);
        assert_eq!(loads.get(), 1);
        assert_eq!(hooks.get(), 1);
    }

    #[test]
    fn cached_handle_survives_a_failing_loader() {
        let cell = OnceLock::new();
        load_once(&cell, || Ok::<_, &str>(7u16), |_| {}).unwrap();
        let again = load_once(&cell, || Err("unreachable"), |_| panic!("hook ran twice"));
        assert_eq!(*again.unwrap(), 7);
    }
}
