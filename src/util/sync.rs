#[cfg(feature = "threadsafe")]
pub(crate) mod inner {
    use std::sync::{LockResult, Mutex, MutexGuard};

    /// Marker to identify an implementing instance as thread-safe.
    pub trait SendAndSync: Send + Sync {}

    /// Shared ownership of archives, fetchers and resources.
    pub(crate) type Shared<T> = std::sync::Arc<T>;

    /// A write-once cell for lazily computed service data.
    pub(crate) type Memo<T> = std::sync::OnceLock<T>;

    pub(crate) struct Lock<T>(Mutex<T>);

    impl<T> Lock<T> {
        pub(crate) fn new(t: T) -> Self {
            Self(Mutex::new(t))
        }

        pub(crate) fn lock(&self) -> LockResult<MutexGuard<'_, T>> {
            self.0.lock()
        }
    }
}

#[cfg(not(feature = "threadsafe"))]
pub(crate) mod inner {
    use std::cell::{RefCell, RefMut};

    pub trait SendAndSync {}

    pub(crate) type Shared<T> = std::rc::Rc<T>;

    pub(crate) type Memo<T> = std::cell::OnceCell<T>;

    pub(crate) struct Lock<T>(RefCell<T>);

    impl<T> Lock<T> {
        pub(crate) fn new(t: T) -> Self {
            Self(RefCell::new(t))
        }

        pub(crate) fn lock(&self) -> std::sync::LockResult<RefMut<'_, T>> {
            Ok(self.0.borrow_mut())
        }
    }
}

pub use inner::SendAndSync;
pub(crate) use inner::{Lock, Memo, Shared};

impl<#[cfg(feature = "threadsafe")] A: Send + Sync, #[cfg(not(feature = "threadsafe"))] A>
    SendAndSync for A
{
}

impl<T> std::fmt::Debug for Lock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Lock { .. }")
    }
}
