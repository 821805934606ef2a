//! Reader/writer guard around a shared resource.

use parking_lot::RwLock;

/// Owns a `T` and only lends it out inside closures.
///
/// Any number of readers may hold the resource at once; a writer holds it
/// alone. The lock is released when the closure returns or unwinds.
///
/// # Examples
///
/// ```
/// use hyperlambda::Synchronizer;
///
/// let counter = Synchronizer::new(0);
/// counter.write(|n| *n += 1);
/// assert_eq!(counter.read(|n| *n), 1);
/// ```
#[derive(Debug, Default)]
pub struct Synchronizer<T> {
    inner: RwLock<T>,
}

impl<T> Synchronizer<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
