//! Key: opaque integer identity with the empty-slot sentinel carved out.

use core::num::NonZeroUsize;

/// Identity key for `RcuMap`.
///
/// Zero marks an empty slot in the table, so it can never be a key. Holding
/// a `NonZeroUsize` makes that unrepresentable and lets `Option<Key>` stay a
/// single word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Key(NonZeroUsize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("key 0 is reserved as the empty-slot sentinel")]
    Reserved,
}

impl Key {
    /// Returns `None` for the reserved value zero.
    #[inline]
    pub const fn new(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(n) => Some(Key(n)),
            None => None,
        }
    }

    /// Identity of a pointer. `None` for null.
    #[inline]
    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Option<Self> {
        Self::new(ptr.cast::<()>() as usize)
    }

    /// Identity of a live reference.
    ///
    /// Distinct live objects of non-zero size get distinct keys. References
    /// to zero-sized values may share an address, so they may share a key.
    #[inline]
    pub fn of<T: ?Sized>(r: &T) -> Self {
        let addr = (r as *const T).cast::<()>() as usize;
        // References are never null, dangling ZST references included.
        Self::new(addr).unwrap_or(Key(NonZeroUsize::MIN))
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for Key {
    fn from(n: NonZeroUsize) -> Self {
        Key(n)
    }
}

impl TryFrom<usize> for Key {
    type Error = KeyError;

    fn try_from(raw: usize) -> Result<Self, Self::Error> {
        Key::new(raw).ok_or(KeyError::Reserved)
    }
}

impl From<Key> for usize {
    fn from(k: Key) -> usize {
        k.get()
    }
}
