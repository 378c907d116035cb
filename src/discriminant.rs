/// Index reported for a variant that holds no alternative.
pub const VALUELESS: usize = usize::MAX;

/// The runtime tag of a [`Variant`](crate::Variant).
///
/// One byte wide. [`Discriminant::SENTINEL`] is reserved for "no alternative
/// is live" and is only ever stored by policies that allow valuelessness.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Discriminant(u8);

impl Discriminant {
    pub const SENTINEL: Self = Self(u8::MAX);

    /// Largest number of alternatives a variant can hold.
    pub const MAX_ALTERNATIVES: usize = u8::MAX as usize;

    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        debug_assert!(index < Self::MAX_ALTERNATIVES);
        Self(index as u8)
    }

    #[inline]
    pub const fn get(self) -> Option<usize> {
        if self.is_sentinel() {
            None
        } else {
            Some(self.0 as usize)
        }
    }

    /// The live index, or [`VALUELESS`].
    #[inline]
    pub const fn index(self) -> usize {
        match self.get() {
            Some(index) => index,
            None => VALUELESS,
        }
    }

    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == Self::SENTINEL.0
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}
