use core::mem;

/// Facts about a single alternative, fixed at compile time.
///
/// Rust already knows everything the container needs to decide how an
/// alternative behaves: its layout and whether it has drop glue. Moves are
/// always bitwise and cannot fail, so there is no "move constructor" fact to
/// record.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct AlternativeDescriptor {
    pub size: usize,
    pub align: usize,
    /// `true` when dropping the alternative does nothing, this includes
    /// reference alternatives (`&T`, `&mut T`).
    pub trivially_destructible: bool,
    name: fn() -> &'static str,
}

impl AlternativeDescriptor {
    pub const fn of<T>() -> Self {
        Self {
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            trivially_destructible: !mem::needs_drop::<T>(),
            name: core::any::type_name::<T>,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        (self.name)()
    }
}

impl core::fmt::Debug for AlternativeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AlternativeDescriptor")
            .field("name", &self.name())
            .field("size", &self.size)
            .field("align", &self.align)
            .field("trivially_destructible", &self.trivially_destructible)
            .finish()
    }
}
