//! How each lifetime operation of a [`Variant`](crate::Variant) is implemented
//! for a given alternative set.
//!
//! The decision is made once per alternative set: [`Lifetime`] is folded
//! over the alternatives' descriptors in
//! [`TypeList::LIFETIME`](crate::traits::TypeList::LIFETIME) and then only
//! read through constants, so a trivial operation costs nothing at runtime.
//!
//! Relocation is absent from the fold: moving a variant is a bitwise copy of
//! its bytes and cannot fail. Cloning is absent too. A clone is forbidden
//! exactly when some alternative is not `Clone`, which Rust expresses by the
//! absence of the `Clone` impl ([`CloneList`](crate::traits::CloneList)), and
//! synthesized otherwise.

use crate::descriptor::AlternativeDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Nothing beyond what the raw storage already does.
    Trivial,
    /// Visit the live alternative and run its own operation.
    Synthesized,
}

impl Behavior {
    #[inline]
    pub const fn is_trivial(self) -> bool {
        matches!(self, Self::Trivial)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    /// Dropping the variant.
    pub destroy: Behavior,
    /// Writing a new alternative over the live one.
    pub replace: Behavior,
}

impl Lifetime {
    /// The lifetime of an empty alternative set, the start of the fold.
    pub const TRIVIAL: Self = Self {
        destroy: Behavior::Trivial,
        replace: Behavior::Trivial,
    };

    /// Adds one alternative to the set.
    pub const fn with(self, alternative: &AlternativeDescriptor) -> Self {
        let destroy = if alternative.trivially_destructible {
            self.destroy
        } else {
            Behavior::Synthesized
        };

        // the old alternative is destroyed, the new one moved in
        Self {
            destroy,
            replace: destroy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TypeList;
    use crate::tlist;
    use std::string::String;
    use std::vec::Vec;

    #[test]
    fn trivial_set() {
        let lifetime = <tlist!(u8, i64, &'static str)>::LIFETIME;
        assert_eq!(lifetime, Lifetime::TRIVIAL);
        assert_eq!(<tlist!()>::LIFETIME, Lifetime::TRIVIAL);
    }

    #[test]
    fn one_owner_makes_destroy_synthesized() {
        let lifetime = <tlist!(u8, String, u32)>::LIFETIME;
        assert_eq!(lifetime.destroy, Behavior::Synthesized);
        assert_eq!(lifetime.replace, Behavior::Synthesized);
    }

    #[test]
    fn fold_order_does_not_matter() {
        assert_eq!(
            <tlist!(Vec<u8>, u8)>::LIFETIME,
            <tlist!(u8, Vec<u8>)>::LIFETIME
        );
    }
}
