//! A closed sum type over a type-level list of alternatives.
//!
//! A [`Variant`] holds exactly one value of one of its alternatives inline,
//! together with a one byte [`Discriminant`]. What happens when replacing the
//! live alternative fails halfway is decided by its [policy](policy), and
//! one or more variants can be visited at once through [`dispatch`].
//!
//! ```
//! use variety::{parts::P1, variant};
//!
//! let mut v = <variant!(i32, String)>::new(5);
//! assert_eq!(v.get::<i32, _>(), Ok(&5));
//!
//! v.set(String::from("five"));
//! assert_eq!(v.index(), 1);
//! assert_eq!(v.try_get::<_, P1>().map(String::as_str), Some("five"));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(rust_2018_idioms)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

use core::marker::PhantomData;
use core::mem::{ManuallyDrop, MaybeUninit};

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::trace!(target: "variety", $($arg)*);
        }
    };
}
pub(crate) use trace;

pub mod compose;
mod descriptor;
mod discriminant;
pub mod dispatch;
mod error;
mod imp;
mod internals;
pub mod policy;


pub use descriptor::AlternativeDescriptor;
pub use discriminant::{Discriminant, VALUELESS};
pub use error::AccessError;

pub mod traits {
    pub use crate::internals::{
        Apply, ApplyImp, CloneList, Contains, Func, GetAny, IntoInner, Peano, TypeList,
    };
}

pub mod parts {
    pub use crate::internals::{descriptor, CNil, CoProd, End, Entry, Nil, Union, S, Z};
    include!(concat!(env!("OUT_DIR"), "/num.rs"));
}

use compose::Lifetime;
use dispatch::{Exclusive, Owned, Shared, Table};
use policy::{
    Construct, InPlace, LetVariantDecide, Policy, PolicyKind, Staged, TryInPlace, TryStaged,
    Value,
};
use traits::*;

#[macro_export]
macro_rules! tlist {
    () => { $crate::parts::CNil };
    ($first:ty $(, $type:ty)* $(,)?) => {
        $crate::parts::CoProd<$first, $crate::tlist!($($type),*)>
    };
}

/// `variant!(A, B, C)`, or `variant!(A, B, C; Policy)`.
#[macro_export]
macro_rules! variant {
    ($($items:ty),* ; $policy:ty) => {
        $crate::Variant<$crate::tlist!($($items),*), $policy>
    };
    ($($items:ty),* $(,)?) => { $crate::Variant<$crate::tlist!($($items),*)> };
}

#[doc(hidden)]
#[macro_export]
macro_rules! match_any_internal {
    (@internal ($value:expr) [$($output:tt)*] [
        [($nil:pat) ($nil_arm:expr)]
    ]) => {
        match $value {
            $($output)*
            $nil => $nil_arm,
        }
    };
    (@internal ($value:expr) [$($output:tt)*] [
        [($pat:pat) ($arm:expr)]
        $([($rest_pat:pat) ($rest_arm:expr)])*
    ]) => {
        $crate::match_any_internal! {
            @internal ($value) [
                $($output)*
                $pat => $arm,
            ] [
                $([($crate::parts::CoProd::Rest($rest_pat)) ($rest_arm)])*
            ]
        }
    };
}

/// Matches the cons value returned by [`Variant::into_inner`] or
/// [`Variant::as_coprod`], one arm per alternative.
#[macro_export]
macro_rules! match_any {
    (match $value:expr => {
        $($pat:pat => $arm:expr $(,)?)*
    }) => {
        $crate::match_any_internal! {
            @internal ($value) [] [$([($crate::parts::CoProd::Item($pat)) ($arm)])* [(nil) ({
                let _: $crate::parts::CNil = nil;
                match nil {}
            })]]
        }
    };
}

include!(concat!(env!("OUT_DIR"), "/aliases.rs"));

/// One live value out of the alternatives `L`.
///
/// `P` decides whether the variant may become valueless, see [`policy`].
pub struct Variant<L: TypeList, P: Policy<L> = LetVariantDecide> {
    storage: MaybeUninit<L::Storage>,
    tag: Discriminant,
    policy: PhantomData<P>,
}

impl<L: TypeList, P: Policy<L>> Drop for Variant<L, P> {
    fn drop(&mut self) {
        if L::LIFETIME.destroy.is_trivial() {
            return;
        }

        if let Some(index) = self.tag.get() {
            unsafe { L::destroy_at(self.as_mut_ptr(), index) }
        }
    }
}

impl<L: TypeList, P: Policy<L>> Variant<L, P> {
    pub const COUNT: usize = L::COUNT;
    pub const LIFETIME: Lifetime = L::LIFETIME;
    pub const POLICY: PolicyKind = P::KIND;

    const FITS: () = assert!(
        L::COUNT <= Discriminant::MAX_ALTERNATIVES,
        "too many alternatives for a one byte discriminant"
    );

    #[inline]
    pub fn new<N, A>(value: A) -> Self
    where
        L: Contains<A, N>,
        N: Peano,
    {
        Self::new_with(move || value)
    }

    #[inline]
    pub fn new_with<N, A, F: FnOnce() -> A>(value: F) -> Self
    where
        L: Contains<A, N>,
        N: Peano,
    {
        let () = Self::FITS;

        let mut storage = MaybeUninit::<L::Storage>::uninit();
        unsafe { storage.as_mut_ptr().cast::<A>().write(value()) }

        Self {
            storage,
            tag: Discriminant::new(N::VALUE),
            policy: PhantomData,
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const () {
        self.storage.as_ptr().cast()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut () {
        self.storage.as_mut_ptr().cast()
    }

    #[inline]
    pub fn discriminant(&self) -> Discriminant {
        self.tag
    }

    /// The live index, or [`VALUELESS`].
    #[inline]
    pub fn index(&self) -> usize {
        self.tag.index()
    }

    #[inline]
    pub fn is_valueless(&self) -> bool {
        P::HAS_SENTINEL && self.tag.is_sentinel()
    }

    #[inline]
    pub fn index_of<A, N>() -> usize
    where
        L: Contains<A, N>,
        N: Peano,
    {
        N::VALUE
    }

    #[inline]
    pub fn is<A, N>(&self) -> bool
    where
        L: Contains<A, N>,
        N: Peano,
    {
        self.tag.get() == Some(N::VALUE)
    }

    /// Facts about the live alternative.
    pub fn descriptor(&self) -> Option<AlternativeDescriptor> {
        self.tag.get().map(internals::descriptor::<L>)
    }

    fn check(&self, expected: usize) -> Result<(), AccessError> {
        match self.tag.get() {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(AccessError::WrongAlternative { expected, found }),
            None => Err(AccessError::Empty),
        }
    }

    #[inline]
    pub fn get<A, N>(&self) -> Result<&A, AccessError>
    where
        L: Contains<A, N>,
        N: Peano,
    {
        self.check(N::VALUE)?;
        unsafe { Ok(&*(self.as_ptr() as *const A)) }
    }

    #[inline]
    pub fn get_mut<A, N>(&mut self) -> Result<&mut A, AccessError>
    where
        L: Contains<A, N>,
        N: Peano,
    {
        self.check(N::VALUE)?;
        unsafe { Ok(&mut *(self.as_mut_ptr() as *mut A)) }
    }

    #[inline]
    pub fn try_get<A, N>(&self) -> Option<&A>
    where
        L: Contains<A, N>,
        N: Peano,
    {
        self.get().ok()
    }

    #[inline]
    pub fn try_get_mut<A, N>(&mut self) -> Option<&mut A>
    where
        L: Contains<A, N>,
        N: Peano,
    {
        self.get_mut().ok()
    }

    /// Replaces the live alternative with alternative `N`, built by `ctor`.
    ///
    /// When and how a failing constructor is handled depends on the kind of
    /// constructor and on the policy, see [`policy`].
    pub fn construct<A, N, C>(&mut self, ctor: C) -> Result<&mut A, C::Error>
    where
        L: Contains<A, N>,
        N: Peano,
        C: Construct<A>,
    {
        let storage = self.as_mut_ptr();
        unsafe {
            policy::switch::<L, P, A, C>(storage, &mut self.tag, N::VALUE, ctor)
                .map(|slot| &mut *slot)
        }
    }

    pub fn emplace<A, N>(&mut self, value: A) -> &mut A
    where
        L: Contains<A, N>,
        N: Peano,
    {
        match self.construct(Value(value)) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn set<A, N>(&mut self, value: A)
    where
        L: Contains<A, N>,
        N: Peano,
    {
        self.emplace(value);
    }

    /// Destroys the live alternative, then runs `value` to build the new one.
    ///
    /// If `value` panics the policy decides what the variant holds while the
    /// panic propagates.
    pub fn emplace_with<A, N, F>(&mut self, value: F) -> &mut A
    where
        L: Contains<A, N>,
        N: Peano,
        F: FnOnce() -> A,
    {
        match self.construct(InPlace(value)) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`emplace_with`](Self::emplace_with), for a constructor that fails
    /// with `Err`. The error is returned unchanged.
    pub fn try_emplace_with<A, N, E, F>(&mut self, value: F) -> Result<&mut A, E>
    where
        L: Contains<A, N>,
        N: Peano,
        F: FnOnce() -> Result<A, E>,
    {
        self.construct(TryInPlace(value))
    }

    /// Runs `value` first and only replaces the live alternative if it
    /// succeeds. A panic leaves the variant untouched.
    pub fn replace_with<A, N, F>(&mut self, value: F) -> &mut A
    where
        L: Contains<A, N>,
        N: Peano,
        F: FnOnce() -> A,
    {
        match self.construct(Staged(value)) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn try_replace_with<A, N, E, F>(&mut self, value: F) -> Result<&mut A, E>
    where
        L: Contains<A, N>,
        N: Peano,
        F: FnOnce() -> Result<A, E>,
    {
        self.construct(TryStaged(value))
    }

    /// Relocating an alternative can't fail, so this never makes either
    /// variant valueless.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other)
    }

    /// Destroys the live alternative and leaves the variant valueless.
    fn clear(&mut self) {
        debug_assert!(P::HAS_SENTINEL);

        if let Some(index) = self.tag.get() {
            self.tag = Discriminant::SENTINEL;
            unsafe { L::destroy_at(self.as_mut_ptr(), index) }
        }
    }

    #[inline]
    pub fn as_coprod<'a>(&'a self) -> Result<L::Ref, AccessError>
    where
        L: GetAny<'a>,
    {
        let index = self.tag.get().ok_or(AccessError::Empty)?;
        unsafe { Ok(L::_get_any(self.as_ptr(), index)) }
    }

    #[inline]
    pub fn as_coprod_mut<'a>(&'a mut self) -> Result<L::RefMut, AccessError>
    where
        L: GetAny<'a>,
    {
        let index = self.tag.get().ok_or(AccessError::Empty)?;
        unsafe { Ok(L::_get_any_mut(self.as_mut_ptr(), index)) }
    }

    #[inline]
    pub fn into_inner(self) -> Result<L, AccessError>
    where
        L: IntoInner,
    {
        let mut this = ManuallyDrop::new(self);
        let index = this.tag.get().ok_or(AccessError::Empty)?;
        unsafe { Ok(L::_into_inner(this.as_mut_ptr(), index)) }
    }

    #[inline]
    pub fn visit<'a, V, O>(&'a self, visitor: V) -> Result<O, AccessError>
    where
        ((Shared, L), ()): Table<'a, V, (), O>,
    {
        dispatch::dispatch(visitor, (self,))
    }

    #[inline]
    pub fn visit_mut<'a, V, O>(&'a mut self, visitor: V) -> Result<O, AccessError>
    where
        ((Exclusive, L), ()): Table<'a, V, (), O>,
    {
        dispatch::dispatch(visitor, (self,))
    }

    #[inline]
    pub fn into_visit<'a, V, O>(self, visitor: V) -> Result<O, AccessError>
    where
        ((Owned, L), ()): Table<'a, V, (), O>,
    {
        dispatch::dispatch(visitor, (self,))
    }
}
