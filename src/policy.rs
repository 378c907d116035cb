//! What happens when switching the live alternative fails halfway.
//!
//! A switch runs one of three paths, picked by [`select`] from constants
//! only:
//!
//! 1. [`SwitchPath::Direct`]: the new value already exists, nothing can fail.
//! 2. [`SwitchPath::Staged`]: the new value is built next to the variant
//!    first. A failure leaves the old alternative untouched.
//! 3. [`SwitchPath::Guarded`]: the new value has to be built after the old one
//!    is gone. A failure is handed to the variant's [`Policy`].
//!
//! Under [`DisallowValueless`] path 3 is [`SwitchPath::Forbidden`] and such a
//! switch fails to compile:
//!
//! ```compile_fail
//! use variety::{policy::DisallowValueless, variant};
//!
//! let mut v = <variant!(i32, String; DisallowValueless)>::new(5);
//! v.emplace_with(|| String::from("in place"));
//! ```

use core::convert::Infallible;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;

use crate::discriminant::Discriminant;
use crate::internals::{CoProd, Install, TypeList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    LetVariantDecide,
    Fallback,
    DisallowValueless,
}

/// Strategy applied when an in-place construction fails.
pub unsafe trait Policy<L: TypeList> {
    const KIND: PolicyKind;

    /// Whether the variant can ever be valueless.
    const HAS_SENTINEL: bool;

    /// Called after the old alternative was destroyed and building the new one
    /// failed. Leaves the storage in a state matching the returned tag.
    ///
    /// # Safety
    ///
    /// `storage` must point to `L`'s storage with no live alternative.
    unsafe fn recover(storage: *mut ()) -> Discriminant;
}

/// The variant becomes valueless when an in-place construction fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LetVariantDecide;

/// Alternative 0 is default constructed when an in-place construction fails.
///
/// Only available when alternative 0 is `Default`. Its `default` must not
/// panic, if it does while recovering the process aborts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fallback;

/// The variant is never valueless. In-place constructions that can fail
/// are rejected at compile time.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisallowValueless;

unsafe impl<L: TypeList> Policy<L> for LetVariantDecide {
    const KIND: PolicyKind = PolicyKind::LetVariantDecide;
    const HAS_SENTINEL: bool = true;

    #[inline]
    unsafe fn recover(_: *mut ()) -> Discriminant {
        Discriminant::SENTINEL
    }
}

unsafe impl<A: Default, R: TypeList> Policy<CoProd<A, R>> for Fallback {
    const KIND: PolicyKind = PolicyKind::Fallback;
    const HAS_SENTINEL: bool = false;

    unsafe fn recover(storage: *mut ()) -> Discriminant {
        struct Abort;

        impl Drop for Abort {
            fn drop(&mut self) {
                // a panic while unwinding aborts
                panic!("the fallback alternative panicked while being constructed");
            }
        }

        let abort = Abort;
        storage.cast::<A>().write(A::default());
        core::mem::forget(abort);
        Discriminant::new(0)
    }
}

unsafe impl<L: TypeList> Policy<L> for DisallowValueless {
    const KIND: PolicyKind = PolicyKind::DisallowValueless;
    const HAS_SENTINEL: bool = false;

    unsafe fn recover(_: *mut ()) -> Discriminant {
        unreachable!("in-place construction is rejected at compile time under DisallowValueless")
    }
}

/// A way of constructing an alternative `T`.
pub trait Construct<T> {
    type Error;

    /// Construction can't fail.
    const NOTHROW: bool;
    /// The value may be built outside of the variant and moved in.
    const RELOCATABLE: bool;

    fn construct(self) -> Result<T, Self::Error>;
}

/// An already constructed value.
pub struct Value<T>(pub T);
/// Builds the value before the old alternative is destroyed.
pub struct Staged<F>(pub F);
/// Like [`Staged`], for a constructor that reports failure with `Err`.
pub struct TryStaged<F>(pub F);
/// Builds the value after the old alternative was destroyed.
pub struct InPlace<F>(pub F);
/// Like [`InPlace`], for a constructor that reports failure with `Err`.
pub struct TryInPlace<F>(pub F);

impl<T> Construct<T> for Value<T> {
    type Error = Infallible;
    const NOTHROW: bool = true;
    const RELOCATABLE: bool = true;

    #[inline]
    fn construct(self) -> Result<T, Infallible> {
        Ok(self.0)
    }
}

impl<T, F: FnOnce() -> T> Construct<T> for Staged<F> {
    type Error = Infallible;
    const NOTHROW: bool = false;
    const RELOCATABLE: bool = true;

    #[inline]
    fn construct(self) -> Result<T, Infallible> {
        Ok((self.0)())
    }
}

impl<T, E, F: FnOnce() -> Result<T, E>> Construct<T> for TryStaged<F> {
    type Error = E;
    const NOTHROW: bool = false;
    const RELOCATABLE: bool = true;

    #[inline]
    fn construct(self) -> Result<T, E> {
        (self.0)()
    }
}

impl<T, F: FnOnce() -> T> Construct<T> for InPlace<F> {
    type Error = Infallible;
    const NOTHROW: bool = false;
    const RELOCATABLE: bool = false;

    #[inline]
    fn construct(self) -> Result<T, Infallible> {
        Ok((self.0)())
    }
}

impl<T, E, F: FnOnce() -> Result<T, E>> Construct<T> for TryInPlace<F> {
    type Error = E;
    const NOTHROW: bool = false;
    const RELOCATABLE: bool = false;

    #[inline]
    fn construct(self) -> Result<T, E> {
        (self.0)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPath {
    Direct,
    Staged,
    Guarded(PolicyKind),
    Forbidden,
}

pub const fn select(nothrow: bool, relocatable: bool, policy: PolicyKind) -> SwitchPath {
    if nothrow {
        SwitchPath::Direct
    } else if relocatable {
        SwitchPath::Staged
    } else {
        match policy {
            PolicyKind::DisallowValueless => SwitchPath::Forbidden,
            kind => SwitchPath::Guarded(kind),
        }
    }
}

struct Admit<L, P, T, C>(PhantomData<(L, P, T, C)>);

impl<L: TypeList, P: Policy<L>, T, C: Construct<T>> Admit<L, P, T, C> {
    const PATH: SwitchPath = select(C::NOTHROW, C::RELOCATABLE, P::KIND);
    const OK: () = assert!(
        !matches!(Self::PATH, SwitchPath::Forbidden),
        "this alternative can only be constructed in place and may fail, which DisallowValueless forbids"
    );
}

/// Runs the policy's recovery unless disarmed.
struct Recovery<'a, L: TypeList, P: Policy<L>> {
    storage: *mut (),
    tag: &'a mut Discriminant,
    index: usize,
    mark: PhantomData<(L, P)>,
}

impl<L: TypeList, P: Policy<L>> Recovery<'_, L, P> {
    #[inline]
    fn finish(self) {
        *self.tag = Discriminant::new(self.index);
        core::mem::forget(self);
    }
}

impl<L: TypeList, P: Policy<L>> Drop for Recovery<'_, L, P> {
    fn drop(&mut self) {
        *self.tag = unsafe { P::recover(self.storage) };
        crate::trace!(
            alternative = self.index,
            policy = ?P::KIND,
            valueless = self.tag.is_sentinel(),
            "constructing an alternative in place failed"
        );
    }
}

/// Ends the alternative being replaced, if any.
#[inline(always)]
unsafe fn retire<L: TypeList>(storage: *mut (), old: Option<usize>) {
    if L::LIFETIME.replace.is_trivial() {
        return;
    }
    if let Some(old) = old {
        L::destroy_at(storage, old);
    }
}

/// Replaces whatever `storage` holds with alternative `index`, built by `ctor`.
///
/// # Safety
///
/// `storage` must point to `L`'s storage, `tag` must describe its content and
/// `T` must be the alternative at `index`.
pub(crate) unsafe fn switch<L, P, T, C>(
    storage: *mut (),
    tag: &mut Discriminant,
    index: usize,
    ctor: C,
) -> Result<*mut T, C::Error>
where
    L: TypeList,
    P: Policy<L>,
    C: Construct<T>,
{
    let () = Admit::<L, P, T, C>::OK;

    let slot = storage.cast::<T>();
    let old = tag.get();

    match Admit::<L, P, T, C>::PATH {
        SwitchPath::Direct | SwitchPath::Staged => {
            let value = ctor.construct()?;
            let install = Install {
                slot,
                value: ManuallyDrop::new(value),
                tag,
                index,
            };
            retire::<L>(storage, old);
            drop(install);
        }
        SwitchPath::Guarded(_) => {
            let recovery = Recovery::<L, P> {
                storage,
                tag,
                index,
                mark: PhantomData,
            };
            retire::<L>(storage, old);
            let value = ctor.construct()?;
            slot.write(value);
            recovery.finish();
        }
        SwitchPath::Forbidden => unreachable!(),
    }

    Ok(slot)
}
