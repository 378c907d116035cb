use core::mem::{self, ManuallyDrop};
use core::ptr;

use crate::compose::Lifetime;
use crate::descriptor::AlternativeDescriptor;
use crate::discriminant::Discriminant;
use crate::policy::{self, Policy, Staged};

#[inline(always)]
pub(crate) unsafe fn unreachable_unchecked() -> ! {
    #[cfg(debug_assertions)]
    unreachable!();
    #[cfg(not(debug_assertions))]
    core::hint::unreachable_unchecked()
}

pub enum CNil {}
pub enum CoProd<A, B> {
    Item(A),
    Rest(B),
}

/// Storage of the empty alternative set.
#[repr(C)]
pub struct Nil;

/// Storage for `A` overlapping the storage of every later alternative.
#[repr(C)]
#[allow(dead_code)]
pub union Union<A, R> {
    head: ManuallyDrop<A>,
    tail: ManuallyDrop<R>,
}

/// Node of a pointer list. Nested `Entry`s of the same element type are laid
/// out like an array, so the list can be read through a pointer to its
/// first element.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Entry<H, T>(pub H, pub T);
#[repr(C)]
#[derive(Clone, Copy)]
pub struct End;

pub struct Z;
pub struct S<N>(N);

pub trait Seal {}
pub trait Peano: Seal {
    const VALUE: usize;
}
impl Seal for Z {}
impl<N: Seal> Seal for S<N> {}
impl Peano for Z {
    const VALUE: usize = 0;
}
impl<N: Peano> Peano for S<N> {
    const VALUE: usize = N::VALUE + 1;
}

/// A list of alternatives, built with [`tlist!`](crate::tlist).
pub unsafe trait TypeList: Sized {
    const COUNT: usize;
    const LIFETIME: Lifetime;

    /// Raw storage big enough and aligned for every alternative. Each
    /// alternative lives at offset 0.
    type Storage;

    #[doc(hidden)]
    fn descriptor_at(index: usize) -> Option<AlternativeDescriptor>;

    /// Drops the alternative at `index` in place.
    ///
    /// # Safety
    ///
    /// `ptr` must point to this list's storage, and the alternative at
    /// `index` must be live. It is dead afterwards.
    unsafe fn destroy_at(ptr: *mut (), index: usize);
}

unsafe impl TypeList for CNil {
    const COUNT: usize = 0;
    const LIFETIME: Lifetime = Lifetime::TRIVIAL;

    type Storage = Nil;

    fn descriptor_at(_: usize) -> Option<AlternativeDescriptor> {
        None
    }

    #[inline(always)]
    unsafe fn destroy_at(_: *mut (), _: usize) {
        unreachable_unchecked()
    }
}

unsafe impl<A, R: TypeList> TypeList for CoProd<A, R> {
    const COUNT: usize = R::COUNT + 1;
    const LIFETIME: Lifetime = R::LIFETIME.with(&AlternativeDescriptor::of::<A>());

    type Storage = Union<A, R::Storage>;

    fn descriptor_at(index: usize) -> Option<AlternativeDescriptor> {
        match index {
            0 => Some(AlternativeDescriptor::of::<A>()),
            _ => R::descriptor_at(index - 1),
        }
    }

    #[inline]
    unsafe fn destroy_at(ptr: *mut (), index: usize) {
        if index == 0 {
            if mem::needs_drop::<A>() {
                ptr.cast::<A>().drop_in_place();
            }
        } else {
            R::destroy_at(ptr, index.wrapping_sub(1))
        }
    }
}

/// The descriptor of alternative `index` of `L`.
///
/// # Panics
///
/// If `index` is out of bounds.
pub fn descriptor<L: TypeList>(index: usize) -> AlternativeDescriptor {
    match L::descriptor_at(index) {
        Some(descriptor) => descriptor,
        None => panic!(
            "alternative {} out of bounds for a list of {}",
            index,
            L::COUNT
        ),
    }
}

pub unsafe trait Contains<T, N>: TypeList {}
unsafe impl<T, R: TypeList> Contains<T, Z> for CoProd<T, R> {}
unsafe impl<T, R: Contains<T, N>, U, N> Contains<T, S<N>> for CoProd<U, R> {}

pub trait IntoInner: TypeList {
    #[doc(hidden)]
    unsafe fn _into_inner(ptr: *mut (), index: usize) -> Self;
}

pub trait GetAny<'a>: TypeList {
    type Ref: 'a;
    type RefMut: 'a;

    #[doc(hidden)]
    unsafe fn _get_any(ptr: *const (), index: usize) -> Self::Ref;
    #[doc(hidden)]
    unsafe fn _get_any_mut(ptr: *mut (), index: usize) -> Self::RefMut;
}

impl IntoInner for CNil {
    #[inline(always)]
    unsafe fn _into_inner(_: *mut (), _: usize) -> Self {
        unreachable_unchecked()
    }
}

impl GetAny<'_> for CNil {
    type Ref = CNil;
    type RefMut = CNil;

    #[inline(always)]
    unsafe fn _get_any(_: *const (), _: usize) -> Self::Ref {
        unreachable_unchecked()
    }

    #[inline(always)]
    unsafe fn _get_any_mut(_: *mut (), _: usize) -> Self::RefMut {
        unreachable_unchecked()
    }
}

impl<A, B: IntoInner> IntoInner for CoProd<A, B> {
    #[inline(always)]
    unsafe fn _into_inner(ptr: *mut (), index: usize) -> Self {
        if index == 0 {
            Self::Item(ptr.cast::<A>().read())
        } else {
            Self::Rest(B::_into_inner(ptr, index.wrapping_sub(1)))
        }
    }
}

impl<'a, A: 'a, B: GetAny<'a>> GetAny<'a> for CoProd<A, B> {
    type Ref = CoProd<&'a A, B::Ref>;
    type RefMut = CoProd<&'a mut A, B::RefMut>;

    #[inline]
    unsafe fn _get_any(ptr: *const (), index: usize) -> Self::Ref {
        if index == 0 {
            CoProd::Item(&*(ptr as *const A))
        } else {
            CoProd::Rest(B::_get_any(ptr, index.wrapping_sub(1)))
        }
    }

    #[inline]
    unsafe fn _get_any_mut(ptr: *mut (), index: usize) -> Self::RefMut {
        if index == 0 {
            CoProd::Item(&mut *(ptr as *mut A))
        } else {
            CoProd::Rest(B::_get_any_mut(ptr, index.wrapping_sub(1)))
        }
    }
}

/// An alternative set whose alternatives are all `Clone`.
pub unsafe trait CloneList: TypeList {
    #[doc(hidden)]
    unsafe fn clone_at(src: *const (), index: usize, dst: *mut ());

    /// Tagged two operand visit: peels the source's alternative and compares
    /// its static position `orig` with the destination's tag.
    #[doc(hidden)]
    unsafe fn clone_into<L: TypeList, P: Policy<L>>(
        dst: *mut (),
        tag: &mut Discriminant,
        src: *const (),
        src_index: usize,
        orig: usize,
    );
}

unsafe impl CloneList for CNil {
    #[inline(always)]
    unsafe fn clone_at(_: *const (), _: usize, _: *mut ()) {
        unreachable_unchecked()
    }

    #[inline(always)]
    unsafe fn clone_into<L: TypeList, P: Policy<L>>(
        _: *mut (),
        _: &mut Discriminant,
        _: *const (),
        _: usize,
        _: usize,
    ) {
        unreachable_unchecked()
    }
}

unsafe impl<T: Clone, R: CloneList> CloneList for CoProd<T, R> {
    #[inline]
    unsafe fn clone_at(src: *const (), index: usize, dst: *mut ()) {
        if index == 0 {
            let source = &*(src as *const T);
            dst.cast::<T>().write(source.clone());
        } else {
            R::clone_at(src, index.wrapping_sub(1), dst)
        }
    }

    unsafe fn clone_into<L: TypeList, P: Policy<L>>(
        dst: *mut (),
        tag: &mut Discriminant,
        src: *const (),
        src_index: usize,
        orig: usize,
    ) {
        if src_index != 0 {
            return R::clone_into::<L, P>(dst, tag, src, src_index.wrapping_sub(1), orig);
        }

        let source = &*(src as *const T);
        if tag.get() == Some(orig) {
            (*dst.cast::<T>()).clone_from(source);
        } else {
            match policy::switch::<L, P, T, _>(dst, tag, orig, Staged(|| source.clone())) {
                Ok(_) => (),
                Err(never) => match never {},
            }
        }
    }
}

/// A function object applied to the live alternative by [`Apply`]. It gets
/// the alternative's position along with the value.
pub trait Func<T>: Sized {
    type Output;

    /// # Safety
    ///
    /// `value` points to a live `T`. Implementations may only write through
    /// it when the caller handed out exclusive access.
    unsafe fn call(self, index: usize, value: *mut T) -> Self::Output;
}

pub unsafe trait Apply<F>: TypeList {
    type Output;

    unsafe fn apply(ptr: *mut (), index: usize, f: F) -> Self::Output;
}

pub unsafe trait ApplyImp<F, O>: Sized {
    unsafe fn apply(ptr: *mut (), index: usize, orig: usize, f: F) -> O;
}

unsafe impl<F, O> ApplyImp<F, O> for CNil {
    #[inline(always)]
    unsafe fn apply(_: *mut (), _: usize, _: usize, _: F) -> O {
        unreachable_unchecked()
    }
}

unsafe impl<T, R: ApplyImp<F, F::Output>, F: Func<T>> ApplyImp<F, F::Output> for CoProd<T, R> {
    #[inline]
    unsafe fn apply(ptr: *mut (), index: usize, orig: usize, f: F) -> F::Output {
        if index == 0 {
            f.call(orig, ptr as *mut T)
        } else {
            R::apply(ptr, index.wrapping_sub(1), orig, f)
        }
    }
}

unsafe impl<T, R, F> Apply<F> for CoProd<T, R>
where
    R: TypeList + ApplyImp<F, F::Output>,
    F: Func<T>,
{
    type Output = F::Output;

    #[inline]
    unsafe fn apply(ptr: *mut (), index: usize, f: F) -> F::Output {
        <Self as ApplyImp<F, F::Output>>::apply(ptr, index, index, f)
    }
}

/// Moves `value` into `slot` and records `index` when dropped, even while
/// unwinding out of the old alternative's destructor.
pub(crate) struct Install<'a, T> {
    pub slot: *mut T,
    pub value: ManuallyDrop<T>,
    pub tag: &'a mut Discriminant,
    pub index: usize,
}

impl<T> Drop for Install<'_, T> {
    #[inline]
    fn drop(&mut self) {
        unsafe { ptr::write(self.slot, ManuallyDrop::take(&mut self.value)) }
        *self.tag = Discriminant::new(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlist;
    use std::string::String;

    #[test]
    fn storage_layout() {
        type List = tlist!(u8, u64, [u16; 7]);
        assert_eq!(mem::size_of::<<List as TypeList>::Storage>(), 16);
        assert_eq!(mem::align_of::<<List as TypeList>::Storage>(), 8);
        assert_eq!(mem::size_of::<<tlist!() as TypeList>::Storage>(), 0);
    }

    #[test]
    fn descriptor_table() {
        type List = tlist!(u8, String, u32);
        assert_eq!(descriptor::<List>(0).name(), "u8");
        assert!(!descriptor::<List>(1).trivially_destructible);
        assert_eq!(descriptor::<List>(2).size, 4);
    }

    #[test]
    #[should_panic]
    fn descriptor_out_of_bounds() {
        descriptor::<tlist!(u8)>(1);
    }

    #[test]
    fn count() {
        assert_eq!(<tlist!()>::COUNT, 0);
        assert_eq!(<tlist!(u8, u8, u8)>::COUNT, 3);
        assert_eq!(<crate::parts::P5>::VALUE, 5);
    }
}
