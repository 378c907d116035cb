//! Visiting the live alternatives of one or more variants.
//!
//! The discriminants of all operands are folded into one mixed-radix index,
//! `((d1 * c2 + d2) * c3 + d3) ...`, which selects one of `c1 * c2 * c3 ...`
//! thunks. The index is split back into one digit per operand, and each
//! operand's level compiles to a switch over its alternatives, so nothing the
//! size of the whole product is materialized at run time. Every thunk is a
//! separately compiled call site that knows the exact alternative types it
//! hands to the visitor.
//!
//! The number of thunks, and so the compile time, still grows with the
//! product of the operands' alternative counts. Dispatch takes at most six
//! operands, and three operands of a dozen alternatives each already
//! instantiate 1728 call sites.
//!
//! ```
//! use variety::{dispatch::{dispatch, Visitor}, variant};
//!
//! struct Sum;
//!
//! impl<'a, A: Copy + Into<f64>, B: Copy + Into<f64>> Visitor<(&'a A, &'a B)> for Sum {
//!     type Output = f64;
//!
//!     fn visit(self, (a, b): (&'a A, &'a B)) -> f64 {
//!         (*a).into() + (*b).into()
//!     }
//! }
//!
//! let x = <variant!(u8, f32)>::new(2_u8);
//! let y = <variant!(i16, f64)>::new(0.5_f64);
//! assert_eq!(dispatch(Sum, (&x, &y)), Ok(2.5));
//! ```

use core::mem::ManuallyDrop;

use crate::discriminant::VALUELESS;
use crate::error::AccessError;
use crate::internals::{unreachable_unchecked, CNil, CoProd, End, Entry, TypeList};
use crate::policy::Policy;
use crate::Variant;

pub trait Visitor<Args> {
    type Output;

    fn visit(self, args: Args) -> Self::Output;
}

/// How an operand's live alternative is handed to the visitor.
pub trait Category {
    type Arg<'a, T: 'a>;

    #[doc(hidden)]
    unsafe fn project<'a, T: 'a>(ptr: *mut ()) -> Self::Arg<'a, T>;
}

/// `&T`, from a `&Variant`.
pub enum Shared {}
/// `&mut T`, from a `&mut Variant`.
pub enum Exclusive {}
/// `T`, from a `Variant` taken by value.
pub enum Owned {}

impl Category for Shared {
    type Arg<'a, T: 'a> = &'a T;

    #[inline(always)]
    unsafe fn project<'a, T: 'a>(ptr: *mut ()) -> &'a T {
        &*(ptr as *const T)
    }
}

impl Category for Exclusive {
    type Arg<'a, T: 'a> = &'a mut T;

    #[inline(always)]
    unsafe fn project<'a, T: 'a>(ptr: *mut ()) -> &'a mut T {
        &mut *(ptr as *mut T)
    }
}

impl Category for Owned {
    type Arg<'a, T: 'a> = T;

    #[inline(always)]
    unsafe fn project<'a, T: 'a>(ptr: *mut ()) -> T {
        ptr.cast::<T>().read()
    }
}

/// A single dispatch operand.
pub unsafe trait Operand<'a> {
    type Category: Category;
    type List: TypeList;

    /// The live index, or [`VALUELESS`].
    fn index(&self) -> usize;

    #[doc(hidden)]
    fn pointer(&mut self) -> *mut ();
}

unsafe impl<'a, L: TypeList, P: Policy<L>> Operand<'a> for &'a Variant<L, P> {
    type Category = Shared;
    type List = L;

    #[inline]
    fn index(&self) -> usize {
        Variant::index(*self)
    }

    #[inline]
    fn pointer(&mut self) -> *mut () {
        Variant::as_ptr(*self) as *mut ()
    }
}

unsafe impl<'a, L: TypeList, P: Policy<L>> Operand<'a> for &'a mut Variant<L, P> {
    type Category = Exclusive;
    type List = L;

    #[inline]
    fn index(&self) -> usize {
        Variant::index(&**self)
    }

    #[inline]
    fn pointer(&mut self) -> *mut () {
        Variant::as_mut_ptr(&mut **self)
    }
}

unsafe impl<'a, L: TypeList, P: Policy<L>> Operand<'a> for Variant<L, P> {
    type Category = Owned;
    type List = L;

    #[inline]
    fn index(&self) -> usize {
        Variant::index(self)
    }

    #[inline]
    fn pointer(&mut self) -> *mut () {
        Variant::as_mut_ptr(self)
    }
}

/// A flat tuple of one to six [`Operand`]s.
pub unsafe trait Operands<'a> {
    /// `((Category, List), (... , ()))` for every operand.
    type Lists;
    #[doc(hidden)]
    type Pointers;

    fn linear_index(&self) -> Result<usize, AccessError>;

    #[doc(hidden)]
    fn pointers(&mut self) -> Self::Pointers;
}

/// Folds per-operand indices into one mixed-radix index, most significant
/// operand first.
///
/// Fails with [`AccessError::Empty`] if any index is [`VALUELESS`].
pub fn linear_index(indices: &[usize], counts: &[usize]) -> Result<usize, AccessError> {
    assert_eq!(indices.len(), counts.len());

    if indices.iter().any(|&index| index == VALUELESS) {
        return Err(AccessError::Empty);
    }

    Ok(indices
        .iter()
        .zip(counts)
        .fold(0, |linear, (&index, &count)| {
            debug_assert!(index < count);
            linear * count + index
        }))
}

pub type Thunk<V, O> = unsafe fn(V, *const *mut ()) -> O;

/// Appends `T` to a nested list `(H, (.., ()))`.
pub trait Append<T> {
    type Output;
}

impl<T> Append<T> for () {
    type Output = (T, ());
}

impl<H, R: Append<T>, T> Append<T> for (H, R) {
    type Output = (H, R::Output);
}

/// The alternatives picked so far, as `((Category, Type), ...)`.
pub unsafe trait Bind<'a> {
    type Args;

    #[doc(hidden)]
    unsafe fn bind(pointers: *const *mut ()) -> Self::Args;
}

unsafe impl Bind<'_> for () {
    type Args = ();

    #[inline(always)]
    unsafe fn bind(_: *const *mut ()) {}
}

unsafe impl<'a, M: Category, A: 'a, R: Bind<'a>> Bind<'a> for ((M, A), R) {
    type Args = (M::Arg<'a, A>, R::Args);

    #[inline(always)]
    unsafe fn bind(pointers: *const *mut ()) -> Self::Args {
        (M::project::<A>(*pointers), R::bind(pointers.add(1)))
    }
}

/// Turns the nested argument list into what the [`Visitor`] receives: the
/// bare argument for one operand, a flat tuple otherwise.
pub trait Flatten {
    type Flat;

    fn flatten(self) -> Self::Flat;
}

impl<A> Flatten for (A, ()) {
    type Flat = A;

    #[inline(always)]
    fn flatten(self) -> A {
        self.0
    }
}

/// Number of thunks a [`Table`] over the operand lists `Self` selects from.
pub trait Size {
    #[doc(hidden)]
    const SIZE: usize;
}

impl Size for () {
    const SIZE: usize = 1;
}

impl<M, L: TypeList, Rest: Size> Size for ((M, L), Rest) {
    const SIZE: usize = L::COUNT * Rest::SIZE;
}

/// Thunk selection over the operand lists `Self`, given the alternatives `C`
/// picked by earlier operands.
pub unsafe trait Table<'a, V, C, O> {
    /// # Safety
    ///
    /// `index` must be a linear index over the lists of `Self`.
    #[doc(hidden)]
    unsafe fn thunk(index: usize) -> Thunk<V, O>;
}

/// One operand's level of a [`Table`]: a sub table per alternative.
pub unsafe trait Row<'a, V, C, O, M, Rest> {
    /// # Safety
    ///
    /// `digit` must be less than the length of `Self`, and `rest` must be a
    /// linear index over `Rest`.
    #[doc(hidden)]
    unsafe fn thunk(digit: usize, rest: usize) -> Thunk<V, O>;
}

unsafe fn call<'a, V, C, O>(visitor: V, pointers: *const *mut ()) -> O
where
    C: Bind<'a>,
    C::Args: Flatten,
    V: Visitor<<C::Args as Flatten>::Flat, Output = O>,
{
    visitor.visit(C::bind(pointers).flatten())
}

unsafe impl<'a, V, C, O> Table<'a, V, C, O> for ()
where
    C: Bind<'a>,
    C::Args: Flatten,
    V: Visitor<<C::Args as Flatten>::Flat, Output = O>,
{
    #[inline(always)]
    unsafe fn thunk(_: usize) -> Thunk<V, O> {
        call::<'a, V, C, O>
    }
}

unsafe impl<'a, V, C, O, M, L, Rest> Table<'a, V, C, O> for ((M, L), Rest)
where
    L: Row<'a, V, C, O, M, Rest>,
    Rest: Size,
{
    #[inline(always)]
    unsafe fn thunk(index: usize) -> Thunk<V, O> {
        L::thunk(index / Rest::SIZE, index % Rest::SIZE)
    }
}

unsafe impl<'a, V, C, O, M, Rest> Row<'a, V, C, O, M, Rest> for CNil {
    unsafe fn thunk(_: usize, _: usize) -> Thunk<V, O> {
        unreachable_unchecked()
    }
}

unsafe impl<'a, V, C, O, M, Rest, A, R> Row<'a, V, C, O, M, Rest> for CoProd<A, R>
where
    C: Append<(M, A)>,
    Rest: Table<'a, V, C::Output, O>,
    R: Row<'a, V, C, O, M, Rest>,
{
    #[inline(always)]
    unsafe fn thunk(digit: usize, rest: usize) -> Thunk<V, O> {
        if digit == 0 {
            Rest::thunk(rest)
        } else {
            R::thunk(digit - 1, rest)
        }
    }
}

/// Calls `visitor` with the live alternatives of `operands`, a flat tuple of
/// `&Variant`, `&mut Variant` or `Variant`.
///
/// Fails with [`AccessError::Empty`], without calling the visitor, if any
/// operand is valueless. Operands taken by value are dropped in that case.
pub fn dispatch<'a, V, O, Ops>(visitor: V, operands: Ops) -> Result<O, AccessError>
where
    Ops: Operands<'a>,
    Ops::Lists: Table<'a, V, (), O>,
{
    let index = operands.linear_index()?;

    // owned operands are moved out by the thunk
    let mut operands = ManuallyDrop::new(operands);
    let pointers = operands.pointers();

    unsafe {
        let thunk = <Ops::Lists as Table<'a, V, (), O>>::thunk(index);
        Ok(thunk(visitor, &pointers as *const Ops::Pointers as *const *mut ()))
    }
}

macro_rules! nested {
    () => { () };
    ($head:ty $(, $tail:ty)*) => { ($head, nested!($($tail),*)) };
}

macro_rules! nested_pat {
    () => { () };
    ($head:ident $(, $tail:ident)*) => { ($head, nested_pat!($($tail),*)) };
}

macro_rules! chain {
    (@ty) => { End };
    (@ty $head:ident $(, $tail:ident)*) => { Entry<*mut (), chain!(@ty $($tail),*)> };
    (@val) => { End };
    (@val $head:expr $(, $tail:expr)*) => { Entry($head, chain!(@val $($tail),*)) };
}

macro_rules! operands {
    ($($name:ident $idx:tt),+) => {
        unsafe impl<'a, $($name: Operand<'a>),+> Operands<'a> for ($($name,)+) {
            type Lists = nested!($((<$name as Operand<'a>>::Category, <$name as Operand<'a>>::List)),+);
            type Pointers = chain!(@ty $($name),+);

            #[inline]
            fn linear_index(&self) -> Result<usize, AccessError> {
                linear_index(
                    &[$(<$name as Operand<'a>>::index(&self.$idx)),+],
                    &[$(<<$name as Operand<'a>>::List as TypeList>::COUNT),+],
                )
            }

            #[inline]
            fn pointers(&mut self) -> Self::Pointers {
                chain!(@val $(<$name as Operand<'a>>::pointer(&mut self.$idx)),+)
            }
        }
    };
}

macro_rules! flatten {
    ($($name:ident),+) => {
        impl<$($name),+> Flatten for nested!($($name),+) {
            type Flat = ($($name,)+);

            #[allow(non_snake_case)]
            #[inline(always)]
            fn flatten(self) -> Self::Flat {
                let nested_pat!($($name),+) = self;
                ($($name,)+)
            }
        }
    };
}

operands!(A 0);
operands!(A 0, B 1);
operands!(A 0, B 1, C 2);
operands!(A 0, B 1, C 2, D 3);
operands!(A 0, B 1, C 2, D 3, E 4);
operands!(A 0, B 1, C 2, D 3, E 4, F 5);

flatten!(A, B);
flatten!(A, B, C);
flatten!(A, B, C, D);
flatten!(A, B, C, D, E);
flatten!(A, B, C, D, E, F);
