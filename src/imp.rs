use super::*;

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::internals::{CoProd, Z};

impl<L: CloneList, P: Policy<L>> Clone for Variant<L, P> {
    #[inline]
    fn clone(&self) -> Self {
        let mut storage = MaybeUninit::<L::Storage>::uninit();

        if let Some(index) = self.tag.get() {
            unsafe { L::clone_at(self.as_ptr(), index, storage.as_mut_ptr().cast()) }
        }

        Self {
            storage,
            tag: self.tag,
            policy: PhantomData,
        }
    }

    /// Clones into the live alternative when both sides hold the same one,
    /// otherwise builds the clone first and then switches over.
    fn clone_from(&mut self, source: &Self) {
        match source.tag.get() {
            Some(index) => unsafe {
                let dst = self.as_mut_ptr();
                L::clone_into::<L, P>(dst, &mut self.tag, source.as_ptr(), index, index)
            },
            None => self.clear(),
        }
    }
}

impl<A: Default, R: TypeList, P: Policy<CoProd<A, R>>> Default for Variant<CoProd<A, R>, P> {
    /// Alternative 0, default constructed.
    #[inline]
    fn default() -> Self {
        Self::new_with::<Z, A, _>(A::default)
    }
}

pub struct DebugImp<'a, 'b>(&'a mut fmt::Formatter<'b>);

impl<T: fmt::Debug> Func<T> for DebugImp<'_, '_> {
    type Output = fmt::Result;

    #[inline]
    unsafe fn call(self, _: usize, value: *mut T) -> fmt::Result {
        (*value).fmt(self.0)
    }
}

impl<L, P> fmt::Debug for Variant<L, P>
where
    L: for<'a, 'b> Apply<DebugImp<'a, 'b>, Output = fmt::Result>,
    P: Policy<L>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag.get() {
            Some(index) => unsafe { L::apply(self.as_ptr() as *mut (), index, DebugImp(f)) },
            None => f.write_str("<valueless>"),
        }
    }
}

pub struct PartialEqImp(*const ());

impl<T: PartialEq> Func<T> for PartialEqImp {
    type Output = bool;

    #[inline]
    unsafe fn call(self, _: usize, value: *mut T) -> bool {
        *value == *(self.0 as *const T)
    }
}

pub struct EqImp(());

impl<T: Eq> Func<T> for EqImp {
    type Output = ();

    #[inline]
    unsafe fn call(self, _: usize, _: *mut T) {}
}

impl<L, P> PartialEq for Variant<L, P>
where
    L: Apply<PartialEqImp, Output = bool>,
    P: Policy<L>,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self.tag.get(), other.tag.get()) {
            (Some(index), Some(other_index)) => {
                index == other_index
                    && unsafe {
                        L::apply(self.as_ptr() as *mut (), index, PartialEqImp(other.as_ptr()))
                    }
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl<L, P> Eq for Variant<L, P>
where
    L: Apply<PartialEqImp, Output = bool> + Apply<EqImp>,
    P: Policy<L>,
{
}

/// Valueless orders before every alternative.
#[inline]
fn rank(tag: Discriminant) -> usize {
    tag.index().wrapping_add(1)
}

pub struct PartialOrdImp(*const ());

impl<T: PartialOrd> Func<T> for PartialOrdImp {
    type Output = Option<Ordering>;

    #[inline]
    unsafe fn call(self, _: usize, value: *mut T) -> Self::Output {
        (*value).partial_cmp(&*(self.0 as *const T))
    }
}

impl<L, P> PartialOrd for Variant<L, P>
where
    L: Apply<PartialEqImp, Output = bool> + Apply<PartialOrdImp, Output = Option<Ordering>>,
    P: Policy<L>,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match rank(self.tag).cmp(&rank(other.tag)) {
            Ordering::Equal => match self.tag.get() {
                Some(index) => unsafe {
                    <L as Apply<PartialOrdImp>>::apply(
                        self.as_ptr() as *mut (),
                        index,
                        PartialOrdImp(other.as_ptr()),
                    )
                },
                None => Some(Ordering::Equal),
            },
            cmp => Some(cmp),
        }
    }
}

pub struct OrdImp(*const ());

impl<T: Ord> Func<T> for OrdImp {
    type Output = Ordering;

    #[inline]
    unsafe fn call(self, _: usize, value: *mut T) -> Self::Output {
        (*value).cmp(&*(self.0 as *const T))
    }
}

impl<L, P> Ord for Variant<L, P>
where
    L: Apply<PartialEqImp, Output = bool>
        + Apply<EqImp>
        + Apply<PartialOrdImp, Output = Option<Ordering>>
        + Apply<OrdImp, Output = Ordering>,
    P: Policy<L>,
{
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        rank(self.tag)
            .cmp(&rank(other.tag))
            .then_with(|| match self.tag.get() {
                Some(index) => unsafe {
                    <L as Apply<OrdImp>>::apply(self.as_ptr() as *mut (), index, OrdImp(other.as_ptr()))
                },
                None => Ordering::Equal,
            })
    }
}

pub struct HashImp<'a>(&'a mut dyn Hasher);

impl<T: Hash> Func<T> for HashImp<'_> {
    type Output = ();

    #[inline]
    unsafe fn call(self, _: usize, value: *mut T) {
        (*value).hash(&mut { self.0 })
    }
}

impl<L, P> Hash for Variant<L, P>
where
    L: for<'a> Apply<HashImp<'a>, Output = ()>,
    P: Policy<L>,
{
    #[inline]
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.tag.hash(hasher);

        if let Some(index) = self.tag.get() {
            unsafe { L::apply(self.as_ptr() as *mut (), index, HashImp(hasher)) }
        }
    }
}
