use std::cell::Cell;

use proptest::prelude::*;
use variety::dispatch::{dispatch, linear_index, Visitor};
use variety::{variant, AccessError};

trait Tagged {
    const INDEX: usize;

    fn value(&self) -> i64;
}

macro_rules! tagged {
    ($($ty:ty => $index:expr),* $(,)?) => {
        $(impl Tagged for $ty {
            const INDEX: usize = $index;

            fn value(&self) -> i64 {
                i64::from(*self)
            }
        })*
    };
}

tagged!(u8 => 0, u16 => 1, u32 => 2);
tagged!(i8 => 0, i16 => 1, i32 => 2, i64 => 3);

type Left = variant!(u8, u16, u32);
type Right = variant!(i8, i16, i32, i64);

fn left(index: usize, value: u8) -> Left {
    match index {
        0 => Left::new(value),
        1 => Left::new(u16::from(value)),
        _ => Left::new(u32::from(value)),
    }
}

fn right(index: usize, value: i8) -> Right {
    match index {
        0 => Right::new(value),
        1 => Right::new(i16::from(value)),
        2 => Right::new(i32::from(value)),
        _ => Right::new(i64::from(value)),
    }
}

fn valueless_left() -> Left {
    let mut v = Left::new(0_u8);
    let _ = v.try_emplace_with(|| Err::<u32, _>(()));
    assert!(v.is_valueless());
    v
}

/// Reports which alternatives it was called with.
struct Seen;

impl<'a, A: Tagged, B: Tagged> Visitor<(&'a A, &'a B)> for Seen {
    type Output = (usize, i64, usize, i64);

    fn visit(self, (a, b): (&'a A, &'a B)) -> Self::Output {
        (A::INDEX, a.value(), B::INDEX, b.value())
    }
}

/// Records being called and nothing else.
struct Called<'c>(&'c Cell<bool>);

impl<'a, A, B> Visitor<(&'a A, &'a B)> for Called<'_> {
    type Output = ();

    fn visit(self, _: (&'a A, &'a B)) {
        self.0.set(true)
    }
}

proptest! {
    #[test]
    fn two_operands(li in 0..3_usize, lv: u8, ri in 0..4_usize, rv: i8) {
        let x = left(li, lv);
        let y = right(ri, rv);

        prop_assert_eq!(
            dispatch(Seen, (&x, &y)),
            Ok((li, i64::from(lv), ri, i64::from(rv)))
        );
    }

    #[test]
    fn radix_is_a_bijection(a in 0..3_usize, b in 0..4_usize, c in 0..5_usize) {
        let index = linear_index(&[a, b, c], &[3, 4, 5]).unwrap();
        prop_assert!(index < 3 * 4 * 5);
        prop_assert_eq!((index / 20, index / 5 % 4, index % 5), (a, b, c));
    }
}

#[test]
fn empty_operand_skips_visitor() {
    let called = Cell::new(false);
    let x = valueless_left();

    for index in 0..4 {
        let y = right(index, 1);
        assert_eq!(dispatch(Called(&called), (&x, &y)), Err(AccessError::Empty));
        assert_eq!(dispatch(Called(&called), (&y, &x)), Err(AccessError::Empty));
    }

    assert!(!called.get());
}

#[test]
fn single_operand_gets_bare_value() {
    struct Width;

    impl<T> Visitor<&mut T> for Width {
        type Output = usize;

        fn visit(self, _: &mut T) -> usize {
            core::mem::size_of::<T>()
        }
    }

    let mut x = left(1, 3);
    assert_eq!(dispatch(Width, (&mut x,)), Ok(2));
    assert_eq!(x.visit_mut(Width), Ok(2));
}

#[test]
fn mixed_categories() {
    struct Transfer;

    impl<'a> Visitor<(&'a String, &'a mut Vec<String>, String)> for Transfer {
        type Output = usize;

        fn visit(self, (prefix, out, owned): (&'a String, &'a mut Vec<String>, String)) -> usize {
            out.push(format!("{}{}", prefix, owned));
            out.len()
        }
    }

    impl<'a> Visitor<(&'a String, &'a mut Vec<String>, u8)> for Transfer {
        type Output = usize;

        fn visit(self, (_, out, _): (&'a String, &'a mut Vec<String>, u8)) -> usize {
            out.len()
        }
    }

    impl<'a, T> Visitor<(&'a u8, &'a mut T, String)> for Transfer {
        type Output = usize;

        fn visit(self, _: (&'a u8, &'a mut T, String)) -> usize {
            0
        }
    }

    impl<'a, T> Visitor<(&'a u8, &'a mut T, u8)> for Transfer {
        type Output = usize;

        fn visit(self, _: (&'a u8, &'a mut T, u8)) -> usize {
            0
        }
    }

    impl<'a> Visitor<(&'a String, &'a mut u8, String)> for Transfer {
        type Output = usize;

        fn visit(self, _: (&'a String, &'a mut u8, String)) -> usize {
            0
        }
    }

    impl<'a> Visitor<(&'a String, &'a mut u8, u8)> for Transfer {
        type Output = usize;

        fn visit(self, _: (&'a String, &'a mut u8, u8)) -> usize {
            0
        }
    }

    let prefix = <variant!(u8, String)>::new(String::from("> "));
    let mut out = <variant!(u8, Vec<String>)>::new(Vec::new());
    let owned = <variant!(u8, String)>::new(String::from("moved"));

    assert_eq!(dispatch(Transfer, (&prefix, &mut out, owned)), Ok(1));
    assert_eq!(
        out.try_get::<Vec<String>, _>().map(Vec::as_slice),
        Some(&[String::from("> moved")][..])
    );
}

#[test]
fn six_operands() {
    type Small = variant!(u8, i8);

    struct Total;

    impl<A: Tagged, B: Tagged, C: Tagged, D: Tagged, E: Tagged, F: Tagged> Visitor<(A, B, C, D, E, F)>
        for Total
    {
        type Output = i64;

        fn visit(self, (a, b, c, d, e, f): (A, B, C, D, E, F)) -> i64 {
            a.value() + b.value() + c.value() + d.value() + e.value() + f.value()
        }
    }

    let operands = (
        Small::new(1_u8),
        Small::new(-2_i8),
        Small::new(3_u8),
        Small::new(4_i8),
        Small::new(5_u8),
        Small::new(-6_i8),
    );

    assert_eq!(dispatch(Total, operands), Ok(5));
}

#[test]
fn dispatch_frame_stays_small() {
    type Wide = variant!(u8, u16, u32, u64, i8, i16, i32, i64);

    /// Returns the address of one of its own locals.
    struct Depth;

    impl<'a, A, B, C> Visitor<(&'a A, &'a B, &'a C)> for Depth {
        type Output = usize;

        #[inline(never)]
        fn visit(self, _: (&'a A, &'a B, &'a C)) -> usize {
            let local = 0_u8;
            std::hint::black_box(&local) as *const u8 as usize
        }
    }

    let x = Wide::new(7_i64);
    let y = Wide::new(3_u16);
    let z = Wide::new(-1_i8);

    let local = 0_u8;
    let caller = std::hint::black_box(&local) as *const u8 as usize;
    let callee = dispatch(Depth, (&x, &y, &z)).unwrap();

    // a flat table of 8 * 8 * 8 thunks would take this much on its own
    let table = 8 * 8 * 8 * core::mem::size_of::<usize>();
    assert!(caller.abs_diff(callee) < table);
}
