use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use variety::policy::{DisallowValueless, Fallback, LetVariantDecide, Policy};
use variety::{tlist, variant, VALUELESS};

type List = tlist!(u8, String, Vec<u8>);
type Subject<P> = variant!(u8, String, Vec<u8>; P);

/// What the variant is expected to hold.
#[derive(Debug, Clone, PartialEq)]
enum Model {
    Byte(u8),
    Text(String),
    Bytes(Vec<u8>),
    Empty,
}

#[derive(Debug, Clone)]
enum Op {
    Set(Model),
    Emplace(Model),
    FailStaged,
    FailInPlace,
    CloneFrom(Model),
    Swap(Model),
}

/// Writes whose availability or outcome depends on the policy.
trait Writes: Policy<List> + Sized {
    /// Whether a failed in-place construction can be asked for at all.
    const IN_PLACE: bool;

    fn emplace(subject: &mut Subject<Self>, model: Model);

    /// Fails an in-place construction and returns the expected content.
    fn fail_in_place(subject: &mut Subject<Self>) -> Model;
}

impl Writes for LetVariantDecide {
    const IN_PLACE: bool = true;

    fn emplace(subject: &mut Subject<Self>, model: Model) {
        in_place(subject, model)
    }

    fn fail_in_place(subject: &mut Subject<Self>) -> Model {
        assert!(subject.try_emplace_with(|| Err::<String, _>(())).is_err());
        Model::Empty
    }
}

impl Writes for Fallback {
    const IN_PLACE: bool = true;

    fn emplace(subject: &mut Subject<Self>, model: Model) {
        in_place(subject, model)
    }

    fn fail_in_place(subject: &mut Subject<Self>) -> Model {
        assert!(subject.try_emplace_with(|| Err::<String, _>(())).is_err());
        Model::Byte(0)
    }
}

impl Writes for DisallowValueless {
    const IN_PLACE: bool = false;

    fn emplace(subject: &mut Subject<Self>, model: Model) {
        match model {
            Model::Byte(byte) => {
                subject.replace_with(move || byte);
            }
            Model::Text(text) => {
                subject.replace_with(move || text);
            }
            Model::Bytes(bytes) => {
                subject.replace_with(move || bytes);
            }
            Model::Empty => unreachable!(),
        }
    }

    fn fail_in_place(_: &mut Subject<Self>) -> Model {
        unreachable!("filtered out of the operations")
    }
}

fn value() -> impl Strategy<Value = Model> {
    prop_oneof![
        any::<u8>().prop_map(Model::Byte),
        "[a-z]{0,8}".prop_map(Model::Text),
        proptest::collection::vec(any::<u8>(), 0..8).prop_map(Model::Bytes),
    ]
}

fn op(in_place: bool) -> impl Strategy<Value = Op> {
    prop_oneof![
        value().prop_map(Op::Set),
        value().prop_map(Op::Emplace),
        Just(Op::FailStaged),
        Just(Op::FailInPlace),
        value().prop_map(Op::CloneFrom),
        value().prop_map(Op::Swap),
    ]
    .prop_filter("in-place failures", move |op| {
        in_place || !matches!(op, Op::FailInPlace)
    })
}

fn build<P: Policy<List>>(model: &Model) -> Subject<P> {
    match model.clone() {
        Model::Byte(byte) => Subject::new(byte),
        Model::Text(text) => Subject::new(text),
        Model::Bytes(bytes) => Subject::new(bytes),
        Model::Empty => unreachable!(),
    }
}

fn set<P: Policy<List>>(subject: &mut Subject<P>, model: Model) {
    match model {
        Model::Byte(byte) => subject.set(byte),
        Model::Text(text) => subject.set(text),
        Model::Bytes(bytes) => subject.set(bytes),
        Model::Empty => unreachable!(),
    }
}

fn in_place<P: Policy<List>>(subject: &mut Subject<P>, model: Model) {
    match model {
        Model::Byte(byte) => {
            subject.emplace_with(move || byte);
        }
        Model::Text(text) => {
            subject.emplace_with(move || text);
        }
        Model::Bytes(bytes) => {
            subject.emplace_with(move || bytes);
        }
        Model::Empty => unreachable!(),
    }
}

fn observe<P: Policy<List>>(subject: &Subject<P>) -> Model {
    if let Some(byte) = subject.try_get::<u8, _>() {
        Model::Byte(*byte)
    } else if let Some(text) = subject.try_get::<String, _>() {
        Model::Text(text.clone())
    } else if let Some(bytes) = subject.try_get::<Vec<u8>, _>() {
        Model::Bytes(bytes.clone())
    } else {
        Model::Empty
    }
}

fn index(model: &Model) -> usize {
    match model {
        Model::Byte(_) => 0,
        Model::Text(_) => 1,
        Model::Bytes(_) => 2,
        Model::Empty => VALUELESS,
    }
}

fn run<P: Writes>(start: Model, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut subject = build::<P>(&start);
    let mut model = start;

    for op in ops {
        match op {
            Op::Set(next) => {
                set(&mut subject, next.clone());
                model = next;
            }
            Op::Emplace(next) => {
                P::emplace(&mut subject, next.clone());
                model = next;
            }
            Op::FailStaged => {
                prop_assert!(subject.try_replace_with(|| Err::<Vec<u8>, _>(())).is_err());
            }
            Op::FailInPlace => {
                model = P::fail_in_place(&mut subject);
            }
            Op::CloneFrom(next) => {
                subject.clone_from(&build(&next));
                model = next;
            }
            Op::Swap(next) => {
                let mut other = build(&next);
                subject.swap(&mut other);
                prop_assert_eq!(observe(&other), model);
                model = next;
            }
        }

        prop_assert_eq!(subject.index(), index(&model));
        prop_assert_eq!(subject.is_valueless(), model == Model::Empty);
        prop_assert_eq!(observe(&subject), model.clone());
        if !P::HAS_SENTINEL {
            prop_assert!(!subject.is_valueless());
        }
    }

    Ok(())
}

proptest! {
    #[test]
    fn let_variant_decide(
        start in value(),
        ops in proptest::collection::vec(op(LetVariantDecide::IN_PLACE), 0..24),
    ) {
        run::<LetVariantDecide>(start, ops)?;
    }

    #[test]
    fn fallback(
        start in value(),
        ops in proptest::collection::vec(op(Fallback::IN_PLACE), 0..24),
    ) {
        run::<Fallback>(start, ops)?;
    }

    #[test]
    fn disallow_valueless(
        start in value(),
        ops in proptest::collection::vec(op(DisallowValueless::IN_PLACE), 0..24),
    ) {
        run::<DisallowValueless>(start, ops)?;
    }
}
