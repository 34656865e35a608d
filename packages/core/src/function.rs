//! Function helpers: display names for callables and fixed-arity partial
//! application.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::record::Displayable;

/// Host property through which a named function value exposes the function
/// it wraps.
pub const NAMED_FN_PROP: &str = "fn";

/// A callable paired with a fixed display name.
///
/// Both [`Display`](fmt::Display) and serialization yield the name verbatim,
/// never anything derived from the callable. The pair is immutable; the
/// callable itself may be shared elsewhere.
#[derive(Clone)]
pub struct NamedFunction<F> {
    name: String,
    func: F,
}

impl<F> NamedFunction<F> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped callable, for invocation by the caller.
    pub fn func(&self) -> &F {
        &self.func
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

/// Wrap `func` so that it displays and serialises as `name`.
pub fn name_function<F>(name: impl Into<String>, func: F) -> NamedFunction<F> {
    NamedFunction {
        name: name.into(),
        func,
    }
}

impl<F> Displayable for NamedFunction<F> {
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.name.clone())
    }
}

impl<F> fmt::Display for NamedFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl<F> fmt::Debug for NamedFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Serialize for NamedFunction<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// A positional argument list read at call time.
///
/// Implemented for owned vectors (a snapshot) and for shared
/// `Rc<RefCell<Vec<_>>>` lists, whose later edits are observed.
pub trait ArgList {
    type Item;

    fn arg_count(&self) -> usize;

    fn arg(&self, index: usize) -> Option<Self::Item>;
}

impl<A: Clone> ArgList for Vec<A> {
    type Item = A;

    fn arg_count(&self) -> usize {
        self.len()
    }

    fn arg(&self, index: usize) -> Option<A> {
        self.get(index).cloned()
    }
}

impl<A: Clone> ArgList for Rc<RefCell<Vec<A>>> {
    type Item = A;

    fn arg_count(&self) -> usize {
        self.borrow().len()
    }

    fn arg(&self, index: usize) -> Option<A> {
        self.borrow().get(index).cloned()
    }
}

/// Bind `args` to `func`, returning a zero-argument callable.
///
/// The arity `n` is fixed when this is called and must be 1, 2, or 3;
/// anything else (including an empty list) is
/// [`CoreError::UnsupportedArity`]. Each invocation reads `args[0..n]` afresh,
/// so edits made to a shared argument list after binding are observed; a
/// position that no longer exists reads as `Default::default()`.
pub fn apply_fixed_arity<L, F, R>(func: F, args: L) -> Result<impl Fn() -> R, CoreError>
where
    L: ArgList,
    L::Item: Default,
    F: Fn(&[L::Item]) -> R,
{
    let arity = args.arg_count();
    if !(1..=3).contains(&arity) {
        return Err(CoreError::UnsupportedArity(arity));
    }
    Ok(move || {
        let bound: Vec<L::Item> = (0..arity)
            .map(|i| args.arg(i).unwrap_or_default())
            .collect();
        func(&bound)
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn named_function_shows_its_name() {
        let f = name_function("foo", |x: i32| x + 1);
        assert_eq!(f.to_string(), "foo");
        assert_eq!(f.to_json(), serde_json::json!("foo"));
        assert_eq!(serde_json::to_string(&f).unwrap(), "\"foo\"");
        assert_eq!((f.func())(1), 2);
    }

    #[test]
    fn named_function_debug_hides_callable() {
        let f = name_function("literal-listener", ());
        assert_eq!(format!("{f:?}"), "NamedFunction { name: \"literal-listener\", .. }");
    }

    #[test]
    fn binds_two_arguments() {
        let add = apply_fixed_arity(|a: &[i32]| a[0] + a[1], vec![1, 2]).unwrap();
        assert_eq!(add(), 3);
    }

    #[test]
    fn each_call_invokes_func_again() {
        let calls = Cell::new(0);
        let seen = RefCell::new(Vec::new());
        let bound = apply_fixed_arity(
            |a: &[i32]| {
                calls.set(calls.get() + 1);
                seen.borrow_mut().push(a.to_vec());
            },
            vec![1, 2],
        )
        .unwrap();
        bound();
        bound();
        assert_eq!(calls.get(), 2);
        assert_eq!(*seen.borrow(), vec![vec![1, 2], vec![1, 2]]);
    }

    #[test]
    fn rejects_empty_and_oversized_argument_lists() {
        let f = |a: &[i32]| a.len();
        assert_eq!(
            apply_fixed_arity(f, Vec::<i32>::new()).err(),
            Some(CoreError::UnsupportedArity(0))
        );
        assert_eq!(
            apply_fixed_arity(f, vec![1, 2, 3, 4]).err(),
            Some(CoreError::UnsupportedArity(4))
        );
        assert!(apply_fixed_arity(f, vec![1, 2, 3]).is_ok());
    }

    #[test]
    fn shared_arguments_are_read_at_call_time() {
        let args = Rc::new(RefCell::new(vec![10, 20]));
        let sum = apply_fixed_arity(|a: &[i32]| a.iter().sum::<i32>(), Rc::clone(&args)).unwrap();
        args.borrow_mut()[1] = 5;
        assert_eq!(sum(), 15);
    }

    #[test]
    fn arity_is_fixed_at_binding() {
        let args = Rc::new(RefCell::new(vec![1]));
        let count = apply_fixed_arity(|a: &[i32]| a.to_vec(), Rc::clone(&args)).unwrap();
        args.borrow_mut().push(2);
        assert_eq!(count(), vec![1]);
        args.borrow_mut().clear();
        assert_eq!(count(), vec![0]);
    }
}
