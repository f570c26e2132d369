//! Internal testing utilities for the static-shape crates.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

/// Runs table-driven tests.
///
/// Define a `Debug` struct, conventionally named `Case`, holding the inputs
/// and expected result of one test. Build a collection of cases and call
/// `test_each` with the test body. Every case runs even if an earlier one
/// panics. Afterwards the test fails with the debug representation of each
/// failing case.
///
/// ```
/// use static_shape_testing::TestCases;
///
/// #[derive(Debug)]
/// struct Case {
///     dims: Vec<i64>,
///     expected: i64,
/// }
///
/// let cases = [
///     Case { dims: vec![1, 512], expected: 512 },
///     Case { dims: vec![], expected: 1 },
/// ];
///
/// cases.test_each(|case| {
///     assert_eq!(case.dims.iter().product::<i64>(), case.expected);
/// });
/// ```
///
/// Cases and any values captured by the test closure must be
/// [unwind safe](std::panic::UnwindSafe). Build values with interior
/// mutability inside the closure, or wrap them in
/// [`AssertUnwindSafe`](std::panic::AssertUnwindSafe).
pub trait TestCases {
    type Case;

    /// Call `test` with a reference to each case.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Call `test` with each case by value.
    ///
    /// Cases are formatted before the test runs, so that failures can still
    /// be reported after the case has been consumed.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| std::panic::catch_unwind(|| test(case)).is_err())
            .collect();
        report_failures(&failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe,
    {
        let mut failures = Vec::new();
        for case in self {
            let case_str = format!("{:?}", case);
            let test = &test;
            if std::panic::catch_unwind(move || test(case)).is_err() {
                failures.push(case_str);
            }
        }
        if !failures.is_empty() {
            panic!(
                "{} test cases failed:\n{}",
                failures.len(),
                failures.join("\n")
            );
        }
    }
}

fn report_failures<T: Debug>(failures: &[T]) {
    assert!(
        failures.is_empty(),
        "{} test cases failed: {:?}",
        failures.len(),
        failures
    );
}
