//! Location-capturing push macros.

/// Path of the enclosing function, e.g. `my_crate::module::handler`.
#[macro_export]
macro_rules! function_path {
    () => {{
        fn marker() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = type_name_of(marker);
        match name.strip_suffix("::marker") {
            Some(path) => path,
            None => name,
        }
    }};
}

/// Push an error record at the first end, capturing `file!()`, `line!()`
/// and the enclosing function path.
///
/// ```
/// use strata_core::Allocator;
/// use strata_errstack::ErrorStack;
///
/// let mut errors = ErrorStack::new(&Allocator::system());
/// strata_errstack::push_first!(errors, -2).unwrap();
/// strata_errstack::push_first!(errors, -3, b"context").unwrap();
/// assert_eq!(errors.peek_first().unwrap().code(), -3);
/// ```
#[macro_export]
macro_rules! push_first {
    ($stack:expr, $code:expr) => {
        $crate::push_first!($stack, $code, &[])
    };
    ($stack:expr, $code:expr, $aux:expr) => {
        $stack.push_first(
            $code,
            ::core::file!(),
            u64::from(::core::line!()),
            $crate::function_path!(),
            $aux,
        )
    };
}

/// Push an error record at the last end. See [`push_first!`](crate::push_first!).
#[macro_export]
macro_rules! push_last {
    ($stack:expr, $code:expr) => {
        $crate::push_last!($stack, $code, &[])
    };
    ($stack:expr, $code:expr, $aux:expr) => {
        $stack.push_last(
            $code,
            ::core::file!(),
            u64::from(::core::line!()),
            $crate::function_path!(),
            $aux,
        )
    };
}
