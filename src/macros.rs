#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Registry entry for one predicate operator.
///
/// ```ignore
/// operator! { name: "in_screen", arity: 2, flags: OpFlags::STRUCTURAL, eval: screen::in_screen }
/// operator! { name: "text_similar", arity: 2..=3, eval: text::text_similar }
/// ```
macro_rules! operator {
    (@max $min:literal) => {
        $min
    };
    (@max $min:literal, $max:literal) => {
        $max
    };
    (
        name: $name:literal,
        arity: $min:literal $(..= $max:literal)?
        $(, flags: $flags:expr)?
        , eval: $eval:path
        $(,)?
    ) => {
        $crate::engine::Operator {
            name: $name,
            min_args: $min,
            max_args: operator!(@max $min $(, $max)?),
            flags: { $crate::engine::OpFlags::empty() $(| $flags)? },
            eval: $eval,
        }
    };
}
