//! Convenience macros for building definitions and raising errors.
//!
//! # Usage
//!
//! ```rust
//! use standard_errors::{args, error_definitions, raise, Registry};
//!
//! let mut registry = Registry::builder().with_http_catalog(false).build();
//! let report = registry.expand(error_definitions! {
//!     "billing", namespace = "payments" => {
//!         CardDeclined = ("Card Declined", "Card ending ``last4`` was declined", ["last4"]),
//!         InsufficientFunds = ("Insufficient Funds", "Balance too low"),
//!     }
//! });
//! assert!(report.passed());
//!
//! let declined = registry.get("CardDeclined").unwrap();
//! let err = raise!(declined, "4242", serde_json::json!({"attempt": 2}));
//! assert_eq!(err.message(), "Card ending 4242 was declined");
//! assert_eq!(err.info(), Some(&serde_json::json!({"attempt": 2})));
//!
//! assert_eq!(args![1, "two", true].len(), 3);
//! ```

/// Build a `Vec<serde_json::Value>` of instance arguments.
///
/// Each argument is converted with `Value::from`, so numbers, strings,
/// booleans and ready-made `Value`s all work.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::__serde_json::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::__serde_json::Value::from($arg)),+]
    };
}

/// Instantiate an [`ErrorType`](crate::ErrorType) with positional arguments.
///
/// `raise!(ty, a, b)` is `ty.instantiate(args![a, b])`.
#[macro_export]
macro_rules! raise {
    ($ty:expr $(,)?) => {
        $ty.instantiate($crate::args![])
    };
    ($ty:expr, $($arg:expr),+ $(,)?) => {
        $ty.instantiate($crate::args![$($arg),+])
    };
}

/// Declare several definitions sharing one domain (and optionally one namespace).
///
/// Each entry is `Name = (title, message)` or
/// `Name = (title, message, [properties...])`; the identifier becomes the
/// error name. Expands to a `Vec<ErrorDefinition>`.
#[macro_export]
macro_rules! error_definitions {
    ($domain:expr, namespace = $ns:expr => { $($body:tt)* }) => {{
        let namespace = $crate::Namespace::from($ns);
        $crate::error_definitions!($domain => { $($body)* })
            .into_iter()
            .map(|definition| definition.namespace(namespace.clone()))
            .collect::<::std::vec::Vec<$crate::ErrorDefinition>>()
    }};
    ($domain:expr => {
        $( $name:ident = ($title:expr, $message:expr $(, [$($prop:expr),* $(,)?])? ) ),+ $(,)?
    }) => {
        ::std::vec![$(
            $crate::ErrorDefinition::entry(::std::stringify!($name), $domain, $title, $message)
                $( .properties(::std::vec![$(::std::string::String::from($prop)),*]) )?
        ),+]
    };
}
