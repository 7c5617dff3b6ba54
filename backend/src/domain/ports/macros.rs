//! Defines the helper macro that generates port error enums.
//!
//! Every variant carries named fields and declares the [`FailureClass`] it
//! belongs to, so callers can decide how to log and propagate a failure
//! without matching on adapter-specific variants.
//!
//! [`FailureClass`]: crate::domain::FailureClass

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } as $class:ident => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field : $ty),* },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!("Build a `", stringify!($variant), "` error.")]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                        Self::$variant { $($field: $field.into()),* }
                    }
                }
            )*

            /// Failure class this error belongs to.
            pub fn class(&self) -> $crate::domain::FailureClass {
                match self {
                    $(Self::$variant { .. } => $crate::domain::FailureClass::$class,)*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for generated constructors and classes.
    use crate::domain::FailureClass;

    define_port_error! {
        pub enum ExamplePortError {
            Down { message: String } as UpstreamUnavailable => "down: {message}",
            Garbled { count: u32 } as MalformedResponse => "garbled: {count}",
            Lost { message: String, count: u32 } as PersistenceFailure => "lost: {message} ({count})",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExamplePortError::down("hello");
        assert_eq!(err.to_string(), "down: hello");
        assert_eq!(err.class(), FailureClass::UpstreamUnavailable);
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = ExamplePortError::garbled(42_u32);
        assert_eq!(err.to_string(), "garbled: 42");
        assert_eq!(err.class(), FailureClass::MalformedResponse);
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ExamplePortError::lost("disk", 3_u32);
        assert_eq!(err.to_string(), "lost: disk (3)");
        assert_eq!(err.class(), FailureClass::PersistenceFailure);
    }
}
