//! Macros for reducing boilerplate when defining presentable entities
//!
//! These macros generate the [`Model`](crate::core::entity::Model) and
//! [`Attributes`](crate::core::entity::Attributes) implementations a presenter
//! needs. Field declaration order becomes the attribute order.

/// Implement `Model` and `Attributes` for an existing struct
///
/// Every listed field must implement `serde::Serialize`.
///
/// # Example
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct User {
///     id: u64,
///     name: String,
///     password_hash: String,
/// }
///
/// model_attributes!(User, [id, name, password_hash]);
/// ```
#[macro_export]
macro_rules! model_attributes {
    ($type:ty, [ $( $field:ident ),* $(,)? ]) => {
        impl $crate::core::entity::Model for $type {
            fn attribute_names() -> &'static [&'static str] {
                &[ $( stringify!($field) ),* ]
            }
        }

        impl $crate::core::entity::Attributes for $type {
            fn attribute(&self, name: &str) -> Option<::serde_json::Value> {
                match name {
                    $( stringify!($field) => ::serde_json::to_value(&self.$field).ok(), )*
                    _ => None,
                }
            }
        }
    };
}

/// Declare a serde struct together with its `Model` and `Attributes` implementations
///
/// # Example
///
/// ```rust,ignore
/// use shape::prelude::*;
///
/// impl_model!(User {
///     id: u64,
///     name: String,
///     email: String,
/// });
///
/// assert_eq!(User::attribute_names(), &["id", "name", "email"]);
/// ```
#[macro_export]
macro_rules! impl_model {
    (
        $type:ident {
            $( $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            $( pub $field : $field_type ),*
        }

        $crate::model_attributes!($type, [ $( $field ),* ]);
    };
}
