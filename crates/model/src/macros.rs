/// Declares an entity type together with its typed property constants and
/// column mapping.
///
/// ```
/// model::entity! {
///     pub struct Order => "order" {
///         ID: "id" => "id" as Long,
///         CUSTOMER_ID: "customerId" => "customer_id" as Long,
///     }
/// }
///
/// assert_eq!(Order::CUSTOMER_ID.name(), "customerId");
/// ```
#[macro_export]
macro_rules! entity {
    (
        $vis:vis struct $name:ident => $table:literal {
            $( $konst:ident : $prop:literal => $column:literal as $ty:ident ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::core::entity::Entity for $name {
            const NAME: &'static str = stringify!($name);
            const TABLE: &'static str = $table;
        }

        impl $crate::core::entity::Mapped for $name {
            fn columns() -> Vec<$crate::metadata::ColumnMeta> {
                vec![
                    $(
                        $crate::metadata::ColumnMeta::new(
                            $prop,
                            $column,
                            $crate::core::data_type::DataType::$ty,
                        ),
                    )*
                ]
            }
        }

        #[allow(dead_code)]
        impl $name {
            $(
                pub const $konst: $crate::core::entity::Property<$name> =
                    $crate::core::entity::Property::new($prop);
            )*
        }
    };
}
