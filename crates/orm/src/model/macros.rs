//! `model!` - declare a model type
//!
//! ```ignore
//! tessera_orm::model! {
//!     pub struct BlogPost in "posts" {
//!         id: Option<i64>,
//!         title: String,
//!         slug: String,
//!     }
//!     fillable [title, slug]
//!     mutators { slug => |v: Value| Value::from(v.to_string().to_lowercase()) }
//! }
//! ```
//!
//! The table name is optional (`in "table"`), as is the primary key
//! (`key column`, default `id`). For every field the macro generates a
//! getter, a buffering `set_<field>` setter, and the async lookups
//! `find_by_<field>` / `count_by_<field>`.

#[doc(hidden)]
#[macro_export]
macro_rules! __model_option {
    () => {
        None
    };
    ($value:expr) => {
        Some($value)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __model_key {
    () => {
        "id"
    };
    ($key:ident) => {
        stringify!($key)
    };
}

#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(in $table:literal)? $(key $key:ident)? {
            $( $(#[$field_meta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
        $(fillable [ $( $fill:ident ),* $(,)? ])?
        $(mutators { $( $mutated:ident => $mutator:expr ),* $(,)? })?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        $vis struct $name {
            $( $(#[$field_meta])* pub $field: $ty, )*
            #[doc(hidden)]
            pub __state: $crate::model::RecordState,
        }

        impl $crate::model::Model for $name {
            const NAME: &'static str = stringify!($name);

            fn table_override() -> Option<&'static str> {
                $crate::__model_option!($($table)?)
            }

            fn primary_key_name() -> &'static str {
                $crate::__model_key!($($key)?)
            }

            fn columns() -> &'static [&'static str] {
                &[$(stringify!($field)),*]
            }

            fn fillable() -> &'static [&'static str] {
                &[$($(stringify!($fill)),*)?]
            }

            fn get_attribute(&self, column: &str) -> Option<$crate::value::Value> {
                match column {
                    $( stringify!($field) => Some($crate::value::Value::from(self.$field.clone())), )*
                    _ => None,
                }
            }

            fn set_attribute(
                &mut self,
                column: &str,
                value: $crate::value::Value,
            ) -> $crate::error::OrmResult<()> {
                match column {
                    $( stringify!($field) => {
                        self.$field = <$ty as $crate::value::FromValue>::from_value(value).map_err(|err| {
                            $crate::error::OrmError::hydration(format!(
                                "{}.{}: {}",
                                stringify!($name),
                                column,
                                err
                            ))
                        })?;
                        Ok(())
                    } )*
                    _ => Err($crate::error::OrmError::hydration(format!(
                        "{} has no column '{}'",
                        stringify!($name),
                        column
                    ))),
                }
            }

            #[allow(unused_variables)]
            fn mutate(&self, column: &str, value: $crate::value::Value) -> $crate::value::Value {
                match column {
                    $($( stringify!($mutated) => ($mutator)(value), )*)?
                    _ => value,
                }
            }

            fn record(&self) -> &$crate::model::RecordState {
                &self.__state
            }

            fn record_mut(&mut self) -> &mut $crate::model::RecordState {
                &mut self.__state
            }
        }

        $crate::paste::paste! {
            #[allow(dead_code)]
            impl $name {
                $(
                    pub fn $field(&self) -> &$ty {
                        &self.$field
                    }

                    /// Assign and buffer for the next `save`
                    pub fn [<set_ $field>](&mut self, value: $ty) -> &mut Self {
                        self.__state
                            .stage(stringify!($field), $crate::value::Value::from(value.clone()));
                        self.$field = value;
                        self
                    }

                    pub async fn [<find_by_ $field>](
                        db: &$crate::Database,
                        value: impl Into<$crate::value::Value>,
                    ) -> $crate::error::OrmResult<Option<Self>> {
                        <Self as $crate::model::QueryMethods>::find_by(db, stringify!($field), value).await
                    }

                    pub async fn [<count_by_ $field>](
                        db: &$crate::Database,
                        value: impl Into<$crate::value::Value>,
                    ) -> $crate::error::OrmResult<i64> {
                        <Self as $crate::model::QueryMethods>::count_by(db, stringify!($field), value).await
                    }
                )*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::model::{Model, ModelExtensions};
    use crate::value::Value;

    crate::model! {
        /// Product listing
        struct ProductCategory {
            id: Option<i64>,
            label: String,
            slug: String,
            position: i32,
        }
        fillable [label, slug]
        mutators { slug => |v: Value| Value::from(v.to_string().trim().to_lowercase()) }
    }

    crate::model! {
        struct Legacy in "tbl_legacy" key legacy_id {
            legacy_id: i64,
            payload: Option<String>,
        }
    }

    #[test]
    fn test_generated_metadata() {
        assert_eq!(ProductCategory::table_name(), "product_categories");
        assert_eq!(ProductCategory::primary_key_name(), "id");
        assert_eq!(ProductCategory::columns(), &["id", "label", "slug", "position"]);
        assert_eq!(Legacy::table_name(), "tbl_legacy");
        assert_eq!(Legacy::primary_key_name(), "legacy_id");
        assert!(Legacy::fillable().is_empty());
    }

    #[test]
    fn test_attributes_round_trip_through_values() {
        let mut category = ProductCategory::default();
        category.set_attribute("position", Value::from("3")).unwrap();
        category.set_attribute("id", Value::Int(8)).unwrap();

        assert_eq!(*category.position(), 3);
        assert_eq!(category.primary_key(), Some(Value::Int(8)));
        assert_eq!(category.get_attribute("label"), Some(Value::from("")));
        assert_eq!(category.get_attribute("missing"), None);
        assert!(category.set_attribute("missing", Value::Null).is_err());
        assert!(category.set_attribute("position", Value::from("three")).is_err());
    }

    #[test]
    fn test_fill_respects_fillable_and_mutators() {
        let mut category = ProductCategory::default();
        category
            .fill([("label", "Garden"), ("slug", "  Garden-Tools "), ("position", "9")])
            .unwrap();

        assert_eq!(category.label(), "Garden");
        assert_eq!(category.slug(), "garden-tools");
        assert_eq!(*category.position(), 0);
        assert_eq!(category.record().pending().len(), 2);
    }

    #[test]
    fn test_setters_buffer_writes() {
        let mut legacy = Legacy::default();
        legacy.set_payload(Some("blob".to_string())).set_legacy_id(4);

        assert_eq!(legacy.payload().as_deref(), Some("blob"));
        assert_eq!(
            legacy.record().pending(),
            &[
                ("payload".to_string(), Value::from("blob")),
                ("legacy_id".to_string(), Value::Int(4)),
            ]
        );
    }
}
