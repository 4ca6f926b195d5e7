/// Configuration struct declaration macro
///
/// Declares a configuration section with each field's default inline, so the
/// struct, its `Default` impl and its serde behaviour never drift apart.
///
/// ```
/// notification_hub::config_struct! {
///     /// Dispatch tuning
///     pub struct DispatchTuning {
///         workers: usize = 8,
///         queue_size: usize = 1024,
///     }
/// }
///
/// let tuning: DispatchTuning = toml::from_str("workers = 2").unwrap();
/// assert_eq!(tuning.workers, 2);
/// assert_eq!(tuning.queue_size, 1024);
/// ```
///
/// Fields missing from the TOML source take their declared default.
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
