// ABOUTME: Declarative macro that generates a settings type from a property list
// ABOUTME: Emits the struct, its AppSettings impl, and a getter/setter pair per property

/// Define a settings type whose properties are persisted automatically
///
/// ```
/// use app_settings::{app_settings, AppSettings, SettingsContext};
///
/// app_settings! {
///     pub struct PlayerSettings {
///         /// Display name
///         name, set_name: String;
///         volume, set_volume: f64;
///         muted, set_muted: bool;
///     }
///     ignored: [muted];
///     defaults: { volume => 0.8 };
/// }
///
/// let context = SettingsContext::in_memory();
/// let settings = PlayerSettings::default_settings_in(&context).unwrap();
/// settings.set_name("Rick").unwrap();
/// assert_eq!(settings.name(), "Rick");
/// assert_eq!(settings.volume(), 0.8);
/// ```
///
/// Property types must implement [`PropertyValue`](crate::PropertyValue) and
/// `Default`; use `Option<Url>` for URL properties.
///
/// A trailing `readonly:` section adds computed accessors. They are not part
/// of the schema and are never stored:
///
/// ```
/// use app_settings::{app_settings, AppSettings, SettingsContext};
///
/// app_settings! {
///     pub struct Profile {
///         name, set_name: String;
///     }
///     readonly: {
///         greeting: String = |this| format!("Hello, {}", this.name()),
///     };
/// }
///
/// let settings = Profile::default_settings_in(&SettingsContext::in_memory()).unwrap();
/// settings.set_name("Morty").unwrap();
/// assert_eq!(settings.greeting(), "Hello, Morty");
/// ```
#[macro_export]
macro_rules! app_settings {
    (
        $(#[$struct_meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$prop_meta:meta])*
                $prop:ident, $setter:ident : $ty:ty
            );* $(;)?
        }
        $( ignored: [ $($ignored:ident),* $(,)? ]; )?
        $( defaults: { $($default_prop:ident => $default:expr),* $(,)? }; )?
        $( readonly: {
            $(
                $(#[$ro_meta:meta])*
                $ro:ident : $ro_ty:ty = |$this:ident| $body:expr
            ),* $(,)?
        }; )?
    ) => {
        $(#[$struct_meta])*
        $vis struct $name {
            handle: $crate::SettingsHandle,
        }

        impl $crate::AppSettings for $name {
            #[allow(unused_variables)]
            fn declare_properties(schema: &mut $crate::SchemaBuilder) {
                $( schema.property::<$ty>(stringify!($prop)); )*
            }

            fn from_handle(handle: $crate::SettingsHandle) -> Self {
                Self { handle }
            }

            fn handle(&self) -> &$crate::SettingsHandle {
                &self.handle
            }

            fn ignored_properties() -> ::std::vec::Vec<&'static str> {
                ::std::vec![ $($( stringify!($ignored) ),*)? ]
            }

            fn default_property_values() -> $crate::DefaultValues {
                $crate::DefaultValues::new()
                    $($( .with(stringify!($default_prop), $default) )*)?
            }
        }

        impl $name {
            $(
                $(#[$prop_meta])*
                pub fn $prop(&self) -> $ty {
                    self.handle.get::<$ty>(stringify!($prop))
                }

                pub fn $setter(&self, value: impl ::std::convert::Into<$ty>) -> $crate::SettingsResult<()> {
                    self.handle.set::<$ty>(stringify!($prop), value.into())
                }
            )*

            $($(
                $(#[$ro_meta])*
                pub fn $ro(&self) -> $ro_ty {
                    let $this = self;
                    $body
                }
            )*)?
        }
    };
}
