//! Per-type field schema for node parameters.
//!
//! Every node type declares its persistent fields once, through
//! [`node_params!`]: attribute name, Rust type, default.  The asset codec
//! reads and writes nodes only through [`FieldSet`], so adding a node type
//! never touches the codec.
//!
//! Text forms follow the tree asset format:
//!
//! | Type    | Form                          |
//! |---------|-------------------------------|
//! | `f32`   | `2.5`                         |
//! | `i32`   | `-3`                          |
//! | `bool`  | `True` / `False`              |
//! | `Vec2`  | `(1, 2)`                      |
//! | `Vec3`  | `(1, 2, 3)`                   |
//! | `Color` | `RGBA(1.000, 0.000, 1.000, 1.000)` |
//! | enums   | variant name                  |

use hz_core::{Color, Vec2, Vec3};
use hz_steering::LookMode;

/// Conversion between a field value and its attribute text.
pub trait FieldCodec: Sized {
    fn encode(&self) -> String;
    fn decode(raw: &str) -> Result<Self, String>;
}

/// A node's persistent parameters, addressable by attribute name.
pub trait FieldSet {
    /// Attribute names in declaration order.
    const FIELDS: &'static [&'static str];

    /// Append `(attribute, text)` for every field, in declaration order.
    fn write_fields(&self, out: &mut Vec<(&'static str, String)>);

    /// Set the field named `attr` from `raw`.  `Ok(false)` means this type
    /// has no such field.
    fn read_field(&mut self, attr: &str, raw: &str) -> Result<bool, String>;
}

// ── Primitive codecs ──────────────────────────────────────────────────────────

impl FieldCodec for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(raw: &str) -> Result<Self, String> {
        Ok(raw.to_owned())
    }
}

impl FieldCodec for f32 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Result<Self, String> {
        raw.trim().parse().map_err(|e| format!("not a float: {e}"))
    }
}

impl FieldCodec for i32 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Result<Self, String> {
        raw.trim().parse().map_err(|e| format!("not an integer: {e}"))
    }
}

impl FieldCodec for bool {
    fn encode(&self) -> String {
        if *self { "True" } else { "False" }.to_owned()
    }

    fn decode(raw: &str) -> Result<Self, String> {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if s.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err("expected True or False".to_owned())
        }
    }
}

/// Parse `prefix(a, b, ...)` into exactly `n` floats.
fn parse_tuple(raw: &str, prefix: &str, n: usize) -> Result<Vec<f32>, String> {
    let inner = raw
        .trim()
        .strip_prefix(prefix)
        .and_then(|s| s.strip_prefix('('))
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| format!("expected `{prefix}(...)`"))?;
    let parts = inner
        .split(',')
        .map(|p| {
            let p = p.trim();
            p.parse::<f32>().map_err(|e| format!("component `{p}`: {e}"))
        })
        .collect::<Result<Vec<f32>, String>>()?;
    if parts.len() != n {
        return Err(format!("expected {n} components, found {}", parts.len()));
    }
    Ok(parts)
}

impl FieldCodec for Vec2 {
    fn encode(&self) -> String {
        format!("({}, {})", self.x, self.y)
    }

    fn decode(raw: &str) -> Result<Self, String> {
        let c = parse_tuple(raw, "", 2)?;
        Ok(Vec2::new(c[0], c[1]))
    }
}

impl FieldCodec for Vec3 {
    fn encode(&self) -> String {
        format!("({}, {}, {})", self.x, self.y, self.z)
    }

    fn decode(raw: &str) -> Result<Self, String> {
        let c = parse_tuple(raw, "", 3)?;
        Ok(Vec3::new(c[0], c[1], c[2]))
    }
}

impl FieldCodec for Color {
    fn encode(&self) -> String {
        format!("RGBA({:.3}, {:.3}, {:.3}, {:.3})", self.r, self.g, self.b, self.a)
    }

    fn decode(raw: &str) -> Result<Self, String> {
        let c = parse_tuple(raw, "RGBA", 4)?;
        Ok(Color::rgba(c[0], c[1], c[2], c[3]))
    }
}

impl FieldCodec for LookMode {
    fn encode(&self) -> String {
        self.name().to_owned()
    }

    fn decode(raw: &str) -> Result<Self, String> {
        raw.trim().parse()
    }
}

// ── Declaration macros ────────────────────────────────────────────────────────

/// Declare a plain enum usable as a node field, encoded by variant name.
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant) ),*
                }
            }
        }

        impl $crate::field::FieldCodec for $name {
            fn encode(&self) -> String {
                self.name().to_owned()
            }

            fn decode(raw: &str) -> Result<Self, String> {
                let raw = raw.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name() == raw)
                    .ok_or_else(|| format!("no {} named `{}`", stringify!($name), raw))
            }
        }
    };
}

/// Declare a node parameter struct: one `field: Type = "Attribute" => default`
/// line per persistent field.
macro_rules! node_params {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $attr:literal => $default:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl $crate::field::FieldSet for $name {
            const FIELDS: &'static [&'static str] = &[$($attr),*];

            #[allow(unused_variables)]
            fn write_fields(&self, out: &mut Vec<(&'static str, String)>) {
                $( out.push(($attr, $crate::field::FieldCodec::encode(&self.$field))); )*
            }

            #[allow(unused_variables)]
            fn read_field(&mut self, attr: &str, raw: &str) -> Result<bool, String> {
                match attr {
                    $(
                        $attr => {
                            self.$field = $crate::field::FieldCodec::decode(raw)?;
                            Ok(true)
                        }
                    )*
                    _ => Ok(false),
                }
            }
        }
    };
}

pub(crate) use field_enum;
pub(crate) use node_params;
