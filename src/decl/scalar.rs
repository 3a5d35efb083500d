use std::fmt;

/// Builtin value kinds, recognized by name only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    String,
    Byte,
    Rune,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

const NAMES: &[(&str, Scalar)] = &[
    ("bool", Scalar::Bool),
    ("string", Scalar::String),
    ("byte", Scalar::Byte),
    ("rune", Scalar::Rune),
    ("int", Scalar::Int),
    ("int8", Scalar::Int8),
    ("int16", Scalar::Int16),
    ("int32", Scalar::Int32),
    ("int64", Scalar::Int64),
    ("uint", Scalar::Uint),
    ("uint8", Scalar::Uint8),
    ("uint16", Scalar::Uint16),
    ("uint32", Scalar::Uint32),
    ("uint64", Scalar::Uint64),
    ("uintptr", Scalar::Uintptr),
    ("float32", Scalar::Float32),
    ("float64", Scalar::Float64),
    ("complex64", Scalar::Complex64),
    ("complex128", Scalar::Complex128),
];

impl Scalar {
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES.iter().find(|(n, _)| *n == name).map(|(_, s)| *s)
    }

    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, s)| *s == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for (name, scalar) in NAMES {
            assert_eq!(Scalar::from_name(name), Some(*scalar));
            assert_eq!(scalar.name(), *name);
        }
        assert_eq!(Scalar::from_name("Team"), None);
    }
}
