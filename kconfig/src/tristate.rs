//! Tristate values and symbol types.

use std::fmt;

/// Three-valued logic value: `n` (0), `m` (1) or `y` (2).
///
/// The ordering matches the numeric encoding, so `min`/`max` implement
/// `&&`/`||`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Tristate {
    #[default]
    N = 0,
    M = 1,
    Y = 2,
}

impl Tristate {
    /// Converts a numeric value (0, 1, 2).
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Tristate::N),
            1 => Some(Tristate::M),
            2 => Some(Tristate::Y),
            _ => None,
        }
    }

    /// Parses exactly `"n"`, `"m"` or `"y"`.
    pub fn from_str_exact(s: &str) -> Option<Self> {
        match s {
            "n" => Some(Tristate::N),
            "m" => Some(Tristate::M),
            "y" => Some(Tristate::Y),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tristate::N => "n",
            Tristate::M => "m",
            Tristate::Y => "y",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Tristate negation, `2 - v`.
    pub fn not(self) -> Self {
        match self {
            Tristate::N => Tristate::Y,
            Tristate::M => Tristate::M,
            Tristate::Y => Tristate::N,
        }
    }

    pub fn is_set(self) -> bool {
        self != Tristate::N
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for Tristate {
    fn from(b: bool) -> Self {
        if b { Tristate::Y } else { Tristate::N }
    }
}

/// Declared type of a symbol or choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymbolType {
    #[default]
    Unknown,
    Bool,
    Tristate,
    String,
    Int,
    Hex,
}

impl SymbolType {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolType::Unknown => "unknown",
            SymbolType::Bool => "bool",
            SymbolType::Tristate => "tristate",
            SymbolType::String => "string",
            SymbolType::Int => "int",
            SymbolType::Hex => "hex",
        }
    }

    pub fn is_bool_or_tristate(self) -> bool {
        matches!(self, SymbolType::Bool | SymbolType::Tristate)
    }

    pub fn is_int_or_hex(self) -> bool {
        matches!(self, SymbolType::Int | SymbolType::Hex)
    }

    /// Numeric base used when parsing values of this type. `0` means the base
    /// is detected from the prefix.
    pub(crate) fn base(self) -> u32 {
        match self {
            SymbolType::Hex => 16,
            SymbolType::Int => 10,
            _ => 0,
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice() {
        assert_eq!(Tristate::M.min(Tristate::Y), Tristate::M);
        assert_eq!(Tristate::N.max(Tristate::M), Tristate::M);
        assert_eq!(Tristate::M.not(), Tristate::M);
        assert_eq!(Tristate::Y.not(), Tristate::N);
        assert_eq!(Tristate::from_u8(3), None);
        assert_eq!(Tristate::from_str_exact("m"), Some(Tristate::M));
        assert_eq!(Tristate::from_str_exact("yes"), None);
    }
}
