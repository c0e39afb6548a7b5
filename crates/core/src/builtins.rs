//! The builtin catalogue: numeric ids, names, and arities shared by the
//! code generator (which needs to resolve a call's name to an id at
//! compile time) and the VM's dispatch table (which needs to resolve an
//! id back to a name for diagnostics). Ids are fixed by the original
//! reference implementation and must not be renumbered.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    Min(usize),
}

impl Arity {
    pub fn accepts(&self, argc: usize) -> bool {
        match *self {
            Arity::Exact(n) => argc == n,
            Arity::Range(lo, hi) => argc >= lo && argc <= hi,
            Arity::Min(lo) => argc >= lo,
        }
    }
}

pub struct BuiltinEntry {
    pub id: u32,
    pub name: &'static str,
    pub arity: Arity,
}

macro_rules! builtins {
    ($($id:expr => $name:expr, $arity:expr;)*) => {
        pub const BUILTINS: &[BuiltinEntry] = &[
            $(BuiltinEntry { id: $id, name: $name, arity: $arity },)*
        ];
    };
}

builtins! {
    1  => "print",        Arity::Min(1);
    2  => "printf",       Arity::Min(1);
    3  => "input",        Arity::Exact(0);
    4  => "readLine",     Arity::Exact(0);
    10 => "abs",          Arity::Exact(1);
    11 => "sqrt",         Arity::Exact(1);
    12 => "pow",          Arity::Exact(2);
    13 => "sin",          Arity::Exact(1);
    14 => "cos",          Arity::Exact(1);
    15 => "tan",          Arity::Exact(1);
    16 => "floor",        Arity::Exact(1);
    17 => "ceil",         Arity::Exact(1);
    18 => "round",        Arity::Exact(1);
    19 => "max",          Arity::Min(0);
    20 => "min",          Arity::Min(0);
    30 => "strLen",       Arity::Exact(1);
    31 => "substr",       Arity::Range(2, 3);
    32 => "toUpperCase",  Arity::Exact(1);
    33 => "toLowerCase",  Arity::Exact(1);
    34 => "strContains",  Arity::Exact(2);
    35 => "strIndexOf",   Arity::Exact(2);
    36 => "strReplace",   Arity::Exact(3);
    37 => "strTrim",      Arity::Exact(1);
    38 => "strSplit",     Arity::Exact(2);
    40 => "toInt",        Arity::Exact(1);
    41 => "toFloat",      Arity::Exact(1);
    42 => "toString",     Arity::Exact(1);
    43 => "toBool",       Arity::Exact(1);
    44 => "typeOf",       Arity::Exact(1);
    50 => "exit",         Arity::Range(0, 1);
    51 => "assert",       Arity::Range(1, 2);
    52 => "isNull",       Arity::Exact(1);
    53 => "isInt",        Arity::Exact(1);
    54 => "isFloat",      Arity::Exact(1);
    55 => "isString",     Arity::Exact(1);
    56 => "isBool",       Arity::Exact(1);
}

pub fn lookup_by_name(name: &str) -> Option<&'static BuiltinEntry> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn lookup_by_id(id: u32) -> Option<&'static BuiltinEntry> {
    BUILTINS.iter().find(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_reference_numbering() {
        assert_eq!(lookup_by_name("print").unwrap().id, 1);
        assert_eq!(lookup_by_name("abs").unwrap().id, 10);
        assert_eq!(lookup_by_name("strLen").unwrap().id, 30);
        assert_eq!(lookup_by_name("toInt").unwrap().id, 40);
        assert_eq!(lookup_by_name("exit").unwrap().id, 50);
    }

    #[test]
    fn substr_accepts_two_or_three_args() {
        let e = lookup_by_name("substr").unwrap();
        assert!(e.arity.accepts(2));
        assert!(e.arity.accepts(3));
        assert!(!e.arity.accepts(1));
    }

    #[test]
    fn round_trip_by_id() {
        let e = lookup_by_id(44).unwrap();
        assert_eq!(e.name, "typeOf");
    }
}
