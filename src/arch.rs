use std::fmt::{self, Display, Formatter};

/// This macro declares an enum where the variant names match their string representation
/// and every variant maps to the target triple handed to the cross toolchain.
///
/// The variant set is closed, so resolving a triple is an exhaustive match. Parsing from the
/// command line goes through `clap::ValueEnum`, which rejects anything outside the set.
macro_rules! triple_enum {
    ($vis:vis enum $id:ident {$($(#[$attr:meta])* $n:ident => $triple:literal,)*}) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[allow(non_camel_case_types)]
        $vis enum $id {
            $(
                $(#[$attr])*
                $n,
            )*
        }
        impl $id {
            pub fn all() -> &'static [$id] {
                static X: &[$id] = &[
                    $(
                        $id::$n,
                    )*
                ];
                X
            }
            /// Key used on the command line and in artifact names.
            pub fn key(self) -> &'static str {
                match self {
                    $(
                        $id::$n => stringify!($n),
                    )*
                }
            }
            pub fn triple(self) -> &'static str {
                match self {
                    $(
                        $id::$n => $triple,
                    )*
                }
            }
        }
        impl Display for $id {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
        impl clap::ValueEnum for $id {
            fn value_variants<'a>() -> &'a [Self] {
                Self::all()
            }
            fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
                Some(clap::builder::PossibleValue::new(self.key()).help(self.triple()))
            }
        }
    };
}

triple_enum! {
    pub enum Arch {
        amd64 => "x86_64-unknown-linux-musl",
        arm64 => "aarch64-unknown-linux-musl",
        /// Not hard-float, so a single binary runs on every 32-bit ARM board.
        arm => "arm-unknown-linux-musleabi",
        armv7 => "armv7-unknown-linux-musleabihf",
    }
}

impl Default for Arch {
    fn default() -> Self {
        Arch::amd64
    }
}
