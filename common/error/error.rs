/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{error::Error, fmt};

pub trait HypergraphError {
    fn variant_name(&self) -> &'static str;

    fn component(&self) -> &'static str;

    fn code(&self) -> &'static str;

    fn code_prefix(&self) -> &'static str;

    fn code_number(&self) -> usize;

    fn format_description(&self) -> String;

    fn source_error(&self) -> Option<&(dyn Error + Sync)>;

    fn source_hypergraph_error(&self) -> Option<&(dyn HypergraphError + Sync)>;

    fn root_source_hypergraph_error(&self) -> &(dyn HypergraphError + Sync)
    where
        Self: Sized + Sync,
    {
        let mut error: &(dyn HypergraphError + Sync) = self;
        while let Some(source) = error.source_hypergraph_error() {
            error = source;
        }
        error
    }

    fn format_code_and_description(&self) -> String {
        format!("[{}] {}", self.code(), self.format_description())
    }
}

impl PartialEq for dyn HypergraphError {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for dyn HypergraphError {}

impl fmt::Debug for dyn HypergraphError + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for dyn HypergraphError + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = self.source_hypergraph_error() {
            write!(f, "{}\nCause: \n      {:?}", self.format_code_and_description(), source as &dyn HypergraphError)
        } else if let Some(source) = self.source_error() {
            write!(f, "{}\nCause: \n      {:?}", self.format_code_and_description(), source)
        } else {
            write!(f, "{}", self.format_code_and_description())
        }
    }
}

impl<T: HypergraphError> HypergraphError for Box<T> {
    fn variant_name(&self) -> &'static str {
        (**self).variant_name()
    }

    fn component(&self) -> &'static str {
        (**self).component()
    }

    fn code(&self) -> &'static str {
        (**self).code()
    }

    fn code_prefix(&self) -> &'static str {
        (**self).code_prefix()
    }

    fn code_number(&self) -> usize {
        (**self).code_number()
    }

    fn format_description(&self) -> String {
        (**self).format_description()
    }

    fn source_error(&self) -> Option<&(dyn Error + Sync)> {
        (**self).source_error()
    }

    fn source_hypergraph_error(&self) -> Option<&(dyn HypergraphError + Sync)> {
        (**self).source_hypergraph_error()
    }
}

// ***USAGE WARNING***: We should not set both source and hypergraph_source, hypergraph_source has precedence!
#[macro_export]
macro_rules! hypergraph_error {
    ($vis:vis $name:ident(component = $component:literal, prefix = $prefix:literal) { $(
        $variant:ident($number:literal, $description:literal $(, $($arg:tt)*)?),
    )*}) => {
        #[derive(Clone)]
        $vis enum $name {
            $($variant { $($($arg)*)? }),*
        }

        const _: () = {
            // fail to compile if any Numbers are the same
            trait Assert {}
            $(impl Assert for [(); $number ] {})*
        };

        impl $crate::HypergraphError for $name {
            fn variant_name(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => stringify!($variant),)*
                }
            }

            fn component(&self) -> &'static str {
                &$component
            }

            fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => concat!($prefix, stringify!($number)),)*
                }
            }

            fn code_prefix(&self) -> &'static str {
                $prefix
            }

            fn code_number(&self) -> usize {
                match self {
                    $(Self::$variant { .. } => $number,)*
                }
            }

            fn format_description(&self) -> String {
                match self {
                    $(hypergraph_error!(@args $variant { $($($arg)*)? }) => format!($description),)*
                }
            }

            fn source_error(&self) -> Option<&(dyn ::std::error::Error + Sync + 'static)> {
                match self {
                    $(hypergraph_error!(@source source from $variant { $($($arg)*)? })=> {
                        hypergraph_error!(@source source { $($($arg)*)? })
                    })*
                }
            }

            fn source_hypergraph_error(&self) -> Option<&(dyn $crate::HypergraphError + Sync + 'static)> {
                match self {
                    $(hypergraph_error!(@hypergraph_source hypergraph_source from $variant { $($($arg)*)? })=> {
                        hypergraph_error!(@hypergraph_source hypergraph_source { $($($arg)*)? })
                    })*
                }
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(self as &dyn $crate::HypergraphError, f)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(self, f)
            }
        }
    };

    (@args $variant:ident { $($arg:ident : $ty:ty),* $(,)? }) => {
        Self::$variant { $($arg),* }
    };

    (@source $ts:ident from $variant:ident { source : $argty:ty $(, $($rest:tt)*)? }) => {
        Self::$variant { source: $ts, .. }
    };
    (@source $ts:ident from $variant:ident { $arg:ident : $argty:ty $(, $($rest:tt)*)? }) => {
        hypergraph_error!(@source $ts from $variant { $($($rest)*)? })
    };
    (@source $ts:ident from $variant:ident { $(,)? }) => {
        Self::$variant { .. }
    };

    (@source $ts:ident { source: $_:ty $(, $($rest:tt)*)? }) => {
        Some($ts as &(dyn ::std::error::Error + Sync + 'static))
    };
    (@source $ts:ident { $arg:ident : $argty:ty $(, $($rest:tt)*)? }) => {
        hypergraph_error!(@source $ts { $($($rest)*)? })
    };
    (@source $ts:ident { $(,)? }) => {
        None
    };

    (@hypergraph_source $ts:ident from $variant:ident { hypergraph_source : $argty:ty $(, $($rest:tt)*)? }) => {
        Self::$variant { hypergraph_source: $ts, .. }
    };
    (@hypergraph_source $ts:ident from $variant:ident { $arg:ident : $argty:ty $(, $($rest:tt)*)? }) => {
        hypergraph_error!(@hypergraph_source $ts from $variant { $($($rest)*)? })
    };
    (@hypergraph_source $ts:ident from $variant:ident { $(,)? }) => {
        Self::$variant { .. }
    };

    (@hypergraph_source $ts:ident { hypergraph_source: $_:ty $(, $($rest:tt)*)? }) => {
        Some($ts as &(dyn $crate::HypergraphError + Sync + 'static))
    };
    (@hypergraph_source $ts:ident { $arg:ident : $argty:ty $(, $($rest:tt)*)? }) => {
        hypergraph_error!(@hypergraph_source $ts { $($($rest)*)? })
    };
    (@hypergraph_source $ts:ident { $(,)? }) => {
        None
    };
}
