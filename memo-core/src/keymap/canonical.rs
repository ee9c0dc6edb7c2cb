// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Canonicalization
//!
//! Turns a bound call — positional arguments plus named arguments, already
//! matched against the wrapped function's parameters via [`SignatureBinder`]
//! (Rust has no reflective argument binding, so the binding happens at the
//! call site instead of at runtime) — into a single canonical [`CanonArg`]
//! tree, applying the typing, flattening, and ignore policies in that
//! order.

use crate::encoder::canonical_f64_bits;
use crate::key::CanonArg;

/// A single argument value, already bound to its declared name if it has
/// one. This is the shape the decorator macro produces for every call; it
/// replaces the reflective argument binding the source library performs at
/// runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<ArgValue>),
    /// An argument that cannot be reduced to any of the above — e.g. a
    /// trait object, a raw resource handle, or anything else with no
    /// stable canonical form. A [`SignatureBinder`] impl emits this for
    /// such an argument instead of failing to compile a `bind()`; it
    /// canonicalizes to [`CanonArg::Unrepresentable`], which every keymap
    /// variant refuses to encode.
    Unrepresentable,
}

/// A single positional or named argument slot in a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    /// `Some(name)` for a keyword/named argument; `None` for a purely
    /// positional one. Only named arguments can appear in an ignore list
    /// by name; positional arguments are ignored by index.
    pub name: Option<String>,
    pub value: ArgValue,
}

impl Arg {
    pub fn positional(value: ArgValue) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: ArgValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// The full argument vector for one call, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call(pub Vec<Arg>);

impl Call {
    pub fn new(args: Vec<Arg>) -> Self {
        Self(args)
    }
}

/// Reproduces argument-signature binding "from first principles" for a
/// language without reflective call inspection. Rust cannot ask
/// an arbitrary function for its parameter names and defaults at runtime,
/// so the binding happens at the call site instead: an implementor
/// declares how its own argument type flattens into a canonical [`Call`],
/// tagging each field as positional or named exactly once, here, rather
/// than the keymap re-deriving it on every call.
pub trait SignatureBinder {
    fn bind(&self) -> Call;
}

/// Names or positions to strip before key formation, e.g. masking a
/// `verbose=` flag so it never participates in the cache key.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    pub names: Vec<String>,
    pub positions: Vec<usize>,
}

impl IgnoreList {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn names(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            positions: Vec::new(),
        }
    }

    pub fn positions(positions: impl IntoIterator<Item = usize>) -> Self {
        Self {
            names: Vec::new(),
            positions: positions.into_iter().collect(),
        }
    }
}

/// Canonicalization policy, independent of which keymap variant finally
/// encodes the result.
#[derive(Debug, Clone)]
pub struct CanonicalConfig {
    /// Retain a type discriminant alongside each argument so `1` and
    /// `1.0` map to distinct keys. When `false`, type discriminants are
    /// dropped and numeric argument kinds that encode to the same
    /// `CanonArg` shape collapse together.
    pub typed: bool,
    /// Merge positional and named parameters into one ordered sequence by
    /// declaration order. When `false`, the canonical form keeps
    /// `(pos_seq, named_seq_sorted)` as a pair.
    pub flat: bool,
    pub ignore: IgnoreList,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            typed: false,
            flat: true,
            ignore: IgnoreList::none(),
        }
    }
}

fn type_tag(value: &ArgValue) -> &'static str {
    match value {
        ArgValue::Unit => "unit",
        ArgValue::Bool(_) => "bool",
        ArgValue::Int(_) => "int",
        ArgValue::UInt(_) => "uint",
        ArgValue::Float(_) => "float",
        ArgValue::Str(_) => "str",
        ArgValue::Bytes(_) => "bytes",
        ArgValue::Seq(_) => "seq",
        ArgValue::Unrepresentable => "unrepresentable",
    }
}

fn lower(value: &ArgValue) -> CanonArg {
    match value {
        ArgValue::Unit => CanonArg::Unit,
        ArgValue::Bool(b) => CanonArg::Bool(*b),
        ArgValue::Int(i) => CanonArg::Int(*i),
        ArgValue::UInt(u) => CanonArg::UInt(*u),
        ArgValue::Float(f) => CanonArg::FloatBits(canonical_f64_bits(*f)),
        ArgValue::Str(s) => CanonArg::Str(s.clone()),
        ArgValue::Bytes(b) => CanonArg::Bytes(b.clone()),
        ArgValue::Seq(items) => CanonArg::Seq(items.iter().map(lower).collect()),
        ArgValue::Unrepresentable => CanonArg::Unrepresentable,
    }
}

/// Whether `arg` or any argument nested inside it is
/// [`CanonArg::Unrepresentable`] — the signal a keymap variant uses to
/// refuse encoding a canonical form.
pub fn contains_unrepresentable(arg: &CanonArg) -> bool {
    match arg {
        CanonArg::Unrepresentable => true,
        CanonArg::Seq(items) => items.iter().any(contains_unrepresentable),
        CanonArg::Named(_, inner) | CanonArg::Typed(_, inner) => contains_unrepresentable(inner),
        _ => false,
    }
}

fn canonicalize_one(value: &ArgValue, typed: bool) -> CanonArg {
    let canon = lower(value);
    if typed {
        CanonArg::Typed(type_tag(value), Box::new(canon))
    } else {
        canon
    }
}

/// Applies the ignore list, typing policy, and flattening policy to a bound
/// call, producing the single [`CanonArg`] tree that a keymap variant
/// encodes. A call whose positional/named arguments are already in
/// declaration order (the decorator macro binds them that way) needs no
/// further signature inspection.
pub fn canonicalize(call: &Call, config: &CanonicalConfig) -> CanonArg {
    let mut positional = Vec::new();
    let mut named = Vec::new();

    for (index, arg) in call.0.iter().enumerate() {
        match &arg.name {
            Some(name) => {
                if config.ignore.names.iter().any(|n| n == name) {
                    continue;
                }
                let canon = canonicalize_one(&arg.value, config.typed);
                named.push((name.clone(), canon));
            }
            None => {
                if config.ignore.positions.contains(&index) {
                    continue;
                }
                positional.push(canonicalize_one(&arg.value, config.typed));
            }
        }
    }

    named.sort_by(|a, b| a.0.cmp(&b.0));
    let named: Vec<CanonArg> = named
        .into_iter()
        .map(|(name, canon)| CanonArg::Named(name, Box::new(canon)))
        .collect();

    if config.flat {
        let mut all = positional;
        all.extend(named);
        CanonArg::Seq(all)
    } else {
        CanonArg::Seq(vec![CanonArg::Seq(positional), CanonArg::Seq(named)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_with_verbose(verbose: bool) -> Call {
        Call::new(vec![
            Arg::positional(ArgValue::Int(1)),
            Arg::named("verbose", ArgValue::Bool(verbose)),
        ])
    }

    #[test]
    fn ignore_list_masks_named_argument() {
        let config = CanonicalConfig {
            ignore: IgnoreList::names(["verbose"]),
            ..Default::default()
        };
        let a = canonicalize(&call_with_verbose(true), &config);
        let b = canonicalize(&call_with_verbose(false), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn typed_distinguishes_int_from_float() {
        let typed = CanonicalConfig {
            typed: true,
            ..Default::default()
        };
        let untyped = CanonicalConfig::default();

        let int_call = Call::new(vec![Arg::positional(ArgValue::Int(1))]);
        let float_call = Call::new(vec![Arg::positional(ArgValue::Float(1.0))]);

        assert_ne!(
            canonicalize(&int_call, &typed),
            canonicalize(&float_call, &typed)
        );
        assert_eq!(
            canonicalize(&int_call, &untyped),
            canonicalize(&float_call, &untyped)
        );
    }

    #[test]
    fn positional_ignore_by_index() {
        let config = CanonicalConfig {
            ignore: IgnoreList::positions([1]),
            ..Default::default()
        };
        let a = Call::new(vec![
            Arg::positional(ArgValue::Int(1)),
            Arg::positional(ArgValue::Int(999)),
        ]);
        let b = Call::new(vec![
            Arg::positional(ArgValue::Int(1)),
            Arg::positional(ArgValue::Int(42)),
        ]);
        assert_eq!(canonicalize(&a, &config), canonicalize(&b, &config));
    }

    #[test]
    fn flat_vs_nested_shape_differs_but_is_stable() {
        let call = call_with_verbose(true);
        let flat = CanonicalConfig {
            flat: true,
            ..Default::default()
        };
        let nested = CanonicalConfig {
            flat: false,
            ..Default::default()
        };
        let a1 = canonicalize(&call, &flat);
        let a2 = canonicalize(&call, &flat);
        assert_eq!(a1, a2);
        assert_ne!(a1, canonicalize(&call, &nested));
    }

    #[test]
    fn nan_payloads_canonicalize_identically() {
        let config = CanonicalConfig::default();
        let a = Call::new(vec![Arg::positional(ArgValue::Float(f64::NAN))]);
        let b = Call::new(vec![Arg::positional(ArgValue::Float(f64::from_bits(
            0x7ff0_0000_0000_0001,
        )))]);
        assert_eq!(canonicalize(&a, &config), canonicalize(&b, &config));
    }
}
