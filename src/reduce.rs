//! Union member de-duplication.
//!
//! The target rejects unions with two members of the same kind. Members are
//! keyed by kind in an insertion-ordered map: a repeated kind overwrites the
//! payload in the slot of its first occurrence ("last wins", first position).
//! A single surviving slot is returned bare instead of as a one-member union.
use indexmap::IndexMap;

use crate::validator::{LiteralValue, Validator, ValidatorKind};

/// How literal members are keyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiteralPolicy {
    /// All literals share the `literal` slot. Differing values are lost.
    #[default]
    CollapseByKind,
    /// Each distinct literal value gets its own slot.
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Kind(&'static str),
    Literal(LiteralValue),
}

fn slot_of(member: &Validator, policy: LiteralPolicy) -> Slot {
    match (&member.kind, policy) {
        (ValidatorKind::Literal { value }, LiteralPolicy::Preserve) => Slot::Literal(value.clone()),
        _ => Slot::Kind(member.kind_name()),
    }
}

/// Collapse already-converted, required members into one validator.
pub fn reduce<I>(members: I, policy: LiteralPolicy) -> Validator
where
    I: IntoIterator<Item = Validator>,
{
    let mut slots: IndexMap<Slot, Validator> = IndexMap::new();
    for member in members {
        let (index, replaced) = slots.insert_full(slot_of(&member, policy), member);
        let (Some(replaced), Some((_, kept))) = (replaced, slots.get_index(index)) else {
            continue;
        };
        if let (Some(lost), Some(value)) = (replaced.literal_value(), kept.literal_value()) {
            if lost != value {
                tracing::warn!(
                    lost = %lost,
                    kept = %value,
                    "union literals collapsed by kind; only the last value is enforced"
                );
            }
        }
    }
    if slots.len() == 1 {
        if let Some((_, only)) = slots.pop() {
            return only;
        }
    }
    Validator::union(slots.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(v: &Validator) -> Vec<&'static str> {
        v.members().unwrap().iter().map(Validator::kind_name).collect()
    }

    #[test]
    fn same_kind_collapses_to_bare_validator() {
        let v = reduce([Validator::string(), Validator::string()], LiteralPolicy::default());
        assert_eq!(v, Validator::string());
    }

    #[test]
    fn first_position_is_kept() {
        let v = reduce(
            [Validator::string(), Validator::float64(), Validator::string(), Validator::boolean()],
            LiteralPolicy::default(),
        );
        assert_eq!(kinds(&v), ["string", "float64", "boolean"]);
    }

    #[test]
    fn last_literal_wins_its_slot() {
        let v = reduce(
            [
                Validator::string(),
                Validator::literal("admin"),
                Validator::literal(404.0),
                Validator::literal(true),
            ],
            LiteralPolicy::CollapseByKind,
        );
        assert_eq!(kinds(&v), ["string", "literal"]);
        assert_eq!(v.members().unwrap()[1], Validator::literal(true));
    }

    #[test]
    fn all_literals_collapse_to_last() {
        let v = reduce(
            [Validator::literal("a"), Validator::literal("b"), Validator::literal("c")],
            LiteralPolicy::CollapseByKind,
        );
        assert_eq!(v, Validator::literal("c"));
    }

    #[test]
    fn preserve_policy_keeps_distinct_literals() {
        let v = reduce(
            [
                Validator::literal("a"),
                Validator::literal("b"),
                Validator::literal("a"),
                Validator::string(),
            ],
            LiteralPolicy::Preserve,
        );
        assert_eq!(
            v.members().unwrap(),
            &[Validator::literal("a"), Validator::literal("b"), Validator::string()]
        );
    }

    #[test]
    fn empty_input_is_an_empty_union() {
        let v = reduce(Vec::new(), LiteralPolicy::default());
        assert_eq!(v.members(), Some(&[][..]));
    }
}
