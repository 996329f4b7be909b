// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The FHIRPath collection: an ordered sequence of boxed values. The
//! empty collection represents "no value" — there is no separate `null`.

use crate::boxed::BoxedValue;
use crate::quantity::UnitConverter;
use smallvec::SmallVec;
use std::ops::Index;

/// An ordered sequence of [`BoxedValue`]s. Most collections in practice
/// hold 0 or 1 items, so the backing store is a `SmallVec` to avoid a heap
/// allocation for the common case.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Collection(SmallVec<[BoxedValue; 1]>);

impl Collection {
    /// The empty collection.
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    /// A one-item collection.
    pub fn singleton(value: BoxedValue) -> Self {
        Self(SmallVec::from_elem(value, 1))
    }

    /// Build from an iterator.
    pub fn from_values(values: impl IntoIterator<Item = BoxedValue>) -> Self {
        Self(values.into_iter().collect())
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the empty collection.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over items by reference.
    pub fn iter(&self) -> std::slice::Iter<'_, BoxedValue> {
        self.0.iter()
    }

    /// Consume into an owned iterator.
    pub fn into_iter_owned(self) -> smallvec::IntoIter<[BoxedValue; 1]> {
        self.0.into_iter()
    }

    /// Access as a slice.
    pub fn as_slice(&self) -> &[BoxedValue] {
        &self.0
    }

    /// If this collection has exactly one item, return it; `None` for
    /// empty or multi-item collections. Callers that must *error* on
    /// multi-item input (the singleton-required rule, §4.4) use
    /// [`Collection::require_singleton`] instead.
    pub fn as_singleton(&self) -> Option<&BoxedValue> {
        if self.0.len() == 1 {
            self.0.first()
        } else {
            None
        }
    }

    /// Enforce the singleton rule: `Ok(None)` for empty input (empty
    /// propagates), `Ok(Some(value))` for exactly one item, `Err` for more
    /// than one — the caller attaches a source range to the error.
    pub fn require_singleton(&self) -> Result<Option<&BoxedValue>, ()> {
        match self.0.len() {
            0 => Ok(None),
            1 => Ok(self.0.first()),
            _ => Err(()),
        }
    }

    /// `first()`.
    pub fn first(&self) -> Collection {
        self.0.first().cloned().map(Collection::singleton).unwrap_or_default()
    }

    /// `last()`.
    pub fn last(&self) -> Collection {
        self.0.last().cloned().map(Collection::singleton).unwrap_or_default()
    }

    /// `tail()` — all but the first item.
    pub fn tail(&self) -> Collection {
        if self.0.is_empty() {
            Collection::empty()
        } else {
            Collection(self.0[1..].iter().cloned().collect())
        }
    }

    /// `skip(n)`.
    pub fn skip(&self, n: usize) -> Collection {
        Collection(self.0.iter().skip(n).cloned().collect())
    }

    /// `take(n)`.
    pub fn take(&self, n: usize) -> Collection {
        Collection(self.0.iter().take(n).cloned().collect())
    }

    /// 0-based index access; out-of-range (including negative, which
    /// callers translate before calling this) returns empty, never an
    /// error (§4.6 Index).
    pub fn get(&self, index: i64) -> Collection {
        if index < 0 {
            return Collection::empty();
        }
        self.0.get(index as usize).cloned().map(Collection::singleton).unwrap_or_default()
    }

    /// Append another collection's items after this one's, without
    /// deduplication — the `combine()` function's contract.
    pub fn combine(&self, other: &Collection) -> Collection {
        let mut items = self.0.clone();
        items.extend(other.0.iter().cloned());
        Collection(items)
    }

    /// Concatenate then deduplicate by deep equality, preserving first-
    /// seen order — the `|` operator and `union()` function's contract.
    pub fn union(&self, other: &Collection, converter: &dyn UnitConverter) -> Collection {
        self.combine(other).distinct(converter)
    }

    /// Deduplicate by deep equality, preserving first-seen order.
    pub fn distinct(&self, converter: &dyn UnitConverter) -> Collection {
        let mut out: SmallVec<[BoxedValue; 1]> = SmallVec::new();
        for item in self.0.iter() {
            if !out.iter().any(|kept| kept.deep_eq(item, converter)) {
                out.push(item.clone());
            }
        }
        Collection(out)
    }

    /// Whether every item is distinct from every other by deep equality.
    pub fn is_distinct(&self, converter: &dyn UnitConverter) -> bool {
        self.distinct(converter).len() == self.len()
    }

    /// Items present in both `self` and `other`, deduplicated, preserving
    /// `self`'s order — the `intersect()` function's contract.
    pub fn intersect(&self, other: &Collection, converter: &dyn UnitConverter) -> Collection {
        let deduped = self.distinct(converter);
        Collection(
            deduped
                .0
                .into_iter()
                .filter(|item| other.0.iter().any(|candidate| candidate.deep_eq(item, converter)))
                .collect(),
        )
    }

    /// Items in `self` that don't deep-equal any item in `other`. Per the
    /// open-question resolution in §9, `exclude()` does **not**
    /// deduplicate — every occurrence in `self` not matched in `other` is
    /// kept, mirroring `combine()`'s non-dedup behavior rather than
    /// `union()`'s.
    pub fn exclude(&self, other: &Collection, converter: &dyn UnitConverter) -> Collection {
        Collection(
            self.0
                .iter()
                .filter(|item| !other.0.iter().any(|candidate| candidate.deep_eq(item, converter)))
                .cloned()
                .collect(),
        )
    }

    /// Whether every item of `self` deep-equals some item of `other`.
    pub fn subset_of(&self, other: &Collection, converter: &dyn UnitConverter) -> bool {
        self.0.iter().all(|item| other.0.iter().any(|candidate| candidate.deep_eq(item, converter)))
    }

    /// Deep equality between two collections as whole values: same
    /// length, items equal pairwise in order (§4.4 — collections aren't
    /// singleton-coerced here, this is the raw structural compare used by
    /// `distinct`/`union`/etc., not the `=` operator which has its own
    /// empty-propagation and multi-item-is-elementwise rules in the
    /// comparison operator implementation).
    pub fn deep_eq(&self, other: &Collection, converter: &dyn UnitConverter) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.deep_eq(b, converter))
    }

    /// Order-independent equivalence between two collections (§4.4 — used
    /// by the `~` operator over multi-item operands).
    pub fn equivalent(&self, other: &Collection, converter: &dyn UnitConverter) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        let mut remaining: Vec<&BoxedValue> = other.0.iter().collect();
        for item in self.0.iter() {
            let Some(pos) = remaining.iter().position(|candidate| item.equivalent(candidate, converter)) else {
                return false;
            };
            remaining.remove(pos);
        }
        true
    }
}

impl Index<usize> for Collection {
    type Output = BoxedValue;
    fn index(&self, index: usize) -> &BoxedValue {
        &self.0[index]
    }
}

impl FromIterator<BoxedValue> for Collection {
    fn from_iter<T: IntoIterator<Item = BoxedValue>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = BoxedValue;
    type IntoIter = smallvec::IntoIter<[BoxedValue; 1]>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a BoxedValue;
    type IntoIter = std::slice::Iter<'a, BoxedValue>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::IdentityUnitConverter;

    fn ints(values: &[i64]) -> Collection {
        Collection::from_values(values.iter().map(|v| BoxedValue::integer(*v)))
    }

    #[test]
    fn union_dedups_combine_does_not() {
        let a = ints(&[1, 2, 3]);
        let b = ints(&[2, 3, 4]);
        let unioned = a.union(&b, &IdentityUnitConverter);
        assert_eq!(unioned.len(), 4);
        let combined = a.combine(&b);
        assert_eq!(combined.len(), 6);
    }

    #[test]
    fn union_is_idempotent() {
        let a = ints(&[1, 2, 3]);
        let unioned = a.union(&a, &IdentityUnitConverter);
        assert!(unioned.deep_eq(&a, &IdentityUnitConverter));
        let with_empty = a.union(&Collection::empty(), &IdentityUnitConverter);
        assert!(with_empty.deep_eq(&a, &IdentityUnitConverter));
    }

    #[test]
    fn exclude_preserves_duplicates_in_left_operand() {
        let a = ints(&[1, 1, 2, 3]);
        let b = ints(&[2]);
        let excluded = a.exclude(&b, &IdentityUnitConverter);
        assert_eq!(excluded.len(), 3);
    }

    #[test]
    fn require_singleton_errors_on_multi_item() {
        let multi = ints(&[1, 2]);
        assert!(multi.require_singleton().is_err());
        assert_eq!(Collection::empty().require_singleton(), Ok(None));
    }
}
