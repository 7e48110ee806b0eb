//! The role hierarchy: object-property subsumption closure and the
//! chain indexes the completion engine consults.
use std::collections::VecDeque;

use log::debug;

use crate::model::ObjectProperty;
use crate::normalize::{NormalAxiom, NormalizedOntology};
use crate::store::{PairStore, TripletStore};

/// Reflexive-transitive role subsumption plus the length-two chain
/// axioms indexed from both ends.
#[derive(Clone, Debug, Default)]
pub struct RoleHierarchy {
    subsumers: PairStore<ObjectProperty>,
    // by_left[r] holds (s, q) for every chain r ∘ s ⊑ q
    by_left: TripletStore<ObjectProperty>,
    // by_right[s] holds (r, q) for every chain r ∘ s ⊑ q
    by_right: TripletStore<ObjectProperty>,
}

impl RoleHierarchy {
    pub fn build(norm: &NormalizedOntology) -> RoleHierarchy {
        let mut direct: PairStore<ObjectProperty> = PairStore::new();
        let mut by_left = TripletStore::new();
        let mut by_right = TripletStore::new();

        for ax in norm.axioms() {
            match ax {
                NormalAxiom::RoleInclusion { sub, sup } => {
                    direct.add(sub.clone(), sup.clone());
                }
                NormalAxiom::RoleChain { first, second, sup } => {
                    by_left.add(first.clone(), second.clone(), sup.clone());
                    by_right.add(second.clone(), first.clone(), sup.clone());
                }
                _ => {}
            }
        }

        // close each role's subsumers upward from the direct axioms
        let mut subsumers = PairStore::new();
        for r in norm.object_properties() {
            subsumers.add(r.clone(), r.clone());
            let mut queue: VecDeque<ObjectProperty> =
                direct.pairs_with_first(r).cloned().collect();
            while let Some(s) = queue.pop_front() {
                if subsumers.add(r.clone(), s.clone()) {
                    queue.extend(direct.pairs_with_first(&s).cloned());
                }
            }
        }

        debug!(
            "role hierarchy: {} subsumption pairs, {} chain axioms",
            subsumers.len(),
            by_left.len()
        );

        RoleHierarchy {
            subsumers,
            by_left,
            by_right,
        }
    }

    pub fn subsumers(&self) -> &PairStore<ObjectProperty> {
        &self.subsumers
    }

    /// All roles subsuming `r`, `r` itself included.
    pub fn supers(&self, r: &ObjectProperty) -> impl Iterator<Item = &ObjectProperty> {
        self.subsumers.pairs_with_first(r)
    }

    pub fn is_subproperty(&self, sub: &ObjectProperty, sup: &ObjectProperty) -> bool {
        self.subsumers.contains(sub, sup)
    }

    /// `(s, q)` for every chain `q0 ∘ s ⊑ q`.
    pub fn chains_with_left(
        &self,
        q0: &ObjectProperty,
    ) -> impl Iterator<Item = (&ObjectProperty, &ObjectProperty)> {
        self.by_left.triples_with_first(q0)
    }

    /// `(r, q)` for every chain `r ∘ q0 ⊑ q`.
    pub fn chains_with_right(
        &self,
        q0: &ObjectProperty,
    ) -> impl Iterator<Item = (&ObjectProperty, &ObjectProperty)> {
        self.by_right.triples_with_first(q0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{
        Build, Ontology, SubObjectPropertyExpression, SubObjectPropertyOf,
    };
    use crate::normalize::normalize;

    fn hierarchy_of(o: &Ontology) -> RoleHierarchy {
        RoleHierarchy::build(&normalize(o).unwrap())
    }

    #[test]
    fn reflexive_on_every_role() {
        let b = Build::new();
        let mut o = Ontology::new_with_build(b.clone());
        let r = o.object_property("http://www.example.com/r");
        let s = o.object_property("http://www.example.com/s");

        let h = hierarchy_of(&o);
        assert!(h.is_subproperty(&r, &r));
        assert!(h.is_subproperty(&s, &s));
        assert!(!h.is_subproperty(&r, &s));
    }

    #[test]
    fn transitively_closed() {
        let b = Build::new();
        let mut o = Ontology::new_with_build(b.clone());
        let r = o.object_property("http://www.example.com/r");
        let s = o.object_property("http://www.example.com/s");
        let t = o.object_property("http://www.example.com/t");
        o.insert(SubObjectPropertyOf {
            sub: r.clone().into(),
            sup: s.clone(),
        });
        o.insert(SubObjectPropertyOf {
            sub: s.clone().into(),
            sup: t.clone(),
        });

        let h = hierarchy_of(&o);
        assert!(h.is_subproperty(&r, &t));
        assert!(!h.is_subproperty(&t, &r));
        // closure survives a cycle
        let mut o2 = o.clone();
        o2.insert(SubObjectPropertyOf {
            sub: t.clone().into(),
            sup: r.clone(),
        });
        let h2 = hierarchy_of(&o2);
        assert!(h2.is_subproperty(&t, &r));
        assert!(h2.is_subproperty(&r, &t));
    }

    #[test]
    fn chains_indexed_both_ways() {
        let b = Build::new();
        let mut o = Ontology::new_with_build(b.clone());
        let r = o.object_property("http://www.example.com/r");
        let s = o.object_property("http://www.example.com/s");
        let q = o.object_property("http://www.example.com/q");
        o.insert(SubObjectPropertyOf {
            sub: SubObjectPropertyExpression::ObjectPropertyChain(vec![r.clone(), s.clone()]),
            sup: q.clone(),
        });

        let h = hierarchy_of(&o);
        let left: Vec<_> = h.chains_with_left(&r).collect();
        assert_eq!(left, vec![(&s, &q)]);
        let right: Vec<_> = h.chains_with_right(&s).collect();
        assert_eq!(right, vec![(&r, &q)]);
        assert!(h.chains_with_left(&s).next().is_none());
    }
}
