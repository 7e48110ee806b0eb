//! ABox saturation: materializing every entailed class-membership and
//! property assertion into two flat tables.
use log::debug;

use crate::hierarchy::RoleHierarchy;
use crate::model::{Class, NamedIndividual, ObjectProperty, Ontology, IRI};
use crate::normalize::{NormalAxiom, NormalizedOntology};
use crate::reason::Classification;
use crate::store::{PairStore, TripletStore};

/// A row of the saturated `ClassAssertion` table.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClassAssertionRow {
    pub individual: IRI,
    pub class_name: IRI,
}

/// A row of the saturated `ObjectPropertyAssertion` table.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectPropertyAssertionRow {
    pub object_property: IRI,
    pub left_individual: IRI,
    pub right_individual: IRI,
}

/// The saturated ABox as two ordered tables.
///
/// Only entities of the source ontology appear; auxiliaries
/// introduced by normalization are filtered out during emission.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SaturatedABox {
    pub class_assertions: Vec<ClassAssertionRow>,
    pub property_assertions: Vec<ObjectPropertyAssertionRow>,
}

impl SaturatedABox {
    pub fn len(&self) -> usize {
        self.class_assertions.len() + self.property_assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_assertions.is_empty() && self.property_assertions.is_empty()
    }
}

/// Saturate the ABox under the computed subsumers and the role
/// chains.
pub fn saturate(
    original: &Ontology,
    norm: &NormalizedOntology,
    roles: &RoleHierarchy,
    classification: &Classification,
) -> SaturatedABox {
    let class_assertions = saturate_classes(original, norm, classification);
    let property_assertions = saturate_properties(original, norm, roles);

    debug!(
        "saturated ABox: {} class assertions, {} property assertions",
        class_assertions.len(),
        property_assertions.len()
    );

    SaturatedABox {
        class_assertions,
        property_assertions,
    }
}

/// Every individual carries every subsumer of its asserted classes.
fn saturate_classes(
    original: &Ontology,
    norm: &NormalizedOntology,
    classification: &Classification,
) -> Vec<ClassAssertionRow> {
    let mut seen: PairStore<NamedIndividual, Class> = PairStore::new();
    let mut rows = Vec::new();
    for ax in norm.axioms() {
        if let NormalAxiom::ClassAssertion { class, individual } = ax {
            for sup in classification.subsumers().pairs_with_first(class) {
                if original.is_class(sup) && seen.add(individual.clone(), sup.clone()) {
                    rows.push(ClassAssertionRow {
                        individual: individual.0.clone(),
                        class_name: sup.0.clone(),
                    });
                }
            }
        }
    }
    rows
}

/// Asserted property facts, closed upward through the role hierarchy
/// and then under the role chains to fixpoint.
fn saturate_properties(
    original: &Ontology,
    norm: &NormalizedOntology,
    roles: &RoleHierarchy,
) -> Vec<ObjectPropertyAssertionRow> {
    let mut working: TripletStore<ObjectProperty, NamedIndividual, NamedIndividual> =
        TripletStore::new();
    let mut chains = Vec::new();

    for ax in norm.axioms() {
        match ax {
            NormalAxiom::PropertyAssertion { role, from, to } => {
                for q in roles.supers(role) {
                    working.add(q.clone(), from.clone(), to.clone());
                }
            }
            NormalAxiom::RoleChain { first, second, sup } => {
                chains.push((first.clone(), second.clone(), sup.clone()));
            }
            _ => {}
        }
    }

    loop {
        let mut changed = false;
        for (first, second, sup) in &chains {
            let sups: Vec<ObjectProperty> = roles.supers(sup).cloned().collect();
            let left_pairs: Vec<(NamedIndividual, NamedIndividual)> = working
                .triples_with_first(first)
                .map(|(a, m)| (a.clone(), m.clone()))
                .collect();
            for (a, middle) in left_pairs {
                let ends: Vec<NamedIndividual> = working
                    .triples_with_first_two(second, &middle)
                    .cloned()
                    .collect();
                for b in ends {
                    for q in &sups {
                        if working.add(q.clone(), a.clone(), b.clone()) {
                            changed = true;
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    working
        .iter()
        .filter(|(p, _, _)| original.is_object_property(p))
        .map(|(p, a, b)| ObjectPropertyAssertionRow {
            object_property: p.0.clone(),
            left_individual: a.0.clone(),
            right_individual: b.0.clone(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{
        ClassAssertion, ClassExpression, ObjectPropertyAssertion, SubClassOf,
        SubObjectPropertyExpression, SubObjectPropertyOf,
    };
    use crate::normalize::normalize;
    use crate::reason::classify;
    use crate::vocab::{WithIRI, OWL};

    const NS: &str = "http://www.example.com/";

    fn iri(frag: &str) -> String {
        format!("{}{}", NS, frag)
    }

    fn saturate_ontology(o: &Ontology) -> SaturatedABox {
        let norm = normalize(o).unwrap();
        let roles = RoleHierarchy::build(&norm);
        let classification = classify(&norm, &roles);
        saturate(o, &norm, &roles, &classification)
    }

    fn has_property(abox: &SaturatedABox, p: &str, l: &str, r: &str) -> bool {
        abox.property_assertions.iter().any(|row| {
            &row.object_property[..] == p
                && &row.left_individual[..] == l
                && &row.right_individual[..] == r
        })
    }

    fn has_class(abox: &SaturatedABox, i: &str, c: &str) -> bool {
        abox.class_assertions
            .iter()
            .any(|row| &row.individual[..] == i && &row.class_name[..] == c)
    }

    #[test]
    fn class_closure_follows_subsumers() {
        let mut o = Ontology::new();
        let student = o.class(iri("Student"));
        let person = o.class(iri("Person"));
        let alice = o.named_individual(iri("alice"));
        o.insert(SubClassOf {
            sub: student.clone().into(),
            sup: person.into(),
        });
        o.insert(ClassAssertion {
            ce: student.into(),
            i: alice,
        });

        let abox = saturate_ontology(&o);
        assert!(has_class(&abox, &iri("alice"), &iri("Student")));
        assert!(has_class(&abox, &iri("alice"), &iri("Person")));
        assert!(has_class(&abox, &iri("alice"), OWL::Thing.iri_s()));
        assert_eq!(abox.class_assertions.len(), 3);
    }

    #[test]
    fn auxiliaries_stay_out_of_the_tables() {
        let mut o = Ontology::new();
        let person = o.class(iri("Person"));
        let knows = o.object_property(iri("knows"));
        let alice = o.named_individual(iri("alice"));
        // a complex assertion forces an auxiliary class
        o.insert(ClassAssertion {
            ce: ClassExpression::ObjectSomeValuesFrom {
                ope: knows,
                bce: Box::new(person.into()),
            },
            i: alice,
        });

        let abox = saturate_ontology(&o);
        for row in &abox.class_assertions {
            assert!(
                !row.class_name.starts_with("C_"),
                "auxiliary {} leaked into the ABox",
                row.class_name
            );
        }
        // alice is still below owl:Thing
        assert!(has_class(&abox, &iri("alice"), OWL::Thing.iri_s()));
    }

    #[test]
    fn property_closure_follows_role_subsumption() {
        let mut o = Ontology::new();
        let r = o.object_property(iri("r"));
        let s = o.object_property(iri("s"));
        let a = o.named_individual(iri("a"));
        let b = o.named_individual(iri("b"));
        o.insert(SubObjectPropertyOf {
            sub: r.clone().into(),
            sup: s,
        });
        o.insert(ObjectPropertyAssertion {
            ope: r,
            from: a,
            to: b,
        });

        let abox = saturate_ontology(&o);
        assert!(has_property(&abox, &iri("r"), &iri("a"), &iri("b")));
        assert!(has_property(&abox, &iri("s"), &iri("a"), &iri("b")));
    }

    #[test]
    fn role_chain_composes_assertions() {
        let mut o = Ontology::new();
        let r = o.object_property(iri("r"));
        let s = o.object_property(iri("s"));
        let t = o.object_property(iri("t"));
        let a = o.named_individual(iri("a"));
        let b = o.named_individual(iri("b"));
        let c = o.named_individual(iri("c"));
        o.insert(SubObjectPropertyOf {
            sub: SubObjectPropertyExpression::ObjectPropertyChain(vec![r.clone(), s.clone()]),
            sup: t,
        });
        o.insert(ObjectPropertyAssertion {
            ope: r,
            from: a.clone(),
            to: b.clone(),
        });
        o.insert(ObjectPropertyAssertion {
            ope: s,
            from: b,
            to: c,
        });

        let abox = saturate_ontology(&o);
        assert!(has_property(&abox, &iri("t"), &iri("a"), &iri("c")));
        assert!(has_property(&abox, &iri("r"), &iri("a"), &iri("b")));
        assert!(has_property(&abox, &iri("s"), &iri("b"), &iri("c")));
    }

    #[test]
    fn chain_conclusion_respects_role_subsumption() {
        // r ∘ s ⊑ q and q ⊑ q2: the composed pair lands on q2 as well
        let mut o = Ontology::new();
        let r = o.object_property(iri("r"));
        let s = o.object_property(iri("s"));
        let q = o.object_property(iri("q"));
        let q2 = o.object_property(iri("q2"));
        let a = o.named_individual(iri("a"));
        let b = o.named_individual(iri("b"));
        let c = o.named_individual(iri("c"));
        o.insert(SubObjectPropertyOf {
            sub: SubObjectPropertyExpression::ObjectPropertyChain(vec![r.clone(), s.clone()]),
            sup: q.clone(),
        });
        o.insert(SubObjectPropertyOf {
            sub: q.into(),
            sup: q2,
        });
        o.insert(ObjectPropertyAssertion {
            ope: r,
            from: a.clone(),
            to: b.clone(),
        });
        o.insert(ObjectPropertyAssertion {
            ope: s,
            from: b,
            to: c,
        });

        let abox = saturate_ontology(&o);
        assert!(has_property(&abox, &iri("q"), &iri("a"), &iri("c")));
        assert!(has_property(&abox, &iri("q2"), &iri("a"), &iri("c")));
    }

    #[test]
    fn long_chain_composes_through_fresh_roles() {
        // p ∘ q ∘ r ∘ s ⊑ t over a four-step path
        let mut o = Ontology::new();
        let props: Vec<ObjectProperty> = ["p", "q", "r", "s"]
            .iter()
            .map(|n| o.object_property(iri(n)))
            .collect();
        let t = o.object_property(iri("t"));
        o.insert(SubObjectPropertyOf {
            sub: SubObjectPropertyExpression::ObjectPropertyChain(props.clone()),
            sup: t,
        });
        let inds: Vec<NamedIndividual> = (0..5)
            .map(|n| o.named_individual(iri(&format!("a{}", n))))
            .collect();
        for (i, p) in props.iter().enumerate() {
            o.insert(ObjectPropertyAssertion {
                ope: p.clone(),
                from: inds[i].clone(),
                to: inds[i + 1].clone(),
            });
        }

        let abox = saturate_ontology(&o);
        assert!(has_property(&abox, &iri("t"), &iri("a0"), &iri("a4")));
        // the auxiliary roles never surface
        for row in &abox.property_assertions {
            assert!(!row.object_property.starts_with("OP_"));
        }
    }

    #[test]
    fn saturation_is_idempotent() {
        let mut o = Ontology::new();
        let r = o.object_property(iri("r"));
        let s = o.object_property(iri("s"));
        let t = o.object_property(iri("t"));
        let student = o.class(iri("Student"));
        let person = o.class(iri("Person"));
        let a = o.named_individual(iri("a"));
        let b = o.named_individual(iri("b"));
        let c = o.named_individual(iri("c"));
        o.insert(SubClassOf {
            sub: student.clone().into(),
            sup: person.into(),
        });
        o.insert(SubObjectPropertyOf {
            sub: SubObjectPropertyExpression::ObjectPropertyChain(vec![r.clone(), s.clone()]),
            sup: t,
        });
        o.insert(ClassAssertion {
            ce: student.into(),
            i: a.clone(),
        });
        o.insert(ObjectPropertyAssertion {
            ope: r,
            from: a,
            to: b.clone(),
        });
        o.insert(ObjectPropertyAssertion {
            ope: s,
            from: b,
            to: c,
        });

        let first = saturate_ontology(&o);

        // feed the saturated tables back in as the ABox
        let mut o2 = o.clone_entities();
        for ax in o.axioms() {
            match ax.kind() {
                crate::model::AxiomKind::ClassAssertion
                | crate::model::AxiomKind::ObjectPropertyAssertion => {}
                _ => o2.insert(ax.clone()),
            }
        }
        for row in &first.class_assertions {
            let ce = o2.class(&row.class_name[..]);
            let i = o2.named_individual(&row.individual[..]);
            o2.insert(ClassAssertion { ce: ce.into(), i });
        }
        for row in &first.property_assertions {
            let ope = o2.object_property(&row.object_property[..]);
            let from = o2.named_individual(&row.left_individual[..]);
            let to = o2.named_individual(&row.right_individual[..]);
            o2.insert(ObjectPropertyAssertion { ope, from, to });
        }

        let second = saturate_ontology(&o2);

        let mut first_classes = first.class_assertions.clone();
        let mut second_classes = second.class_assertions.clone();
        first_classes.sort();
        second_classes.sort();
        assert_eq!(first_classes, second_classes);

        let mut first_props = first.property_assertions.clone();
        let mut second_props = second.property_assertions.clone();
        first_props.sort();
        second_props.sort();
        assert_eq!(first_props, second_props);
    }
}
