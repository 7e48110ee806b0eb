//! Rewrites an ontology into the small set of normal forms the
//! completion engine consumes.
//!
//! # Overview
//!
//! EL axioms can nest arbitrarily. The reasoner only handles flat
//! shapes: atomic inclusions, atomic conjunctions, existentials with
//! atomic fillers, role inclusions, length-two role chains and atomic
//! assertions. This module rewrites every statement into those shapes
//! by a queue-driven fixpoint, minting fresh auxiliary entities where
//! a complex subexpression has to be named. The source ontology is
//! never mutated; the normalized ontology shares its interner and
//! entity declarations.
use std::collections::VecDeque;

use log::debug;

use crate::error::{invalid, AntleredError};
use crate::model::{
    Axiom, Class, ClassExpression, NamedIndividual, ObjectProperty, Ontology, SubClassOf,
    SubObjectPropertyExpression, SubObjectPropertyOf,
};

/// An axiom in normal form.
///
/// Every statement of a normalized ontology is one of these shapes;
/// the completion engine matches on them exhaustively.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NormalAxiom {
    /// `A ⊑ B`
    Atomic { sub: Class, sup: Class },
    /// `A₁ ⊓ … ⊓ Aₙ ⊑ B`, all atomic
    Conjunction { subs: Vec<Class>, sup: Class },
    /// `A ⊑ ∃r.B`
    ExistentialSup {
        sub: Class,
        role: ObjectProperty,
        filler: Class,
    },
    /// `∃r.A ⊑ B`
    ExistentialSub {
        role: ObjectProperty,
        filler: Class,
        sup: Class,
    },
    /// `r ⊑ s`
    RoleInclusion {
        sub: ObjectProperty,
        sup: ObjectProperty,
    },
    /// `r ∘ s ⊑ q`
    RoleChain {
        first: ObjectProperty,
        second: ObjectProperty,
        sup: ObjectProperty,
    },
    /// `A(a)`, A atomic
    ClassAssertion {
        class: Class,
        individual: NamedIndividual,
    },
    /// `r(a, b)`
    PropertyAssertion {
        role: ObjectProperty,
        from: NamedIndividual,
        to: NamedIndividual,
    },
}

/// The output of normalization: the flattened axioms plus an ontology
/// holding every entity they mention, auxiliaries included.
#[derive(Clone, Debug)]
pub struct NormalizedOntology {
    ontology: Ontology,
    axioms: Vec<NormalAxiom>,
}

impl NormalizedOntology {
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn axioms(&self) -> &[NormalAxiom] {
        &self.axioms
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.ontology.classes()
    }

    pub fn object_properties(&self) -> impl Iterator<Item = &ObjectProperty> {
        self.ontology.object_properties()
    }

    pub fn individuals(&self) -> impl Iterator<Item = &NamedIndividual> {
        self.ontology.individuals()
    }

    pub fn thing(&self) -> Class {
        self.ontology.thing()
    }
}

/// Normalize an ontology.
///
/// Statements are drawn from a work queue; a statement either matches
/// a rewrite rule, whose outputs go back on the queue, or is already
/// in normal form and is kept. Each rewrite strictly shrinks the
/// nesting of its statement, so the queue drains.
pub fn normalize(o: &Ontology) -> Result<NormalizedOntology, AntleredError> {
    let mut norm = o.clone_entities();
    let mut queue: VecDeque<Axiom> = o.axioms().iter().cloned().collect();
    let mut axioms = Vec::new();

    while let Some(ax) = queue.pop_front() {
        rewrite(ax, &mut norm, &mut queue, &mut axioms)?;
    }

    debug!(
        "normalized {} statements into {} normal-form axioms",
        o.axioms().len(),
        axioms.len()
    );

    Ok(NormalizedOntology {
        ontology: norm,
        axioms,
    })
}

fn rewrite(
    ax: Axiom,
    norm: &mut Ontology,
    queue: &mut VecDeque<Axiom>,
    done: &mut Vec<NormalAxiom>,
) -> Result<(), AntleredError> {
    match ax {
        Axiom::SubObjectPropertyOf(sop) => rewrite_role(sop, norm, queue, done),
        Axiom::EquivalentClasses(eq) => {
            if eq.0.len() < 2 {
                return Err(invalid!(
                    "EquivalentClasses needs at least two operands, got {}",
                    eq.0.len()
                ));
            }
            for (i, sub) in eq.0.iter().enumerate() {
                for (j, sup) in eq.0.iter().enumerate() {
                    if i != j {
                        queue.push_back(
                            SubClassOf {
                                sub: sub.clone(),
                                sup: sup.clone(),
                            }
                            .into(),
                        );
                    }
                }
            }
            Ok(())
        }
        Axiom::EquivalentObjectProperties(eq) => {
            if eq.0.len() < 2 {
                return Err(invalid!(
                    "EquivalentObjectProperties needs at least two operands, got {}",
                    eq.0.len()
                ));
            }
            // roles split into role inclusions only
            for (i, sub) in eq.0.iter().enumerate() {
                for (j, sup) in eq.0.iter().enumerate() {
                    if i != j {
                        queue.push_back(
                            SubObjectPropertyOf {
                                sub: sub.clone().into(),
                                sup: sup.clone(),
                            }
                            .into(),
                        );
                    }
                }
            }
            Ok(())
        }
        Axiom::SubClassOf(sc) => rewrite_inclusion(sc, norm, queue, done),
        Axiom::ClassAssertion(ca) => match ca.ce {
            ClassExpression::Class(class) => {
                done.push(NormalAxiom::ClassAssertion {
                    class,
                    individual: ca.i,
                });
                Ok(())
            }
            ce => {
                // name the complex class, assert the name
                let x = norm.mint_class();
                queue.push_back(
                    SubClassOf {
                        sub: x.clone().into(),
                        sup: ce,
                    }
                    .into(),
                );
                queue.push_back(
                    crate::model::ClassAssertion {
                        ce: x.into(),
                        i: ca.i,
                    }
                    .into(),
                );
                Ok(())
            }
        },
        Axiom::ObjectPropertyAssertion(opa) => {
            done.push(NormalAxiom::PropertyAssertion {
                role: opa.ope,
                from: opa.from,
                to: opa.to,
            });
            Ok(())
        }
    }
}

fn rewrite_role(
    sop: SubObjectPropertyOf,
    norm: &mut Ontology,
    queue: &mut VecDeque<Axiom>,
    done: &mut Vec<NormalAxiom>,
) -> Result<(), AntleredError> {
    match sop.sub {
        SubObjectPropertyExpression::ObjectPropertyExpression(sub) => {
            done.push(NormalAxiom::RoleInclusion { sub, sup: sop.sup });
            Ok(())
        }
        SubObjectPropertyExpression::ObjectPropertyChain(ops) => match ops.len() {
            0 => Err(invalid!("empty property chain")),
            1 => {
                done.push(NormalAxiom::RoleInclusion {
                    sub: ops.into_iter().next().unwrap(),
                    sup: sop.sup,
                });
                Ok(())
            }
            2 => {
                let mut it = ops.into_iter();
                done.push(NormalAxiom::RoleChain {
                    first: it.next().unwrap(),
                    second: it.next().unwrap(),
                    sup: sop.sup,
                });
                Ok(())
            }
            n => {
                // fold a long chain into length-two links through
                // fresh roles
                let fresh: Vec<ObjectProperty> =
                    (0..n - 2).map(|_| norm.mint_object_property()).collect();
                queue.push_back(chain2(ops[0].clone(), ops[1].clone(), fresh[0].clone()));
                for i in 0..n - 3 {
                    queue.push_back(chain2(
                        fresh[i].clone(),
                        ops[i + 2].clone(),
                        fresh[i + 1].clone(),
                    ));
                }
                queue.push_back(chain2(
                    fresh[n - 3].clone(),
                    ops[n - 1].clone(),
                    sop.sup,
                ));
                Ok(())
            }
        },
    }
}

fn chain2(first: ObjectProperty, second: ObjectProperty, sup: ObjectProperty) -> Axiom {
    SubObjectPropertyOf {
        sub: SubObjectPropertyExpression::ObjectPropertyChain(vec![first, second]),
        sup,
    }
    .into()
}

fn rewrite_inclusion(
    sc: SubClassOf,
    norm: &mut Ontology,
    queue: &mut VecDeque<Axiom>,
    done: &mut Vec<NormalAxiom>,
) -> Result<(), AntleredError> {
    let SubClassOf { sub, sup } = sc;

    // conjunction on the right splits
    if let ClassExpression::ObjectIntersectionOf(ref ces) = sup {
        if ces.is_empty() {
            return Err(invalid!("empty intersection"));
        }
        for ce in ces {
            queue.push_back(
                SubClassOf {
                    sub: sub.clone(),
                    sup: ce.clone(),
                }
                .into(),
            );
        }
        return Ok(());
    }

    // both sides complex: split through a fresh name
    if !sub.is_atomic() && !sup.is_atomic() {
        let x: ClassExpression = norm.mint_class().into();
        queue.push_back(
            SubClassOf {
                sub,
                sup: x.clone(),
            }
            .into(),
        );
        queue.push_back(SubClassOf { sub: x, sup }.into());
        return Ok(());
    }

    // conjunction on the left with complex conjuncts: name each one
    if let ClassExpression::ObjectIntersectionOf(ref ces) = sub {
        if ces.is_empty() {
            return Err(invalid!("empty intersection"));
        }
        if ces.len() == 1 {
            queue.push_back(
                SubClassOf {
                    sub: ces[0].clone(),
                    sup,
                }
                .into(),
            );
            return Ok(());
        }
        if ces.iter().any(|ce| !ce.is_atomic()) {
            let mut flattened = Vec::with_capacity(ces.len());
            for ce in ces {
                if ce.is_atomic() {
                    flattened.push(ce.clone());
                } else {
                    let x = norm.mint_class();
                    queue.push_back(
                        SubClassOf {
                            sub: ce.clone(),
                            sup: x.clone().into(),
                        }
                        .into(),
                    );
                    flattened.push(x.into());
                }
            }
            queue.push_back(
                SubClassOf {
                    sub: ClassExpression::ObjectIntersectionOf(flattened),
                    sup,
                }
                .into(),
            );
            return Ok(());
        }
    }

    // complex filler on a left-hand existential
    if let ClassExpression::ObjectSomeValuesFrom { ref ope, ref bce } = sub {
        if !bce.is_atomic() {
            let x = norm.mint_class();
            queue.push_back(
                SubClassOf {
                    sub: (**bce).clone(),
                    sup: x.clone().into(),
                }
                .into(),
            );
            queue.push_back(
                SubClassOf {
                    sub: ClassExpression::ObjectSomeValuesFrom {
                        ope: ope.clone(),
                        bce: Box::new(x.into()),
                    },
                    sup,
                }
                .into(),
            );
            return Ok(());
        }
    }

    // complex filler on a right-hand existential
    if let ClassExpression::ObjectSomeValuesFrom { ref ope, ref bce } = sup {
        if !bce.is_atomic() {
            let x = norm.mint_class();
            queue.push_back(
                SubClassOf {
                    sub: x.clone().into(),
                    sup: (**bce).clone(),
                }
                .into(),
            );
            queue.push_back(
                SubClassOf {
                    sub,
                    sup: ClassExpression::ObjectSomeValuesFrom {
                        ope: ope.clone(),
                        bce: Box::new(x.into()),
                    },
                }
                .into(),
            );
            return Ok(());
        }
    }

    // nothing fired: the statement is in normal form
    match (sub, sup) {
        (ClassExpression::Class(sub), ClassExpression::Class(sup)) => {
            done.push(NormalAxiom::Atomic { sub, sup });
            Ok(())
        }
        (ClassExpression::ObjectIntersectionOf(ces), ClassExpression::Class(sup)) => {
            let mut subs = Vec::with_capacity(ces.len());
            for ce in ces {
                match ce {
                    ClassExpression::Class(c) => subs.push(c),
                    ce => {
                        return Err(invalid!(
                            "non-atomic conjunct survived rewriting: {:?}",
                            ce
                        ))
                    }
                }
            }
            done.push(NormalAxiom::Conjunction { subs, sup });
            Ok(())
        }
        (
            ClassExpression::ObjectSomeValuesFrom { ope, bce },
            ClassExpression::Class(sup),
        ) => match *bce {
            ClassExpression::Class(filler) => {
                done.push(NormalAxiom::ExistentialSub {
                    role: ope,
                    filler,
                    sup,
                });
                Ok(())
            }
            bce => Err(invalid!("non-atomic filler survived rewriting: {:?}", bce)),
        },
        (
            ClassExpression::Class(sub),
            ClassExpression::ObjectSomeValuesFrom { ope, bce },
        ) => match *bce {
            ClassExpression::Class(filler) => {
                done.push(NormalAxiom::ExistentialSup {
                    sub,
                    role: ope,
                    filler,
                });
                Ok(())
            }
            bce => Err(invalid!("non-atomic filler survived rewriting: {:?}", bce)),
        },
        (sub, sup) => Err(invalid!(
            "statement did not normalize: {:?} SubClassOf {:?}",
            sub,
            sup
        )),
    }
}
