//! The class-subsumption completion engine, and the `Reasoner` that
//! drives the full pipeline.
//!
//! # Overview
//!
//! Classification runs completion rules over a labeled graph. Nodes
//! are the classes of the normalized ontology; a node's labels are
//! its derived subsumers, and an edge `(A, B)` labeled `p` records
//! the derivation `A ⊑ ∃p.B`. Each node owns a FIFO of instructions;
//! the engine drains the queues, growing labels and edges
//! monotonically until nothing is left to do. Both sets are bounded,
//! so the loop terminates at the deductive closure.
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::debug;

use crate::error::AntleredError;
use crate::hierarchy::RoleHierarchy;
use crate::model::{Class, ObjectProperty, Ontology};
use crate::normalize::{normalize, NormalAxiom, NormalizedOntology};
use crate::query::{evaluate, Query, Row};
use crate::saturate::{saturate, SaturatedABox};
use crate::store::{PairStore, TripletStore};

/// One unit of work on a node's queue.
#[derive(Clone, Debug)]
enum Instruction {
    /// Add `label` to the node's subsumers, provided the node already
    /// carries every label in `requires`.
    Label { label: Class, requires: Vec<Class> },
    /// Ensure the edge from the node to `to` labeled `role` exists.
    Edge { to: Class, role: ObjectProperty },
}

/// The fixpoint of the completion rules.
#[derive(Clone, Debug)]
pub struct Classification {
    subsumers: PairStore<Class>,
    edges: TripletStore<Class, ObjectProperty, Class>,
}

impl Classification {
    /// Derived class subsumption: `(A, B)` means `A ⊑ B`.
    pub fn subsumers(&self) -> &PairStore<Class> {
        &self.subsumers
    }

    /// Derived existential edges as `(from, role, to)` triples.
    pub fn edges(&self) -> &TripletStore<Class, ObjectProperty, Class> {
        &self.edges
    }
}

/// Run the completion rules to fixpoint.
pub fn classify(norm: &NormalizedOntology, roles: &RoleHierarchy) -> Classification {
    Engine::new(norm, roles).run()
}

struct Engine<'a> {
    roles: &'a RoleHierarchy,
    thing: Class,
    nodes: Vec<Class>,
    // axiom indexes: conjunction axioms by conjunct, right-hand
    // existentials by subject, left-hand existentials by (role,
    // filler)
    conjunctions: IndexMap<Class, Vec<(Vec<Class>, Class)>>,
    existential_sups: IndexMap<Class, Vec<(ObjectProperty, Class)>>,
    existential_subs: IndexMap<(ObjectProperty, Class), Vec<Class>>,
    subsumers: PairStore<Class>,
    edges_out: TripletStore<Class, ObjectProperty, Class>,
    edges_in: TripletStore<Class, ObjectProperty, Class>,
    queues: IndexMap<Class, VecDeque<Instruction>>,
}

impl<'a> Engine<'a> {
    fn new(norm: &NormalizedOntology, roles: &'a RoleHierarchy) -> Engine<'a> {
        let nodes: Vec<Class> = norm.classes().cloned().collect();

        let mut conjunctions: IndexMap<Class, Vec<(Vec<Class>, Class)>> = IndexMap::new();
        let mut existential_sups: IndexMap<Class, Vec<(ObjectProperty, Class)>> = IndexMap::new();
        let mut existential_subs: IndexMap<(ObjectProperty, Class), Vec<Class>> = IndexMap::new();

        for ax in norm.axioms() {
            match ax {
                NormalAxiom::Atomic { sub, sup } => {
                    conjunctions
                        .entry(sub.clone())
                        .or_insert_with(Vec::new)
                        .push((vec![], sup.clone()));
                }
                NormalAxiom::Conjunction { subs, sup } => {
                    for (i, conjunct) in subs.iter().enumerate() {
                        let others: Vec<Class> = subs
                            .iter()
                            .enumerate()
                            .filter(|(j, _)| *j != i)
                            .map(|(_, o)| o.clone())
                            .collect();
                        conjunctions
                            .entry(conjunct.clone())
                            .or_insert_with(Vec::new)
                            .push((others, sup.clone()));
                    }
                }
                NormalAxiom::ExistentialSup { sub, role, filler } => {
                    existential_sups
                        .entry(sub.clone())
                        .or_insert_with(Vec::new)
                        .push((role.clone(), filler.clone()));
                }
                NormalAxiom::ExistentialSub { role, filler, sup } => {
                    existential_subs
                        .entry((role.clone(), filler.clone()))
                        .or_insert_with(Vec::new)
                        .push(sup.clone());
                }
                _ => {}
            }
        }

        let mut queues = IndexMap::new();
        for c in &nodes {
            queues.insert(c.clone(), VecDeque::new());
        }

        Engine {
            roles,
            thing: norm.thing(),
            nodes,
            conjunctions,
            existential_sups,
            existential_subs,
            subsumers: PairStore::new(),
            edges_out: TripletStore::new(),
            edges_in: TripletStore::new(),
            queues,
        }
    }

    fn run(mut self) -> Classification {
        // every node subsumes itself and sits below owl:Thing
        let nodes = self.nodes.clone();
        for a in &nodes {
            self.subsumers.add(a.clone(), a.clone());
            self.subsumers.add(a.clone(), self.thing.clone());
        }
        let thing = self.thing.clone();
        for a in &nodes {
            self.seed_label(a, a);
            self.seed_label(a, &thing);
        }

        // drain the queues in node order until a full sweep is quiet
        loop {
            let mut progressed = false;
            for node in &nodes {
                loop {
                    let inst = match self.queues.get_mut(node) {
                        Some(q) => q.pop_front(),
                        None => None,
                    };
                    match inst {
                        Some(inst) => {
                            progressed = true;
                            let node = node.clone();
                            self.apply(&node, inst);
                        }
                        None => break,
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        debug!(
            "classification fixpoint: {} subsumer pairs, {} edges",
            self.subsumers.len(),
            self.edges_out.len()
        );

        Classification {
            subsumers: self.subsumers,
            edges: self.edges_out,
        }
    }

    fn apply(&mut self, node: &Class, inst: Instruction) {
        match inst {
            Instruction::Label { label, requires } => {
                if self.subsumers.contains(node, &label) {
                    return;
                }
                // unmet requirements drop the instruction; the label
                // that completes them re-seeds an equivalent one
                if !self.subsumers.contains_all(node, requires.iter()) {
                    return;
                }
                self.add_label(node, label);
            }
            Instruction::Edge { to, role } => self.label_edge(node, &to, &role),
        }
    }

    fn enqueue(&mut self, node: &Class, inst: Instruction) {
        self.queues
            .entry(node.clone())
            .or_insert_with(VecDeque::new)
            .push_back(inst);
    }

    /// Queue the axiom-driven consequences of `label` newly holding
    /// at `node`.
    fn seed_label(&mut self, node: &Class, label: &Class) {
        if let Some(axs) = self.conjunctions.get(label) {
            let axs = axs.clone();
            for (requires, sup) in axs {
                self.enqueue(
                    node,
                    Instruction::Label {
                        label: sup,
                        requires,
                    },
                );
            }
        }
        if let Some(axs) = self.existential_sups.get(label) {
            let axs = axs.clone();
            for (role, filler) in axs {
                self.enqueue(node, Instruction::Edge { to: filler, role });
            }
        }
    }

    /// Queue the `∃role.filler ⊑ D` consequences at `node`.
    fn seed_existential(&mut self, role: &ObjectProperty, filler: &Class, node: &Class) {
        if let Some(sups) = self.existential_subs.get(&(role.clone(), filler.clone())) {
            let sups = sups.clone();
            for sup in sups {
                self.enqueue(
                    node,
                    Instruction::Label {
                        label: sup,
                        requires: vec![],
                    },
                );
            }
        }
    }

    fn add_label(&mut self, node: &Class, label: Class) {
        self.subsumers.add(node.clone(), label.clone());
        self.seed_label(node, &label);
        // the new label reaches every node with an edge into this one
        let incoming: Vec<(ObjectProperty, Class)> = self
            .edges_in
            .triples_with_first(node)
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect();
        for (p, c) in incoming {
            self.seed_existential(&p, &label, &c);
        }
    }

    /// Add an edge and everything it entails.
    ///
    /// Chain interactions cascade, so the work sits on an explicit
    /// stack; each edge is expanded at most once.
    fn label_edge(&mut self, from: &Class, to: &Class, role: &ObjectProperty) {
        let mut stack = vec![(from.clone(), to.clone(), role.clone())];
        while let Some((a, b, p)) = stack.pop() {
            if self.edges_out.contains(&a, &p, &b) {
                continue;
            }
            let supers: Vec<ObjectProperty> = self.roles.supers(&p).cloned().collect();
            for q in supers {
                if !self.add_edge(&a, &q, &b) {
                    continue;
                }
                // everything b is, a now has a q-successor of
                let b_labels: Vec<Class> =
                    self.subsumers.pairs_with_first(&b).cloned().collect();
                for c in b_labels {
                    self.seed_existential(&q, &c, &a);
                }
                // chains with q on the right: r ∘ q ⊑ s
                let right: Vec<(ObjectProperty, ObjectProperty)> = self
                    .roles
                    .chains_with_right(&q)
                    .map(|(r, s)| (r.clone(), s.clone()))
                    .collect();
                for (r, s) in right {
                    let froms: Vec<Class> = self
                        .edges_in
                        .triples_with_first_two(&a, &r)
                        .cloned()
                        .collect();
                    for c in froms {
                        if !self.edges_out.contains(&c, &s, &b) {
                            stack.push((c, b.clone(), s.clone()));
                        }
                    }
                }
                // chains with q on the left: q ∘ r ⊑ s
                let left: Vec<(ObjectProperty, ObjectProperty)> = self
                    .roles
                    .chains_with_left(&q)
                    .map(|(r, s)| (r.clone(), s.clone()))
                    .collect();
                for (r, s) in left {
                    let tos: Vec<Class> = self
                        .edges_out
                        .triples_with_first_two(&b, &r)
                        .cloned()
                        .collect();
                    for c in tos {
                        if !self.edges_out.contains(&a, &s, &c) {
                            stack.push((a.clone(), c, s.clone()));
                        }
                    }
                }
            }
        }
    }

    fn add_edge(&mut self, a: &Class, q: &ObjectProperty, b: &Class) -> bool {
        if self.edges_out.add(a.clone(), q.clone(), b.clone()) {
            self.edges_in.add(b.clone(), q.clone(), a.clone());
            true
        } else {
            false
        }
    }
}

/// Wall-clock cost of each construction phase.
#[derive(Clone, Debug, Default)]
pub struct Timings {
    pub normalize: Duration,
    pub role_hierarchy: Duration,
    pub classify: Duration,
    pub saturate: Duration,
}

/// A reasoner over a single ontology.
///
/// Construction runs the whole pipeline on the calling thread:
/// normalization, role-hierarchy closure, classification, ABox
/// saturation. The results are immutable afterwards; the query
/// methods are read-only and may be called repeatedly.
#[derive(Clone, Debug)]
pub struct Reasoner {
    ontology: Ontology,
    normalized: NormalizedOntology,
    roles: RoleHierarchy,
    classification: Classification,
    abox: SaturatedABox,
    timings: Timings,
}

impl Reasoner {
    pub fn new(ontology: Ontology) -> Result<Reasoner, AntleredError> {
        let start = Instant::now();
        let normalized = normalize(&ontology)?;
        let t_normalize = start.elapsed();

        let start = Instant::now();
        let roles = RoleHierarchy::build(&normalized);
        let t_roles = start.elapsed();

        let start = Instant::now();
        let classification = classify(&normalized, &roles);
        let t_classify = start.elapsed();

        let start = Instant::now();
        let abox = saturate(&ontology, &normalized, &roles, &classification);
        let t_saturate = start.elapsed();

        debug!(
            "reasoner ready: {} subsumer pairs, {} saturated assertions",
            classification.subsumers().len(),
            abox.len()
        );

        Ok(Reasoner {
            ontology,
            normalized,
            roles,
            classification,
            abox,
            timings: Timings {
                normalize: t_normalize,
                role_hierarchy: t_roles,
                classify: t_classify,
                saturate: t_saturate,
            },
        })
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn normalized(&self) -> &NormalizedOntology {
        &self.normalized
    }

    /// Derived class subsumption over the normalized ontology,
    /// auxiliaries included.
    pub fn class_subsumers(&self) -> &PairStore<Class> {
        self.classification.subsumers()
    }

    pub fn object_property_subsumers(&self) -> &PairStore<ObjectProperty> {
        self.roles.subsumers()
    }

    pub fn saturated_abox(&self) -> &SaturatedABox {
        &self.abox
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// True when `sub` is entailed to be a subclass of `sup`.
    ///
    /// Both IRIs must name classes of the source ontology.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> Result<bool, AntleredError> {
        let sub = self.lookup_class(sub)?;
        let sup = self.lookup_class(sup)?;
        Ok(self.classification.subsumers().contains(&sub, &sup))
    }

    /// True when `sub` is entailed to be a subproperty of `sup`.
    pub fn is_subproperty(&self, sub: &str, sup: &str) -> Result<bool, AntleredError> {
        let sub = self.lookup_property(sub)?;
        let sup = self.lookup_property(sup)?;
        Ok(self.roles.is_subproperty(&sub, &sup))
    }

    /// Answer a basic-graph-pattern query over the saturated ABox.
    pub fn answer(&self, query: &Query) -> Result<Vec<Row>, AntleredError> {
        evaluate(query, &self.abox)
    }

    /// Entailed subsumptions between distinct classes of the source
    /// ontology, auxiliaries filtered out.
    pub fn named_subsumptions(&self) -> Vec<(Class, Class)> {
        self.classification
            .subsumers()
            .iter()
            .filter(|(sub, sup)| {
                sub != sup && self.ontology.is_class(sub) && self.ontology.is_class(sup)
            })
            .map(|(sub, sup)| (sub.clone(), sup.clone()))
            .collect()
    }

    fn lookup_class(&self, iri: &str) -> Result<Class, AntleredError> {
        let c = self.ontology.build().class(iri);
        if self.ontology.is_class(&c) {
            Ok(c)
        } else {
            Err(AntleredError::UnknownClass(iri.to_string()))
        }
    }

    fn lookup_property(&self, iri: &str) -> Result<ObjectProperty, AntleredError> {
        let p = self.ontology.build().object_property(iri);
        if self.ontology.is_object_property(&p) {
            Ok(p)
        } else {
            Err(AntleredError::UnknownProperty(iri.to_string()))
        }
    }
}
