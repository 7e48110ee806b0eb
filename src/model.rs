//! The data model: IRIs, entities, expressions, axioms and the
//! `Ontology` that holds them.
//!
//! # Overview
//!
//! Entities are interned: an `Ontology` hands out at most one `IRI`
//! value per string, through a shared [`Build`], so that equality and
//! hashing collapse to cheap comparisons on the shared allocation.
//! Axioms are plain data; an `Ontology` is the ordered collection of
//! axioms plus the per-kind entity sets and the prefix declarations.
use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::error::AntleredError;
use crate::vocab::{WithIRI, OWL};

/// An interned IRI.
///
/// Cheap to clone; two `IRI`s interned through the same [`Build`] for
/// the same string share one allocation.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IRI(Rc<str>);

impl Deref for IRI {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for IRI {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for IRI {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<IRI> for String {
    fn from(i: IRI) -> String {
        i.0.to_string()
    }
}

impl fmt::Display for IRI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Factory and interning cache for `IRI`s.
///
/// Cloning a `Build` shares the cache, so a derived ontology can
/// intern into the same pool as its source.
#[derive(Clone, Debug, Default)]
pub struct Build(Rc<RefCell<HashSet<IRI>>>);

impl Build {
    pub fn new() -> Build {
        Build::default()
    }

    /// Constructs or fetches an interned `IRI`.
    pub fn iri<S: AsRef<str>>(&self, s: S) -> IRI {
        let mut cache = self.0.borrow_mut();
        if let Some(iri) = cache.get(s.as_ref()) {
            return iri.clone();
        }
        let iri = IRI(Rc::from(s.as_ref()));
        cache.insert(iri.clone());
        iri
    }

    pub fn class<S: AsRef<str>>(&self, s: S) -> Class {
        Class(self.iri(s))
    }

    pub fn object_property<S: AsRef<str>>(&self, s: S) -> ObjectProperty {
        ObjectProperty(self.iri(s))
    }

    pub fn named_individual<S: AsRef<str>>(&self, s: S) -> NamedIndividual {
        NamedIndividual(self.iri(s))
    }
}

macro_rules! named_entity {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(pub IRI);

        impl $name {
            pub fn iri(&self) -> &IRI {
                &self.0
            }
        }

        impl From<$name> for NamedEntity {
            fn from(n: $name) -> NamedEntity {
                NamedEntity::$name(n)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

named_entity! {
    /// An OWL class
    Class
}

named_entity! {
    /// An OWL object property
    ObjectProperty
}

named_entity! {
    /// An OWL named individual
    NamedIndividual
}

/// The kinds of entity the model distinguishes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntityKind {
    Class,
    ObjectProperty,
    NamedIndividual,
}

impl EntityKind {
    /// The IRI prefix used when minting fresh entities of this kind.
    pub fn auto_prefix(self) -> &'static str {
        match self {
            EntityKind::Class => "C_",
            EntityKind::ObjectProperty => "OP_",
            EntityKind::NamedIndividual => "I_",
        }
    }
}

/// Any of the three entity kinds, tagged.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NamedEntity {
    Class(Class),
    ObjectProperty(ObjectProperty),
    NamedIndividual(NamedIndividual),
}

impl NamedEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            NamedEntity::Class(_) => EntityKind::Class,
            NamedEntity::ObjectProperty(_) => EntityKind::ObjectProperty,
            NamedEntity::NamedIndividual(_) => EntityKind::NamedIndividual,
        }
    }

    pub fn iri(&self) -> &IRI {
        match self {
            NamedEntity::Class(c) => c.iri(),
            NamedEntity::ObjectProperty(p) => p.iri(),
            NamedEntity::NamedIndividual(i) => i.iri(),
        }
    }
}

/// A class expression in the EL fragment: atomic classes,
/// intersections and existential restrictions.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ClassExpression {
    Class(Class),
    ObjectIntersectionOf(Vec<ClassExpression>),
    ObjectSomeValuesFrom {
        ope: ObjectProperty,
        bce: Box<ClassExpression>,
    },
}

impl ClassExpression {
    pub fn is_atomic(&self) -> bool {
        matches!(self, ClassExpression::Class(_))
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            ClassExpression::Class(c) => Some(c),
            _ => None,
        }
    }

    fn signature_into(&self, sig: &mut Vec<NamedEntity>) {
        match self {
            ClassExpression::Class(c) => sig.push(c.clone().into()),
            ClassExpression::ObjectIntersectionOf(ces) => {
                for ce in ces {
                    ce.signature_into(sig);
                }
            }
            ClassExpression::ObjectSomeValuesFrom { ope, bce } => {
                sig.push(ope.clone().into());
                bce.signature_into(sig);
            }
        }
    }
}

impl From<Class> for ClassExpression {
    fn from(c: Class) -> ClassExpression {
        ClassExpression::Class(c)
    }
}

/// The left-hand side of a `SubObjectPropertyOf` axiom: a property or
/// a property chain.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SubObjectPropertyExpression {
    ObjectPropertyExpression(ObjectProperty),
    ObjectPropertyChain(Vec<ObjectProperty>),
}

impl From<ObjectProperty> for SubObjectPropertyExpression {
    fn from(op: ObjectProperty) -> SubObjectPropertyExpression {
        SubObjectPropertyExpression::ObjectPropertyExpression(op)
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SubClassOf {
    pub sub: ClassExpression,
    pub sup: ClassExpression,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EquivalentClasses(pub Vec<ClassExpression>);

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SubObjectPropertyOf {
    pub sub: SubObjectPropertyExpression,
    pub sup: ObjectProperty,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EquivalentObjectProperties(pub Vec<ObjectProperty>);

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ClassAssertion {
    pub ce: ClassExpression,
    pub i: NamedIndividual,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ObjectPropertyAssertion {
    pub ope: ObjectProperty,
    pub from: NamedIndividual,
    pub to: NamedIndividual,
}

/// An axiom or assertion of the ontology.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Axiom {
    SubClassOf(SubClassOf),
    EquivalentClasses(EquivalentClasses),
    SubObjectPropertyOf(SubObjectPropertyOf),
    EquivalentObjectProperties(EquivalentObjectProperties),
    ClassAssertion(ClassAssertion),
    ObjectPropertyAssertion(ObjectPropertyAssertion),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AxiomKind {
    SubClassOf,
    EquivalentClasses,
    SubObjectPropertyOf,
    EquivalentObjectProperties,
    ClassAssertion,
    ObjectPropertyAssertion,
}

macro_rules! axiom_from {
    ($name:ident) => {
        impl From<$name> for Axiom {
            fn from(ax: $name) -> Axiom {
                Axiom::$name(ax)
            }
        }
    };
}

axiom_from! {SubClassOf}
axiom_from! {EquivalentClasses}
axiom_from! {SubObjectPropertyOf}
axiom_from! {EquivalentObjectProperties}
axiom_from! {ClassAssertion}
axiom_from! {ObjectPropertyAssertion}

impl Axiom {
    pub fn kind(&self) -> AxiomKind {
        match self {
            Axiom::SubClassOf(_) => AxiomKind::SubClassOf,
            Axiom::EquivalentClasses(_) => AxiomKind::EquivalentClasses,
            Axiom::SubObjectPropertyOf(_) => AxiomKind::SubObjectPropertyOf,
            Axiom::EquivalentObjectProperties(_) => AxiomKind::EquivalentObjectProperties,
            Axiom::ClassAssertion(_) => AxiomKind::ClassAssertion,
            Axiom::ObjectPropertyAssertion(_) => AxiomKind::ObjectPropertyAssertion,
        }
    }

    /// All named entities this axiom mentions, in mention order.
    pub fn signature(&self) -> Vec<NamedEntity> {
        let mut sig = vec![];
        match self {
            Axiom::SubClassOf(sc) => {
                sc.sub.signature_into(&mut sig);
                sc.sup.signature_into(&mut sig);
            }
            Axiom::EquivalentClasses(eq) => {
                for ce in &eq.0 {
                    ce.signature_into(&mut sig);
                }
            }
            Axiom::SubObjectPropertyOf(sop) => {
                match &sop.sub {
                    SubObjectPropertyExpression::ObjectPropertyExpression(op) => {
                        sig.push(op.clone().into())
                    }
                    SubObjectPropertyExpression::ObjectPropertyChain(ops) => {
                        sig.extend(ops.iter().map(|op| op.clone().into()))
                    }
                }
                sig.push(sop.sup.clone().into());
            }
            Axiom::EquivalentObjectProperties(eq) => {
                sig.extend(eq.0.iter().map(|op| op.clone().into()));
            }
            Axiom::ClassAssertion(ca) => {
                ca.ce.signature_into(&mut sig);
                sig.push(ca.i.clone().into());
            }
            Axiom::ObjectPropertyAssertion(opa) => {
                sig.push(opa.ope.clone().into());
                sig.push(opa.from.clone().into());
                sig.push(opa.to.clone().into());
            }
        }
        sig
    }
}

#[derive(Clone, Debug, Default)]
pub struct OntologyID {
    pub iri: Option<IRI>,
}

#[derive(Clone, Debug, Default)]
struct AutoId {
    class: usize,
    object_property: usize,
    named_individual: usize,
}

/// An ontology: interned entities, ordered axioms and prefix
/// declarations.
#[derive(Clone, Debug)]
pub struct Ontology {
    build: Build,
    pub id: OntologyID,
    classes: IndexSet<Class>,
    object_properties: IndexSet<ObjectProperty>,
    individuals: IndexSet<NamedIndividual>,
    axioms: Vec<Axiom>,
    prefixes: IndexMap<String, String>,
    auto: AutoId,
}

impl Default for Ontology {
    fn default() -> Ontology {
        Ontology::new()
    }
}

impl Ontology {
    pub fn new() -> Ontology {
        Ontology::new_with_build(Build::new())
    }

    /// Create an ontology interning through an existing `Build`.
    ///
    /// `owl:Thing` is declared up front; every ontology contains it.
    pub fn new_with_build(build: Build) -> Ontology {
        let thing = build.class(OWL::Thing.iri_s());
        let mut classes = IndexSet::new();
        classes.insert(thing);
        Ontology {
            build,
            id: OntologyID::default(),
            classes,
            object_properties: IndexSet::new(),
            individuals: IndexSet::new(),
            axioms: Vec::new(),
            prefixes: IndexMap::new(),
            auto: AutoId::default(),
        }
    }

    /// A new ontology sharing this ontology's interner, entity
    /// declarations and prefixes, with no axioms. The receiver is
    /// untouched.
    pub fn clone_entities(&self) -> Ontology {
        Ontology {
            build: self.build.clone(),
            id: self.id.clone(),
            classes: self.classes.clone(),
            object_properties: self.object_properties.clone(),
            individuals: self.individuals.clone(),
            axioms: Vec::new(),
            prefixes: self.prefixes.clone(),
            auto: self.auto.clone(),
        }
    }

    pub fn build(&self) -> &Build {
        &self.build
    }

    pub fn iri<S: AsRef<str>>(&self, s: S) -> IRI {
        self.build.iri(s)
    }

    /// The `owl:Thing` class.
    pub fn thing(&self) -> Class {
        self.build.class(OWL::Thing.iri_s())
    }

    /// Constructs a new `Class`, declaring it.
    ///
    /// # Examples
    ///
    /// ```
    /// # use antlered_elk::model::*;
    /// let mut o = Ontology::new();
    /// let c = o.class("http://www.example.com/c");
    /// let c2 = o.class("http://www.example.com/c");
    ///
    /// assert_eq!(c, c2);
    /// ```
    pub fn class<S: AsRef<str>>(&mut self, s: S) -> Class {
        let c = self.build.class(s);
        self.classes.insert(c.clone());
        c
    }

    pub fn object_property<S: AsRef<str>>(&mut self, s: S) -> ObjectProperty {
        let op = self.build.object_property(s);
        self.object_properties.insert(op.clone());
        op
    }

    pub fn named_individual<S: AsRef<str>>(&mut self, s: S) -> NamedIndividual {
        let i = self.build.named_individual(s);
        self.individuals.insert(i.clone());
        i
    }

    /// Declare an entity. Idempotent; returns true if it was new.
    pub fn declare(&mut self, ne: NamedEntity) -> bool {
        match ne {
            NamedEntity::Class(c) => self.classes.insert(c),
            NamedEntity::ObjectProperty(p) => self.object_properties.insert(p),
            NamedEntity::NamedIndividual(i) => self.individuals.insert(i),
        }
    }

    /// Intern and declare an entity of the given kind, returning the
    /// existing entity where one is already declared.
    pub fn entity(&mut self, kind: EntityKind, iri: IRI) -> NamedEntity {
        let ne: NamedEntity = match kind {
            EntityKind::Class => Class(iri).into(),
            EntityKind::ObjectProperty => ObjectProperty(iri).into(),
            EntityKind::NamedIndividual => NamedIndividual(iri).into(),
        };
        self.declare(ne.clone());
        ne
    }

    /// Mint a fresh entity of the given kind.
    ///
    /// The IRI is the kind's prefix followed by the smallest positive
    /// number not yet used for this kind.
    pub fn mint(&mut self, kind: EntityKind) -> NamedEntity {
        let mut n = match kind {
            EntityKind::Class => self.auto.class,
            EntityKind::ObjectProperty => self.auto.object_property,
            EntityKind::NamedIndividual => self.auto.named_individual,
        };
        let iri = loop {
            n += 1;
            let candidate = format!("{}{}", kind.auto_prefix(), n);
            let iri = self.build.iri(&candidate);
            let taken = match kind {
                EntityKind::Class => self.classes.contains(&Class(iri.clone())),
                EntityKind::ObjectProperty => {
                    self.object_properties.contains(&ObjectProperty(iri.clone()))
                }
                EntityKind::NamedIndividual => {
                    self.individuals.contains(&NamedIndividual(iri.clone()))
                }
            };
            if !taken {
                break iri;
            }
        };
        match kind {
            EntityKind::Class => self.auto.class = n,
            EntityKind::ObjectProperty => self.auto.object_property = n,
            EntityKind::NamedIndividual => self.auto.named_individual = n,
        }
        self.entity(kind, iri)
    }

    pub fn mint_class(&mut self) -> Class {
        match self.mint(EntityKind::Class) {
            NamedEntity::Class(c) => c,
            _ => unreachable!(),
        }
    }

    pub fn mint_object_property(&mut self) -> ObjectProperty {
        match self.mint(EntityKind::ObjectProperty) {
            NamedEntity::ObjectProperty(p) => p,
            _ => unreachable!(),
        }
    }

    /// Insert an axiom, declaring every entity it mentions.
    ///
    /// # Examples
    ///
    /// ```
    /// # use antlered_elk::model::*;
    /// let mut o = Ontology::new();
    /// let sub = o.class("http://www.example.com/sub");
    /// let sup = o.class("http://www.example.com/sup");
    ///
    /// o.insert(SubClassOf {
    ///     sub: sub.into(),
    ///     sup: sup.into(),
    /// });
    /// assert_eq!(o.tbox_size(), 1);
    /// ```
    pub fn insert<A: Into<Axiom>>(&mut self, ax: A) {
        let ax = ax.into();
        for ne in ax.signature() {
            self.declare(ne);
        }
        self.axioms.push(ax);
    }

    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.iter()
    }

    pub fn object_properties(&self) -> impl Iterator<Item = &ObjectProperty> {
        self.object_properties.iter()
    }

    pub fn individuals(&self) -> impl Iterator<Item = &NamedIndividual> {
        self.individuals.iter()
    }

    pub fn entities_of(&self, kind: EntityKind) -> Box<dyn Iterator<Item = NamedEntity> + '_> {
        match kind {
            EntityKind::Class => Box::new(self.classes.iter().map(|c| c.clone().into())),
            EntityKind::ObjectProperty => Box::new(
                self.object_properties
                    .iter()
                    .map(|p| p.clone().into()),
            ),
            EntityKind::NamedIndividual => {
                Box::new(self.individuals.iter().map(|i| i.clone().into()))
            }
        }
    }

    pub fn is_class(&self, c: &Class) -> bool {
        self.classes.contains(c)
    }

    pub fn is_object_property(&self, p: &ObjectProperty) -> bool {
        self.object_properties.contains(p)
    }

    pub fn is_individual(&self, i: &NamedIndividual) -> bool {
        self.individuals.contains(i)
    }

    /// Declare a prefix. Redeclaring a name with a different IRI is a
    /// `PrefixConflict`.
    pub fn add_prefix(&mut self, name: &str, iri: &str) -> Result<(), AntleredError> {
        match self.prefixes.get(name) {
            Some(bound) if bound != iri => Err(AntleredError::PrefixConflict {
                name: name.to_string(),
                bound: bound.clone(),
                requested: iri.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.prefixes.insert(name.to_string(), iri.to_string());
                Ok(())
            }
        }
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(k, v)| (&k[..], &v[..]))
    }

    /// Count of class-level axioms.
    pub fn tbox_size(&self) -> usize {
        self.axioms
            .iter()
            .filter(|ax| {
                matches!(
                    ax.kind(),
                    AxiomKind::SubClassOf | AxiomKind::EquivalentClasses
                )
            })
            .count()
    }

    /// Count of assertions about individuals.
    pub fn abox_size(&self) -> usize {
        self.axioms
            .iter()
            .filter(|ax| {
                matches!(
                    ax.kind(),
                    AxiomKind::ClassAssertion | AxiomKind::ObjectPropertyAssertion
                )
            })
            .count()
    }

    /// Count of object-property axioms.
    pub fn rbox_size(&self) -> usize {
        self.axioms
            .iter()
            .filter(|ax| {
                matches!(
                    ax.kind(),
                    AxiomKind::SubObjectPropertyOf | AxiomKind::EquivalentObjectProperties
                )
            })
            .count()
    }
}
