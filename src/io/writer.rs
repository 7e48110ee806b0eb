//! A writer for the OWL/XML subset of this model.
use std::io::Write as StdWrite;

use curie::PrefixMapping;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::AntleredError;
use crate::model::{Axiom, ClassExpression, Ontology, SubObjectPropertyExpression};
use crate::vocab::{Namespace, WithIRI};

/// Write an ontology as OWL/XML.
///
/// Declarations come first in sorted order, then the axioms in
/// statement order, so output is deterministic.
pub fn write<W: StdWrite>(write: W, ont: &Ontology) -> Result<(), AntleredError> {
    let writer = Writer::new_with_indent(write, b' ', 4);
    let mut mapping = PrefixMapping::default();
    for (name, iri) in ont.prefixes() {
        if name.is_empty() {
            mapping.set_default(iri);
        } else {
            mapping.add_prefix(name, iri).ok();
        }
    }
    Write {
        writer,
        ont,
        mapping,
    }
    .render()
}

struct Write<'a, W: StdWrite> {
    writer: Writer<W>,
    ont: &'a Ontology,
    mapping: PrefixMapping,
}

impl<'a, W: StdWrite> Write<'a, W> {
    fn render(&mut self) -> Result<(), AntleredError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

        let mut elem = BytesStart::new("Ontology");
        elem.push_attribute(("xmlns", Namespace::OWL.iri_str()));
        if let Some(iri) = &self.ont.id.iri {
            elem.push_attribute(("ontologyIRI", &iri[..]));
        }
        self.writer.write_event(Event::Start(elem))?;

        self.render_prefixes()?;
        self.render_declarations()?;
        self.render_axioms()?;

        self.writer
            .write_event(Event::End(BytesEnd::new("Ontology")))?;
        Ok(())
    }

    fn render_prefixes(&mut self) -> Result<(), AntleredError> {
        let prefixes: Vec<(String, String)> = self
            .ont
            .prefixes()
            .map(|(n, i)| (n.to_string(), i.to_string()))
            .collect();
        for (name, iri) in prefixes {
            let mut elem = BytesStart::new("Prefix");
            elem.push_attribute(("name", &name[..]));
            elem.push_attribute(("IRI", &iri[..]));
            self.writer.write_event(Event::Empty(elem))?;
        }
        Ok(())
    }

    fn render_declarations(&mut self) -> Result<(), AntleredError> {
        let thing = self.ont.thing();

        // sorted for deterministic rendering
        let mut classes: Vec<String> = self
            .ont
            .classes()
            .filter(|c| **c != thing)
            .map(|c| c.0.to_string())
            .collect();
        classes.sort();
        for iri in classes {
            self.declaration("Class", &iri)?;
        }

        let mut properties: Vec<String> = self
            .ont
            .object_properties()
            .map(|p| p.0.to_string())
            .collect();
        properties.sort();
        for iri in properties {
            self.declaration("ObjectProperty", &iri)?;
        }

        let mut individuals: Vec<String> = self
            .ont
            .individuals()
            .map(|i| i.0.to_string())
            .collect();
        individuals.sort();
        for iri in individuals {
            self.declaration("NamedIndividual", &iri)?;
        }

        Ok(())
    }

    fn render_axioms(&mut self) -> Result<(), AntleredError> {
        let axioms: Vec<Axiom> = self.ont.axioms().to_vec();
        for ax in &axioms {
            self.axiom(ax)?;
        }
        Ok(())
    }

    fn declaration(&mut self, kind: &str, iri: &str) -> Result<(), AntleredError> {
        self.writer
            .write_event(Event::Start(BytesStart::new("Declaration")))?;
        self.entity(kind, iri)?;
        self.writer
            .write_event(Event::End(BytesEnd::new("Declaration")))?;
        Ok(())
    }

    fn entity(&mut self, kind: &str, iri: &str) -> Result<(), AntleredError> {
        let mut elem = BytesStart::new(kind);
        match self.mapping.shrink_iri(iri) {
            Ok(curie) => {
                let curie = format!("{}", curie);
                elem.push_attribute(("abbreviatedIRI", &curie[..]));
            }
            Err(_) => {
                elem.push_attribute(("IRI", iri));
            }
        }
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn wrapped<F>(&mut self, tag: &str, inner: F) -> Result<(), AntleredError>
    where
        F: FnOnce(&mut Self) -> Result<(), AntleredError>,
    {
        self.writer
            .write_event(Event::Start(BytesStart::new(tag.to_string())))?;
        inner(self)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(tag.to_string())))?;
        Ok(())
    }

    fn axiom(&mut self, ax: &Axiom) -> Result<(), AntleredError> {
        match ax {
            Axiom::SubClassOf(sc) => self.wrapped("SubClassOf", |w| {
                w.class_expression(&sc.sub)?;
                w.class_expression(&sc.sup)
            }),
            Axiom::EquivalentClasses(eq) => self.wrapped("EquivalentClasses", |w| {
                for ce in &eq.0 {
                    w.class_expression(ce)?;
                }
                Ok(())
            }),
            Axiom::SubObjectPropertyOf(sop) => self.wrapped("SubObjectPropertyOf", |w| {
                match &sop.sub {
                    SubObjectPropertyExpression::ObjectPropertyExpression(op) => {
                        w.entity("ObjectProperty", &op.0[..])?;
                    }
                    SubObjectPropertyExpression::ObjectPropertyChain(ops) => {
                        w.wrapped("ObjectPropertyChain", |w| {
                            for op in ops {
                                w.entity("ObjectProperty", &op.0[..])?;
                            }
                            Ok(())
                        })?;
                    }
                }
                w.entity("ObjectProperty", &sop.sup.0[..])
            }),
            Axiom::EquivalentObjectProperties(eq) => {
                self.wrapped("EquivalentObjectProperties", |w| {
                    for op in &eq.0 {
                        w.entity("ObjectProperty", &op.0[..])?;
                    }
                    Ok(())
                })
            }
            Axiom::ClassAssertion(ca) => self.wrapped("ClassAssertion", |w| {
                w.class_expression(&ca.ce)?;
                w.entity("NamedIndividual", &ca.i.0[..])
            }),
            Axiom::ObjectPropertyAssertion(opa) => {
                self.wrapped("ObjectPropertyAssertion", |w| {
                    w.entity("ObjectProperty", &opa.ope.0[..])?;
                    w.entity("NamedIndividual", &opa.from.0[..])?;
                    w.entity("NamedIndividual", &opa.to.0[..])
                })
            }
        }
    }

    fn class_expression(&mut self, ce: &ClassExpression) -> Result<(), AntleredError> {
        match ce {
            ClassExpression::Class(c) => self.entity("Class", &c.0[..]),
            ClassExpression::ObjectIntersectionOf(ces) => {
                self.wrapped("ObjectIntersectionOf", |w| {
                    for ce in ces {
                        w.class_expression(ce)?;
                    }
                    Ok(())
                })
            }
            ClassExpression::ObjectSomeValuesFrom { ope, bce } => {
                self.wrapped("ObjectSomeValuesFrom", |w| {
                    w.entity("ObjectProperty", &ope.0[..])?;
                    w.class_expression(bce)
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::reader::read;
    use crate::model::{
        ClassAssertion, ClassExpression, EquivalentClasses, ObjectPropertyAssertion, SubClassOf,
        SubObjectPropertyExpression, SubObjectPropertyOf,
    };

    fn family() -> Ontology {
        let mut o = Ontology::new();
        o.id.iri = Some(o.iri("http://example.com/family"));
        o.add_prefix("f", "http://example.com/family#").unwrap();

        let person = o.class("http://example.com/family#Person");
        let child = o.class("http://example.com/family#Child");
        let has_parent = o.object_property("http://example.com/family#hasParent");
        let has_grandparent = o.object_property("http://example.com/family#hasGrandparent");
        let alice = o.named_individual("http://example.com/family#alice");
        let bob = o.named_individual("http://example.com/family#bob");

        o.insert(SubClassOf {
            sub: child.clone().into(),
            sup: person.clone().into(),
        });
        o.insert(SubClassOf {
            sub: person.clone().into(),
            sup: ClassExpression::ObjectSomeValuesFrom {
                ope: has_parent.clone(),
                bce: Box::new(person.clone().into()),
            },
        });
        o.insert(EquivalentClasses(vec![
            child.clone().into(),
            ClassExpression::ObjectIntersectionOf(vec![
                person.clone().into(),
                child.clone().into(),
            ]),
        ]));
        o.insert(SubObjectPropertyOf {
            sub: SubObjectPropertyExpression::ObjectPropertyChain(vec![
                has_parent.clone(),
                has_parent.clone(),
            ]),
            sup: has_grandparent,
        });
        o.insert(ClassAssertion {
            ce: child.into(),
            i: alice.clone(),
        });
        o.insert(ObjectPropertyAssertion {
            ope: has_parent,
            from: alice,
            to: bob,
        });
        o
    }

    fn roundtrip(ont: &Ontology) -> Ontology {
        let mut out = Vec::new();
        write(&mut out, ont).unwrap();
        read(&out[..]).unwrap()
    }

    #[test]
    fn roundtrip_preserves_statements() {
        let ont = family();
        let ont2 = roundtrip(&ont);

        assert_eq!(ont.id.iri, ont2.id.iri);

        // statements survive modulo order
        let mut orig: Vec<String> = ont.axioms().iter().map(|ax| format!("{:?}", ax)).collect();
        let mut round: Vec<String> = ont2.axioms().iter().map(|ax| format!("{:?}", ax)).collect();
        orig.sort();
        round.sort();
        assert_eq!(orig, round);
    }

    #[test]
    fn roundtrip_preserves_prefixes() {
        let ont = family();
        let ont2 = roundtrip(&ont);

        let orig: Vec<(String, String)> = ont
            .prefixes()
            .map(|(n, i)| (n.to_string(), i.to_string()))
            .collect();
        let round: Vec<(String, String)> = ont2
            .prefixes()
            .map(|(n, i)| (n.to_string(), i.to_string()))
            .collect();
        assert_eq!(orig, round);
    }

    #[test]
    fn roundtrip_preserves_entities() {
        let ont = family();
        let ont2 = roundtrip(&ont);

        let count = |o: &Ontology| {
            (
                o.classes().count(),
                o.object_properties().count(),
                o.individuals().count(),
            )
        };
        assert_eq!(count(&ont), count(&ont2));
    }

    #[test]
    fn twice_round_is_stable() {
        let ont = family();
        let mut one = Vec::new();
        write(&mut one, &roundtrip(&ont)).unwrap();
        let mut two = Vec::new();
        write(&mut two, &roundtrip(&read(&one[..]).unwrap())).unwrap();
        assert_eq!(one, two);
    }
}
