//! An event-driven reader for the OWL/XML subset of this model.
use std::io::BufRead;

use curie::PrefixMapping;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::error::AntleredError;
use crate::model::{
    Build, ClassAssertion, ClassExpression, EquivalentClasses, EquivalentObjectProperties,
    NamedEntity, NamedIndividual, ObjectProperty, ObjectPropertyAssertion, Ontology, SubClassOf,
    SubObjectPropertyExpression, SubObjectPropertyOf,
};

#[derive(Debug, Error)]
enum ReadError {
    #[error("End Tag Arrived Unexpectedly: {tag} at {pos}")]
    UnexpectedEndTag { tag: String, pos: usize },

    #[error("Missing End Tag: expected {tag} after {pos}")]
    MissingEndTag { tag: String, pos: usize },

    #[error("Missing attribute: Expected {attribute} at {pos}")]
    MissingAttribute { attribute: String, pos: usize },

    #[error("Unexpected Tag: found {tag} at {pos}")]
    UnexpectedTag { tag: String, pos: usize },

    #[error("Unexpected End of File at {pos}")]
    UnexpectedEof { pos: usize },
}

impl From<ReadError> for AntleredError {
    fn from(e: ReadError) -> AntleredError {
        AntleredError::ParserError(e.into())
    }
}

struct Read<'a, R: BufRead> {
    build: &'a Build,
    mapping: PrefixMapping,
    reader: Reader<R>,
    buf: Vec<u8>,
}

/// An element event with ownership of its bytes; text, comments and
/// declarations are skipped before one is produced.
enum Node {
    Start(BytesStart<'static>),
    Empty(BytesStart<'static>),
    End(Vec<u8>),
}

/// Read an ontology from OWL/XML.
pub fn read<R: BufRead>(bufread: R) -> Result<Ontology, AntleredError> {
    let build = Build::new();
    read_with_build(bufread, &build)
}

/// Read an ontology, interning IRIs through an existing `Build`.
pub fn read_with_build<R: BufRead>(bufread: R, build: &Build) -> Result<Ontology, AntleredError> {
    let mut r = Read {
        build,
        mapping: PrefixMapping::default(),
        reader: Reader::from_reader(bufread),
        buf: Vec::new(),
    };
    let mut ont = Ontology::new_with_build(build.clone());

    // prologue up to the Ontology element
    let body;
    loop {
        match next_node(&mut r)? {
            Node::Start(e) if is_tag(&e, b"Ontology") => {
                read_ontology_attributes(&mut r, &e, &mut ont)?;
                body = true;
                break;
            }
            Node::Empty(e) if is_tag(&e, b"Ontology") => {
                read_ontology_attributes(&mut r, &e, &mut ont)?;
                body = false;
                break;
            }
            Node::Start(e) | Node::Empty(e) => return Err(unexpected_start(&mut r, &e)),
            Node::End(name) => return Err(unexpected_end(&mut r, &name)),
        }
    }
    if !body {
        return Ok(ont);
    }

    loop {
        match next_node(&mut r)? {
            Node::Empty(e) if is_tag(&e, b"Prefix") => {
                let name = required_attrib(&mut r, &e, b"name")?;
                let iri = required_attrib(&mut r, &e, b"IRI")?;
                ont.add_prefix(&name, &iri)?;
                if name.is_empty() {
                    r.mapping.set_default(&iri);
                } else {
                    r.mapping.add_prefix(&name, &iri).ok();
                }
            }
            Node::Start(e) => {
                let name = e.name().as_ref().to_vec();
                match &name[..] {
                    b"Declaration" => {
                        let ne = read_entity(&mut r)?;
                        expect_end(&mut r, b"Declaration")?;
                        ont.declare(ne);
                    }
                    b"SubClassOf" => {
                        let sub = read_class_expression(&mut r)?;
                        let sup = read_class_expression(&mut r)?;
                        expect_end(&mut r, b"SubClassOf")?;
                        ont.insert(SubClassOf { sub, sup });
                    }
                    b"EquivalentClasses" => {
                        let mut operands = vec![];
                        loop {
                            match next_node(&mut r)? {
                                Node::End(name) if name == b"EquivalentClasses" => break,
                                node => {
                                    operands.push(class_expression_from_node(&mut r, node)?)
                                }
                            }
                        }
                        ont.insert(EquivalentClasses(operands));
                    }
                    b"SubObjectPropertyOf" => {
                        let sub = read_sub_object_property(&mut r)?;
                        let sup = read_object_property(&mut r)?;
                        expect_end(&mut r, b"SubObjectPropertyOf")?;
                        ont.insert(SubObjectPropertyOf { sub, sup });
                    }
                    b"EquivalentObjectProperties" => {
                        let mut operands = vec![];
                        loop {
                            match next_node(&mut r)? {
                                Node::End(name) if name == b"EquivalentObjectProperties" => {
                                    break
                                }
                                Node::Empty(e) if is_tag(&e, b"ObjectProperty") => {
                                    let iri = entity_iri(&mut r, &e)?;
                                    operands.push(r.build.object_property(iri));
                                }
                                node => return Err(unexpected_node(&mut r, node)),
                            }
                        }
                        ont.insert(EquivalentObjectProperties(operands));
                    }
                    b"ClassAssertion" => {
                        let ce = read_class_expression(&mut r)?;
                        let i = read_individual(&mut r)?;
                        expect_end(&mut r, b"ClassAssertion")?;
                        ont.insert(ClassAssertion { ce, i });
                    }
                    b"ObjectPropertyAssertion" => {
                        let ope = read_object_property(&mut r)?;
                        let from = read_individual(&mut r)?;
                        let to = read_individual(&mut r)?;
                        expect_end(&mut r, b"ObjectPropertyAssertion")?;
                        ont.insert(ObjectPropertyAssertion { ope, from, to });
                    }
                    _ => return Err(unexpected_start(&mut r, &e)),
                }
            }
            Node::Empty(e) => return Err(unexpected_start(&mut r, &e)),
            Node::End(name) if name == b"Ontology" => break,
            Node::End(name) => return Err(unexpected_end(&mut r, &name)),
        }
    }

    Ok(ont)
}

fn read_ontology_attributes<R: BufRead>(
    r: &mut Read<R>,
    e: &BytesStart,
    ont: &mut Ontology,
) -> Result<(), AntleredError> {
    if let Some(iri) = attrib_value(e, b"ontologyIRI")? {
        r.mapping.set_default(&iri);
        ont.id.iri = Some(r.build.iri(iri));
    }
    Ok(())
}

/// Read an event, skipping everything that is not an element
/// boundary. The end of file is an error here; the caller breaks out
/// at the Ontology end tag before the document can run out.
fn next_node<R: BufRead>(r: &mut Read<R>) -> Result<Node, AntleredError> {
    loop {
        r.buf.clear();
        let event = r.reader.read_event_into(&mut r.buf)?;
        match event {
            Event::Start(e) => return Ok(Node::Start(e.into_owned())),
            Event::Empty(e) => return Ok(Node::Empty(e.into_owned())),
            Event::End(e) => return Ok(Node::End(e.name().as_ref().to_vec())),
            Event::Eof => {
                return Err(ReadError::UnexpectedEof {
                    pos: r.reader.buffer_position(),
                }
                .into())
            }
            _ => {}
        }
    }
}

fn is_tag(e: &BytesStart, tag: &[u8]) -> bool {
    e.name().as_ref() == tag
}

fn attrib_value(event: &BytesStart, tag: &[u8]) -> Result<Option<String>, AntleredError> {
    for res in event.attributes() {
        let attrib = res?;
        if attrib.key.as_ref() == tag {
            return Ok(Some(String::from_utf8_lossy(&attrib.value).into_owned()));
        }
    }
    Ok(None)
}

fn required_attrib<R: BufRead>(
    r: &mut Read<R>,
    event: &BytesStart,
    tag: &[u8],
) -> Result<String, AntleredError> {
    attrib_value(event, tag)?.ok_or_else(|| {
        ReadError::MissingAttribute {
            attribute: String::from_utf8_lossy(tag).into_owned(),
            pos: r.reader.buffer_position(),
        }
        .into()
    })
}

/// Expand a CURIE if a prefix matches; anything else is taken as a
/// complete IRI.
fn expand_curie_maybe<R: BufRead>(r: &Read<R>, val: String) -> String {
    match r.mapping.expand_curie_string(&val) {
        Ok(n) => n,
        Err(_) => val,
    }
}

/// The IRI of an entity element, from either its `IRI` or its
/// `abbreviatedIRI` attribute.
fn entity_iri<R: BufRead>(r: &mut Read<R>, event: &BytesStart) -> Result<String, AntleredError> {
    if let Some(s) = attrib_value(event, b"IRI")? {
        return Ok(expand_curie_maybe(r, s));
    }
    if let Some(s) = attrib_value(event, b"abbreviatedIRI")? {
        return Ok(expand_curie_maybe(r, s));
    }
    Err(ReadError::MissingAttribute {
        attribute: "IRI".to_string(),
        pos: r.reader.buffer_position(),
    }
    .into())
}

fn read_entity<R: BufRead>(r: &mut Read<R>) -> Result<NamedEntity, AntleredError> {
    match next_node(r)? {
        Node::Empty(e) => {
            let iri = entity_iri(r, &e)?;
            match e.name().as_ref() {
                b"Class" => Ok(r.build.class(iri).into()),
                b"ObjectProperty" => Ok(r.build.object_property(iri).into()),
                b"NamedIndividual" => Ok(r.build.named_individual(iri).into()),
                _ => Err(unexpected_start(r, &e)),
            }
        }
        node => Err(unexpected_node(r, node)),
    }
}

fn read_object_property<R: BufRead>(r: &mut Read<R>) -> Result<ObjectProperty, AntleredError> {
    match next_node(r)? {
        Node::Empty(e) if is_tag(&e, b"ObjectProperty") => {
            let iri = entity_iri(r, &e)?;
            Ok(r.build.object_property(iri))
        }
        node => Err(unexpected_node(r, node)),
    }
}

fn read_individual<R: BufRead>(r: &mut Read<R>) -> Result<NamedIndividual, AntleredError> {
    match next_node(r)? {
        Node::Empty(e) if is_tag(&e, b"NamedIndividual") => {
            let iri = entity_iri(r, &e)?;
            Ok(r.build.named_individual(iri))
        }
        node => Err(unexpected_node(r, node)),
    }
}

fn read_class_expression<R: BufRead>(r: &mut Read<R>) -> Result<ClassExpression, AntleredError> {
    let node = next_node(r)?;
    class_expression_from_node(r, node)
}

fn class_expression_from_node<R: BufRead>(
    r: &mut Read<R>,
    node: Node,
) -> Result<ClassExpression, AntleredError> {
    match node {
        Node::Empty(e) if is_tag(&e, b"Class") => {
            let iri = entity_iri(r, &e)?;
            Ok(ClassExpression::Class(r.build.class(iri)))
        }
        Node::Start(e) if is_tag(&e, b"ObjectIntersectionOf") => {
            let mut operands = vec![];
            loop {
                match next_node(r)? {
                    Node::End(name) if name == b"ObjectIntersectionOf" => break,
                    node => operands.push(class_expression_from_node(r, node)?),
                }
            }
            Ok(ClassExpression::ObjectIntersectionOf(operands))
        }
        Node::Start(e) if is_tag(&e, b"ObjectSomeValuesFrom") => {
            let ope = read_object_property(r)?;
            let bce = read_class_expression(r)?;
            expect_end(r, b"ObjectSomeValuesFrom")?;
            Ok(ClassExpression::ObjectSomeValuesFrom {
                ope,
                bce: Box::new(bce),
            })
        }
        node => Err(unexpected_node(r, node)),
    }
}

fn read_sub_object_property<R: BufRead>(
    r: &mut Read<R>,
) -> Result<SubObjectPropertyExpression, AntleredError> {
    match next_node(r)? {
        Node::Empty(e) if is_tag(&e, b"ObjectProperty") => {
            let iri = entity_iri(r, &e)?;
            Ok(r.build.object_property(iri).into())
        }
        Node::Start(e) if is_tag(&e, b"ObjectPropertyChain") => {
            let mut ops = vec![];
            loop {
                match next_node(r)? {
                    Node::End(name) if name == b"ObjectPropertyChain" => break,
                    Node::Empty(e) if is_tag(&e, b"ObjectProperty") => {
                        let iri = entity_iri(r, &e)?;
                        ops.push(r.build.object_property(iri));
                    }
                    node => return Err(unexpected_node(r, node)),
                }
            }
            Ok(SubObjectPropertyExpression::ObjectPropertyChain(ops))
        }
        node => Err(unexpected_node(r, node)),
    }
}

fn expect_end<R: BufRead>(r: &mut Read<R>, tag: &[u8]) -> Result<(), AntleredError> {
    match next_node(r)? {
        Node::End(name) if name == tag => Ok(()),
        _ => Err(ReadError::MissingEndTag {
            tag: String::from_utf8_lossy(tag).into_owned(),
            pos: r.reader.buffer_position(),
        }
        .into()),
    }
}

fn unexpected_start<R: BufRead>(r: &mut Read<R>, e: &BytesStart) -> AntleredError {
    ReadError::UnexpectedTag {
        tag: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        pos: r.reader.buffer_position(),
    }
    .into()
}

fn unexpected_end<R: BufRead>(r: &mut Read<R>, name: &[u8]) -> AntleredError {
    ReadError::UnexpectedEndTag {
        tag: String::from_utf8_lossy(name).into_owned(),
        pos: r.reader.buffer_position(),
    }
    .into()
}

fn unexpected_node<R: BufRead>(r: &mut Read<R>, node: Node) -> AntleredError {
    match node {
        Node::Start(e) | Node::Empty(e) => unexpected_start(r, &e),
        Node::End(name) => unexpected_end(r, &name),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::AxiomKind;

    const FAMILY: &str = r#"<?xml version="1.0"?>
<Ontology xmlns="http://www.w3.org/2002/07/owl#"
          ontologyIRI="http://example.com/family">
    <Prefix name="f" IRI="http://example.com/family#"/>
    <Declaration>
        <Class abbreviatedIRI="f:Person"/>
    </Declaration>
    <Declaration>
        <Class abbreviatedIRI="f:Child"/>
    </Declaration>
    <SubClassOf>
        <Class abbreviatedIRI="f:Child"/>
        <Class abbreviatedIRI="f:Person"/>
    </SubClassOf>
    <SubClassOf>
        <Class abbreviatedIRI="f:Person"/>
        <ObjectSomeValuesFrom>
            <ObjectProperty abbreviatedIRI="f:hasParent"/>
            <Class abbreviatedIRI="f:Person"/>
        </ObjectSomeValuesFrom>
    </SubClassOf>
    <SubObjectPropertyOf>
        <ObjectPropertyChain>
            <ObjectProperty abbreviatedIRI="f:hasParent"/>
            <ObjectProperty abbreviatedIRI="f:hasParent"/>
        </ObjectPropertyChain>
        <ObjectProperty abbreviatedIRI="f:hasGrandparent"/>
    </SubObjectPropertyOf>
    <ClassAssertion>
        <Class abbreviatedIRI="f:Child"/>
        <NamedIndividual abbreviatedIRI="f:alice"/>
    </ClassAssertion>
    <ObjectPropertyAssertion>
        <ObjectProperty abbreviatedIRI="f:hasParent"/>
        <NamedIndividual abbreviatedIRI="f:alice"/>
        <NamedIndividual abbreviatedIRI="f:bob"/>
    </ObjectPropertyAssertion>
</Ontology>"#;

    #[test]
    fn read_family() {
        let ont = read(FAMILY.as_bytes()).unwrap();

        assert_eq!(
            ont.id.iri.as_ref().map(|i| &i[..]),
            Some("http://example.com/family")
        );
        assert_eq!(ont.tbox_size(), 2);
        assert_eq!(ont.rbox_size(), 1);
        assert_eq!(ont.abox_size(), 2);

        // CURIEs expanded against the declared prefix
        let b = ont.build().clone();
        assert!(ont.is_class(&b.class("http://example.com/family#Person")));
        assert!(ont.is_object_property(&b.object_property("http://example.com/family#hasParent")));
        assert!(ont.is_individual(&b.named_individual("http://example.com/family#alice")));

        // the chain survived as a chain
        let chain = ont
            .axioms()
            .iter()
            .find(|ax| ax.kind() == AxiomKind::SubObjectPropertyOf)
            .unwrap();
        if let crate::model::Axiom::SubObjectPropertyOf(sop) = chain {
            assert!(matches!(
                sop.sub,
                SubObjectPropertyExpression::ObjectPropertyChain(ref ops) if ops.len() == 2
            ));
        }
    }

    #[test]
    fn empty_ontology() {
        let doc = r#"<?xml version="1.0"?>
<Ontology xmlns="http://www.w3.org/2002/07/owl#" ontologyIRI="http://example.com/o"/>"#;
        let ont = read(doc.as_bytes()).unwrap();
        assert!(ont.axioms().is_empty());
        assert_eq!(
            ont.id.iri.as_ref().map(|i| &i[..]),
            Some("http://example.com/o")
        );
    }

    #[test]
    fn conflicting_prefixes_error() {
        let doc = r#"<?xml version="1.0"?>
<Ontology xmlns="http://www.w3.org/2002/07/owl#">
    <Prefix name="f" IRI="http://example.com/one#"/>
    <Prefix name="f" IRI="http://example.com/two#"/>
</Ontology>"#;
        assert!(matches!(
            read(doc.as_bytes()),
            Err(AntleredError::PrefixConflict { .. })
        ));
    }

    #[test]
    fn unexpected_tag_error() {
        let doc = r#"<?xml version="1.0"?>
<Ontology xmlns="http://www.w3.org/2002/07/owl#">
    <DataPropertyAssertion>
    </DataPropertyAssertion>
</Ontology>"#;
        assert!(read(doc.as_bytes()).is_err());
    }

    #[test]
    fn truncated_document_error() {
        let doc = r#"<?xml version="1.0"?>
<Ontology xmlns="http://www.w3.org/2002/07/owl#">
    <SubClassOf>
        <Class IRI="http://example.com/a"/>"#;
        assert!(read(doc.as_bytes()).is_err());
    }
}
