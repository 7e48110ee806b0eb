//! Conjunctive queries: a basic graph pattern is translated into a
//! relational selection over the two saturated tables and evaluated
//! by nested-loop join with hash-assisted equality filters.
use std::cmp::Ordering;
use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::error::{invalid, AntleredError};
use crate::saturate::SaturatedABox;
use crate::vocab::{WithIRI, RDF};

/// An RDF term of a triple pattern.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Term {
    Variable(String),
    IRIRef(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

/// One triple pattern of a basic graph pattern.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A basic-graph-pattern query.
///
/// An empty projection projects every variable the pattern mentions,
/// in first-mention order. A limit of 0 means unlimited.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub prefixes: IndexMap<String, String>,
    pub projection: Vec<String>,
    pub distinct: bool,
    pub reduced: bool,
    pub triples: Vec<TriplePattern>,
    pub order_by: Vec<(String, Direction)>,
    pub limit: usize,
    pub offset: usize,
}

/// A result row: projected variable name to IRI, in projection order.
pub type Row = IndexMap<String, String>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Table {
    ClassAssertion,
    ObjectPropertyAssertion,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Column {
    Individual,
    ClassName,
    ObjectProperty,
    LeftIndividual,
    RightIndividual,
}

/// One table reference of the translated query: a base table, the
/// constant equality filters on it, and the equi-joins tying it to
/// earlier tables.
#[derive(Clone, Debug)]
struct TableRef {
    table: Table,
    filters: Vec<(Column, String)>,
    joins: Vec<(Column, usize, Column)>,
}

/// The relational form of a query.
#[derive(Clone, Debug)]
pub struct SelectExpression {
    tables: Vec<TableRef>,
    bindings: IndexMap<String, (usize, Column)>,
    projection: Vec<String>,
    distinct: bool,
    reduced: bool,
    order_by: Vec<(String, Direction)>,
    limit: usize,
    offset: usize,
}

/// Expand a prefixed name against the query's prefixes.
///
/// Absolute IRIs pass through; a name whose prefix is undeclared is
/// an `UnknownPrefix` error. Expansion is naive concatenation.
fn resolve(prefixes: &IndexMap<String, String>, term: &str) -> Result<String, AntleredError> {
    if term.contains("://") {
        return Ok(term.to_string());
    }
    match term.find(':') {
        Some(colon) => {
            let name = &term[..colon];
            let local = &term[colon + 1..];
            match prefixes.get(name) {
                Some(base) => Ok(format!("{}{}", base, local)),
                None => Err(AntleredError::UnknownPrefix(name.to_string())),
            }
        }
        None => Ok(term.to_string()),
    }
}

/// Translate a query to its relational form.
pub fn translate(query: &Query) -> Result<SelectExpression, AntleredError> {
    let rdf_type = RDF::Type.iri_s();
    let mut tables: Vec<TableRef> = Vec::new();
    let mut bindings: IndexMap<String, (usize, Column)> = IndexMap::new();

    for (i, pattern) in query.triples.iter().enumerate() {
        let mut filters = Vec::new();
        let mut joins = Vec::new();

        // the predicate picks the table and the column pair the
        // subject and object bind against
        let (table, subject_col, object_col) = match &pattern.predicate {
            Term::IRIRef(p) => {
                let p = resolve(&query.prefixes, p)?;
                if &p == rdf_type {
                    (Table::ClassAssertion, Column::Individual, Column::ClassName)
                } else {
                    filters.push((Column::ObjectProperty, p));
                    (
                        Table::ObjectPropertyAssertion,
                        Column::LeftIndividual,
                        Column::RightIndividual,
                    )
                }
            }
            Term::Variable(v) => {
                bind(&mut bindings, &mut joins, v, i, Column::ObjectProperty);
                (
                    Table::ObjectPropertyAssertion,
                    Column::LeftIndividual,
                    Column::RightIndividual,
                )
            }
            Term::Literal { .. } => return Err(AntleredError::LiteralsUnsupported),
        };

        for (term, col) in [(&pattern.subject, subject_col), (&pattern.object, object_col)] {
            match term {
                Term::IRIRef(s) => filters.push((col, resolve(&query.prefixes, s)?)),
                Term::Variable(v) => bind(&mut bindings, &mut joins, v, i, col),
                Term::Literal { .. } => return Err(AntleredError::LiteralsUnsupported),
            }
        }

        tables.push(TableRef {
            table,
            filters,
            joins,
        });
    }

    let projection = if query.projection.is_empty() {
        bindings.keys().cloned().collect()
    } else {
        for v in &query.projection {
            if !bindings.contains_key(v) {
                return Err(invalid!(
                    "projected variable ?{} is not bound by the pattern",
                    v
                ));
            }
        }
        query.projection.clone()
    };

    for (v, _) in &query.order_by {
        if !bindings.contains_key(v) {
            return Err(AntleredError::UnsupportedExpressionInOrderBy(v.clone()));
        }
    }

    Ok(SelectExpression {
        tables,
        bindings,
        projection,
        distinct: query.distinct,
        reduced: query.reduced,
        order_by: query.order_by.clone(),
        limit: query.limit,
        offset: query.offset,
    })
}

fn bind(
    bindings: &mut IndexMap<String, (usize, Column)>,
    joins: &mut Vec<(Column, usize, Column)>,
    var: &str,
    table: usize,
    col: Column,
) {
    match bindings.get(var) {
        // bound before: join back to the first binding site
        Some(&(t0, c0)) => joins.push((col, t0, c0)),
        None => {
            bindings.insert(var.to_string(), (table, col));
        }
    }
}

/// Translate and evaluate in one step.
pub fn evaluate(query: &Query, abox: &SaturatedABox) -> Result<Vec<Row>, AntleredError> {
    translate(query)?.eval(abox)
}

impl SelectExpression {
    /// Evaluate against the saturated tables.
    pub fn eval(&self, abox: &SaturatedABox) -> Result<Vec<Row>, AntleredError> {
        // a partial solution is the physical row chosen for each
        // table so far
        let mut solutions: Vec<Vec<usize>> = vec![vec![]];

        for (i, tref) in self.tables.iter().enumerate() {
            let candidates: Vec<usize> = (0..table_len(abox, tref.table))
                .filter(|&r| {
                    tref.filters
                        .iter()
                        .all(|(c, v)| value(abox, tref.table, r, *c) == &v[..])
                        && tref
                            .joins
                            .iter()
                            .filter(|(_, t0, _)| *t0 == i)
                            .all(|(c, _, c0)| {
                                value(abox, tref.table, r, *c) == value(abox, tref.table, r, *c0)
                            })
                })
                .collect();

            let inter: Vec<(Column, usize, Column)> = tref
                .joins
                .iter()
                .filter(|(_, t0, _)| *t0 != i)
                .copied()
                .collect();

            if inter.is_empty() {
                let mut next = Vec::with_capacity(solutions.len() * candidates.len());
                for sol in &solutions {
                    for &r in &candidates {
                        let mut sol = sol.clone();
                        sol.push(r);
                        next.push(sol);
                    }
                }
                solutions = next;
            } else {
                // hash the candidates on the joined columns, probe
                // once per partial solution
                let mut index: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
                for &r in &candidates {
                    let key: Vec<&str> = inter
                        .iter()
                        .map(|(c, _, _)| value(abox, tref.table, r, *c))
                        .collect();
                    index.entry(key).or_default().push(r);
                }
                let mut next = Vec::new();
                for sol in &solutions {
                    let probe: Vec<&str> = inter
                        .iter()
                        .map(|(_, t0, c0)| value(abox, self.tables[*t0].table, sol[*t0], *c0))
                        .collect();
                    if let Some(rows) = index.get(&probe) {
                        for &r in rows {
                            let mut sol = sol.clone();
                            sol.push(r);
                            next.push(sol);
                        }
                    }
                }
                solutions = next;
            }
        }

        // order over the full bindings, then project
        let mut full: Vec<Row> = solutions
            .iter()
            .map(|sol| {
                self.bindings
                    .iter()
                    .map(|(v, &(t, c))| {
                        (
                            v.clone(),
                            value(abox, self.tables[t].table, sol[t], c).to_string(),
                        )
                    })
                    .collect()
            })
            .collect();

        if !self.order_by.is_empty() {
            full.sort_by(|a, b| {
                for (v, dir) in &self.order_by {
                    let ord = a[v.as_str()].cmp(&b[v.as_str()]);
                    let ord = match dir {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let mut rows: Vec<Row> = full
            .into_iter()
            .map(|row| {
                self.projection
                    .iter()
                    .map(|v| (v.clone(), row[v.as_str()].clone()))
                    .collect()
            })
            .collect();

        if self.distinct {
            let mut seen = IndexSet::new();
            rows.retain(|row| seen.insert(row.values().cloned().collect::<Vec<String>>()));
        } else if self.reduced {
            rows.dedup();
        }

        let limit = if self.limit == 0 {
            usize::MAX
        } else {
            self.limit
        };
        Ok(rows.into_iter().skip(self.offset).take(limit).collect())
    }
}

fn table_len(abox: &SaturatedABox, table: Table) -> usize {
    match table {
        Table::ClassAssertion => abox.class_assertions.len(),
        Table::ObjectPropertyAssertion => abox.property_assertions.len(),
    }
}

fn value(abox: &SaturatedABox, table: Table, row: usize, col: Column) -> &str {
    match table {
        Table::ClassAssertion => {
            let r = &abox.class_assertions[row];
            match col {
                Column::Individual => &r.individual,
                Column::ClassName => &r.class_name,
                _ => unreachable!("column does not belong to the ClassAssertion table"),
            }
        }
        Table::ObjectPropertyAssertion => {
            let r = &abox.property_assertions[row];
            match col {
                Column::ObjectProperty => &r.object_property,
                Column::LeftIndividual => &r.left_individual,
                Column::RightIndividual => &r.right_individual,
                _ => unreachable!("column does not belong to the ObjectPropertyAssertion table"),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::Build;
    use crate::saturate::{ClassAssertionRow, ObjectPropertyAssertionRow};
    use crate::vocab::Namespace;

    const NS: &str = "http://www.example.com/";

    fn iri(frag: &str) -> String {
        format!("{}{}", NS, frag)
    }

    fn sample_abox() -> SaturatedABox {
        let b = Build::new();
        let class = |i: &str, c: &str| ClassAssertionRow {
            individual: b.iri(iri(i)),
            class_name: b.iri(iri(c)),
        };
        let prop = |p: &str, l: &str, r: &str| ObjectPropertyAssertionRow {
            object_property: b.iri(iri(p)),
            left_individual: b.iri(iri(l)),
            right_individual: b.iri(iri(r)),
        };
        SaturatedABox {
            class_assertions: vec![
                class("alice", "Student"),
                class("alice", "Person"),
                class("bob", "Person"),
                class("carol", "Person"),
            ],
            property_assertions: vec![
                prop("hasParent", "alice", "bob"),
                prop("hasParent", "bob", "carol"),
                prop("knows", "alice", "carol"),
            ],
        }
    }

    fn var(v: &str) -> Term {
        Term::Variable(v.to_string())
    }

    fn named(s: &str) -> Term {
        Term::IRIRef(s.to_string())
    }

    fn pattern(s: Term, p: Term, o: Term) -> TriplePattern {
        TriplePattern {
            subject: s,
            predicate: p,
            object: o,
        }
    }

    fn rdf_prefixes() -> IndexMap<String, String> {
        let mut prefixes = IndexMap::new();
        prefixes.insert("rdf".to_string(), Namespace::RDF.iri_s().clone());
        prefixes.insert("ex".to_string(), NS.to_string());
        prefixes
    }

    #[test]
    fn typed_pattern_hits_the_class_table() {
        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["x".to_string()],
            triples: vec![pattern(var("x"), named("rdf:type"), named("ex:Person"))],
            ..Default::default()
        };

        let rows = evaluate(&q, &sample_abox()).unwrap();
        let xs: Vec<&String> = rows.iter().map(|r| &r["x"]).collect();
        assert_eq!(xs, vec![&iri("alice"), &iri("bob"), &iri("carol")]);
    }

    #[test]
    fn property_pattern_joins_across_triples() {
        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["x".to_string(), "z".to_string()],
            triples: vec![
                pattern(var("x"), named("ex:hasParent"), var("y")),
                pattern(var("y"), named("ex:hasParent"), var("z")),
            ],
            ..Default::default()
        };

        let rows = evaluate(&q, &sample_abox()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["x"], iri("alice"));
        assert_eq!(rows[0]["z"], iri("carol"));
    }

    #[test]
    fn predicate_variable_binds_the_property_column() {
        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["p".to_string()],
            triples: vec![pattern(named("ex:alice"), var("p"), named("ex:carol"))],
            ..Default::default()
        };

        let rows = evaluate(&q, &sample_abox()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["p"], iri("knows"));
    }

    #[test]
    fn empty_projection_takes_every_variable_in_order() {
        let q = Query {
            prefixes: rdf_prefixes(),
            triples: vec![pattern(var("x"), named("ex:hasParent"), var("y"))],
            ..Default::default()
        };

        let rows = evaluate(&q, &sample_abox()).unwrap();
        assert_eq!(rows.len(), 2);
        let vars: Vec<&String> = rows[0].keys().collect();
        assert_eq!(vars, vec!["x", "y"]);
    }

    #[test]
    fn distinct_collapses_duplicate_rows() {
        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["y".to_string()],
            distinct: true,
            triples: vec![
                pattern(var("x"), named("rdf:type"), var("y")),
            ],
            ..Default::default()
        };

        let rows = evaluate(&q, &sample_abox()).unwrap();
        let ys: Vec<&String> = rows.iter().map(|r| &r["y"]).collect();
        assert_eq!(ys, vec![&iri("Student"), &iri("Person")]);
    }

    #[test]
    fn reduced_collapses_adjacent_rows_only() {
        let b = Build::new();
        let mut abox = sample_abox();
        abox.class_assertions.push(ClassAssertionRow {
            individual: b.iri(iri("dave")),
            class_name: b.iri(iri("Student")),
        });

        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["y".to_string()],
            reduced: true,
            triples: vec![pattern(var("x"), named("rdf:type"), var("y"))],
            ..Default::default()
        };

        let rows = evaluate(&q, &abox).unwrap();
        let ys: Vec<&String> = rows.iter().map(|r| &r["y"]).collect();
        // Student, Person, Person, Person, Student: adjacent
        // duplicates collapse, the trailing Student survives
        assert_eq!(ys, vec![&iri("Student"), &iri("Person"), &iri("Student")]);
    }

    #[test]
    fn order_limit_offset() {
        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["x".to_string()],
            order_by: vec![("x".to_string(), Direction::Desc)],
            limit: 2,
            offset: 1,
            triples: vec![pattern(var("x"), named("rdf:type"), named("ex:Person"))],
            ..Default::default()
        };

        let rows = evaluate(&q, &sample_abox()).unwrap();
        let xs: Vec<&String> = rows.iter().map(|r| &r["x"]).collect();
        // descending carol, bob, alice; skip one, take two
        assert_eq!(xs, vec![&iri("bob"), &iri("alice")]);
    }

    #[test]
    fn order_by_unbound_variable_is_an_error() {
        let q = Query {
            prefixes: rdf_prefixes(),
            order_by: vec![("nope".to_string(), Direction::Asc)],
            triples: vec![pattern(var("x"), named("ex:hasParent"), var("y"))],
            ..Default::default()
        };

        assert!(matches!(
            evaluate(&q, &sample_abox()),
            Err(AntleredError::UnsupportedExpressionInOrderBy(_))
        ));
    }

    #[test]
    fn literals_are_rejected() {
        let q = Query {
            prefixes: rdf_prefixes(),
            triples: vec![pattern(
                var("x"),
                named("ex:hasParent"),
                Term::Literal {
                    value: "bob".to_string(),
                    datatype: None,
                    language: None,
                },
            )],
            ..Default::default()
        };

        assert!(matches!(
            evaluate(&q, &sample_abox()),
            Err(AntleredError::LiteralsUnsupported)
        ));
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let q = Query {
            prefixes: rdf_prefixes(),
            triples: vec![pattern(var("x"), named("nope:hasParent"), var("y"))],
            ..Default::default()
        };

        assert!(matches!(
            evaluate(&q, &sample_abox()),
            Err(AntleredError::UnknownPrefix(p)) if p == "nope"
        ));
    }

    #[test]
    fn projecting_an_unbound_variable_is_an_error() {
        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["z".to_string()],
            triples: vec![pattern(var("x"), named("ex:hasParent"), var("y"))],
            ..Default::default()
        };

        assert!(matches!(
            evaluate(&q, &sample_abox()),
            Err(AntleredError::ValidityError(_))
        ));
    }

    #[test]
    fn same_variable_twice_in_one_pattern() {
        let b = Build::new();
        let mut abox = sample_abox();
        abox.property_assertions.push(ObjectPropertyAssertionRow {
            object_property: b.iri(iri("knows")),
            left_individual: b.iri(iri("dave")),
            right_individual: b.iri(iri("dave")),
        });

        let q = Query {
            prefixes: rdf_prefixes(),
            projection: vec!["x".to_string()],
            triples: vec![pattern(var("x"), named("ex:knows"), var("x"))],
            ..Default::default()
        };

        let rows = evaluate(&q, &abox).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["x"], iri("dave"));
    }
}
