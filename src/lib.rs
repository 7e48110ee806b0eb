//! antlered-elk is a description-logic reasoner for the OWL 2 EL
//! profile.
//!
//! Given an ontology of classes, object properties and individuals,
//! the [`Reasoner`](reason::Reasoner) computes the class and
//! object-property subsumption relations (role chains included),
//! saturates the ABox into two flat assertion tables, and answers
//! conjunctive queries phrased as basic graph patterns over them.
//!
//! # Example
//!
//! ```
//! use antlered_elk::model::{Ontology, SubClassOf};
//! use antlered_elk::reason::Reasoner;
//!
//! let mut o = Ontology::new();
//! let a = o.class("http://www.example.com/a");
//! let b = o.class("http://www.example.com/b");
//! let c = o.class("http://www.example.com/c");
//! o.insert(SubClassOf { sub: a.into(), sup: b.clone().into() });
//! o.insert(SubClassOf { sub: b.into(), sup: c.into() });
//!
//! let reasoner = Reasoner::new(o).unwrap();
//! assert!(reasoner
//!     .is_subclass("http://www.example.com/a", "http://www.example.com/c")
//!     .unwrap());
//! ```
//!
//! The pipeline is single-threaded and runs to completion inside
//! [`Reasoner::new`](reason::Reasoner::new); everything afterwards is
//! read-only. Ontologies are usually produced by the OWL/XML reader
//! in [`io`], but can equally be assembled through the [`model`] API
//! as above.
pub mod error;
pub mod hierarchy;
pub mod io;
pub mod model;
pub mod normalize;
pub mod query;
pub mod reason;
pub mod saturate;
pub mod store;
pub mod vocab;

pub use crate::error::AntleredError;
pub use crate::model::{Build, Ontology};
pub use crate::query::{Query, Row};
pub use crate::reason::Reasoner;
