//! Reading and writing ontologies in the OWL/XML subset this model
//! expresses.
pub mod reader;
pub mod writer;
