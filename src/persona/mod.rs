//! Persona authoring.
//!
//! Personas are stored by the simulation engine; this module only prepares
//! the create request from operator input.

mod form;

pub use form::PersonaForm;
