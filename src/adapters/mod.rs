// Adapters layer: concrete signal sources.

pub mod memory;
pub mod tango_rest;

pub use memory::InMemorySource;
pub use tango_rest::TangoRestSource;
